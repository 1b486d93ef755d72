//! Byte-buffer marshalling between host text and native string/bytes values.
//!
//! Text crosses the boundary as UTF-8, passed as two arguments: a base
//! address and a length in encoded bytes. Reading goes the other way through
//! two accessor calls (length, then base) against the same shared borrow, and
//! copies exactly that many bytes out before anything else touches the value.

use std::ffi::c_void;

use crate::error::BindResult;
use crate::handle::{BorrowToken, OwnershipHandle};

/// Returns the base address of a value's bytes.
pub type BufferPtrFn = unsafe extern "C" fn(*const c_void) -> *const u8;
/// Returns the length of a value's bytes.
pub type BufferLenFn = unsafe extern "C" fn(*const c_void) -> usize;
/// Appends `(base, len)` to a value through a mutable borrow.
pub type AppendFn = unsafe extern "C" fn(*mut c_void, *const u8, usize);

/// Splits bytes into the `(base, len)` argument pair.
pub fn raw_parts(bytes: &[u8]) -> (*const u8, usize) {
    (bytes.as_ptr(), bytes.len())
}

/// Encodes host text for the boundary. Rust text is already UTF-8.
pub fn encode(text: &str) -> (*const u8, usize) {
    raw_parts(text.as_bytes())
}

/// Decodes bytes copied out of a native value.
pub fn decode(bytes: Vec<u8>) -> BindResult<String> {
    Ok(String::from_utf8(bytes)?)
}

/// The pair of accessors used to read a buffer out of a native value.
#[derive(Debug, Clone, Copy)]
pub struct BufferAccessor {
    pub ptr: BufferPtrFn,
    pub len: BufferLenFn,
}

impl BufferAccessor {
    /// Copies the value's bytes out.
    ///
    /// Both calls run against `receiver`, so the value cannot be moved or
    /// mutated between reading the length and reading the base. An empty
    /// value never has its base read.
    pub fn read(&self, receiver: BorrowToken<'_>) -> Vec<u8> {
        // SAFETY: `receiver` borrows a live value of the kind these accessors belong to.
        let len = unsafe { (self.len)(receiver.as_ptr()) };
        if len == 0 {
            return Vec::new();
        }
        let base = unsafe { (self.ptr)(receiver.as_ptr()) };
        // SAFETY: the native side reports `len` initialised bytes at `base`,
        // valid until the next mutation; they are copied before returning.
        unsafe { std::slice::from_raw_parts(base, len) }.to_vec()
    }

    /// Copies the value's bytes out and decodes them as UTF-8.
    pub fn read_text(&self, receiver: BorrowToken<'_>) -> BindResult<String> {
        decode(self.read(receiver))
    }

    /// The value's length in bytes.
    pub fn len(&self, receiver: BorrowToken<'_>) -> usize {
        // SAFETY: as in `read`.
        unsafe { (self.len)(receiver.as_ptr()) }
    }
}

/// Appends `bytes` to the value owned by `handle`.
///
/// The call runs inside `borrow_mut`: the native side may reallocate the
/// value's contents, and the handle is not read again until it returns.
pub fn append(handle: &OwnershipHandle, append: AppendFn, bytes: &[u8]) -> BindResult<()> {
    let (base, len) = raw_parts(bytes);
    handle.borrow_mut(|target| {
        // SAFETY: `target` is an exclusive borrow of a live value; `base`
        // points to `len` bytes that outlive the call.
        unsafe { append(target.as_ptr(), base, len) }
    })
}
