use std::fmt;
use std::rc::Rc;

use super::{DropFn, FromBufferFn, NativeValue, NewFn, ValueKind};
use crate::abi::Address;
use crate::dispatch::{self, method_symbol};
use crate::error::BindResult;
use crate::handle::OwnershipHandle;
use crate::marshal::{self, AppendFn, BufferAccessor, BufferLenFn, BufferPtrFn};
use crate::symbols::{Manifest, SymbolTable};

pub const TYPE_NAME: &str = "RustString";

/// The resolved `RustString` operations.
///
/// Holds the table it was resolved from, so the library outlives every
/// string created through it.
pub struct StringApi {
    new: NewFn,
    from: FromBufferFn,
    buffer: BufferAccessor,
    push: AppendFn,
    drop: DropFn,
    table: Rc<dyn SymbolTable>,
}

impl StringApi {
    pub fn resolve(table: Rc<dyn SymbolTable>) -> BindResult<Self> {
        let symbol = |method| method_symbol(TYPE_NAME, method);
        Ok(Self {
            new: table.function(&symbol("new"))?,
            from: table.function(&symbol("from"))?,
            buffer: BufferAccessor {
                ptr: table.function(&symbol("into_ptr"))?,
                len: table.function(&symbol("into_len"))?,
            },
            push: table.function(&symbol("push"))?,
            drop: table.function(&symbol("drop"))?,
            table,
        })
    }

    pub fn library_name(&self) -> &str {
        self.table.library_name()
    }
}

impl fmt::Debug for StringApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringApi").field("library", &self.library_name()).finish_non_exhaustive()
    }
}

/// An owned native `String`.
pub struct RustString {
    handle: OwnershipHandle,
    api: Rc<StringApi>,
}

impl RustString {
    /// A new empty string.
    pub fn new(api: &Rc<StringApi>) -> BindResult<Self> {
        // SAFETY: zero-argument constructor.
        let raw = unsafe { (api.new)() };
        let address = dispatch::owned(&method_symbol(TYPE_NAME, "new"), raw)?;
        // SAFETY: a fresh string from this library's constructor.
        Ok(unsafe { Self::adopt(api.clone(), address) })
    }

    /// A new string holding a copy of `text`.
    pub fn from_text(api: &Rc<StringApi>, text: &str) -> BindResult<Self> {
        let (base, len) = marshal::encode(text);
        // SAFETY: `base` points to `len` bytes that outlive the call; the
        // native side copies them.
        let raw = unsafe { (api.from)(base, len) };
        let address = dispatch::owned(&method_symbol(TYPE_NAME, "from"), raw)?;
        // SAFETY: as in `new`.
        Ok(unsafe { Self::adopt(api.clone(), address) })
    }

    /// Takes ownership of a string the native side handed out.
    ///
    /// Values moved out with [`NativeValue::take`] come back this way.
    ///
    /// # Safety
    /// `address` must be an owned `RustString` allocated by the library `api`
    /// was resolved from, and nothing else may own it: the wrapper passes it
    /// to `__RustString__drop` when dropped.
    pub unsafe fn adopt(api: Rc<StringApi>, address: Address) -> Self {
        log::trace!("{} adopted at {:?}", TYPE_NAME, address);
        Self { handle: OwnershipHandle::occupied(address), api }
    }

    /// Takes ownership of the result of an owning call to `symbol`.
    ///
    /// # Safety
    /// As for [`RustString::adopt`]; a null `raw` is reported as `NullAddress`.
    pub unsafe fn adopt_raw(api: Rc<StringApi>, symbol: &str, raw: *mut std::ffi::c_void) -> BindResult<Self> {
        let address = dispatch::owned(symbol, raw)?;
        Ok(Self::adopt(api, address))
    }

    /// Copies the contents out as host text.
    pub fn read(&self) -> BindResult<String> {
        self.api.buffer.read_text(self.handle.borrow()?)
    }

    /// Length in UTF-8 bytes.
    pub fn len(&self) -> BindResult<usize> {
        Ok(self.api.buffer.len(self.handle.borrow()?))
    }

    pub fn is_empty(&self) -> BindResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Appends `text` in place.
    pub fn push_str(&self, text: &str) -> BindResult<()> {
        marshal::append(&self.handle, self.api.push, text.as_bytes())
    }

    pub fn api(&self) -> &Rc<StringApi> {
        &self.api
    }

    /// Destroys the string now. Returns false if it was already moved or destroyed.
    pub fn destroy(&self) -> bool {
        let drop_fn = self.api.drop;
        self.handle.release(|address| {
            log::trace!("{} dropped at {:?}", TYPE_NAME, address);
            // SAFETY: the handle owned `address` and is inert from here on.
            unsafe { drop_fn(address.as_ptr()) }
        })
    }
}

impl NativeValue for RustString {
    const KIND: ValueKind = ValueKind::String;

    fn handle(&self) -> &OwnershipHandle {
        &self.handle
    }
}

impl Drop for RustString {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for RustString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RustString").field("handle", &self.handle).finish()
    }
}

/// Entries for the `RustString` operations.
pub fn manifest() -> Manifest {
    let symbol = |method| method_symbol(TYPE_NAME, method);
    Manifest::new()
        .declare::<NewFn>(symbol("new"))
        .declare::<FromBufferFn>(symbol("from"))
        .declare::<BufferPtrFn>(symbol("into_ptr"))
        .declare::<BufferLenFn>(symbol("into_len"))
        .declare::<AppendFn>(symbol("push"))
        .declare::<DropFn>(symbol("drop"))
}
