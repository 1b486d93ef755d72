use std::ffi::c_void;
use std::fmt;
use std::rc::Rc;

use super::{DropFn, FromBufferFn, NativeValue, NewFn, ValueKind};
use crate::abi::Address;
use crate::dispatch::{self, method_symbol};
use crate::error::BindResult;
use crate::handle::OwnershipHandle;
use crate::marshal::{self, AppendFn, BufferAccessor, BufferLenFn, BufferPtrFn};
use crate::symbols::{Manifest, SymbolTable};

pub const TYPE_NAME: &str = "RustBytes";

/// The resolved `RustBytes` operations.
pub struct BytesApi {
    new: NewFn,
    from: FromBufferFn,
    buffer: BufferAccessor,
    extend: AppendFn,
    drop: DropFn,
    table: Rc<dyn SymbolTable>,
}

impl BytesApi {
    pub fn resolve(table: Rc<dyn SymbolTable>) -> BindResult<Self> {
        let symbol = |method| method_symbol(TYPE_NAME, method);
        Ok(Self {
            new: table.function(&symbol("new"))?,
            from: table.function(&symbol("from"))?,
            buffer: BufferAccessor {
                ptr: table.function(&symbol("as_ptr"))?,
                len: table.function(&symbol("len"))?,
            },
            extend: table.function(&symbol("extend"))?,
            drop: table.function(&symbol("drop"))?,
            table,
        })
    }
}

impl fmt::Debug for BytesApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BytesApi").field("library", &self.table.library_name()).finish_non_exhaustive()
    }
}

/// An owned native `Vec<u8>`.
pub struct RustBytes {
    handle: OwnershipHandle,
    api: Rc<BytesApi>,
}

impl RustBytes {
    pub fn new(api: &Rc<BytesApi>) -> BindResult<Self> {
        // SAFETY: zero-argument constructor.
        let raw = unsafe { (api.new)() };
        let address = dispatch::owned(&method_symbol(TYPE_NAME, "new"), raw)?;
        // SAFETY: a fresh vector from this library's constructor.
        Ok(unsafe { Self::adopt(api.clone(), address) })
    }

    /// A new byte vector holding a copy of `bytes`.
    pub fn from_slice(api: &Rc<BytesApi>, bytes: &[u8]) -> BindResult<Self> {
        let (base, len) = marshal::raw_parts(bytes);
        // SAFETY: `base` points to `len` bytes that outlive the call.
        let raw = unsafe { (api.from)(base, len) };
        let address = dispatch::owned(&method_symbol(TYPE_NAME, "from"), raw)?;
        // SAFETY: as in `new`.
        Ok(unsafe { Self::adopt(api.clone(), address) })
    }

    /// # Safety
    /// `address` must be an owned `RustBytes` allocated by the library `api`
    /// was resolved from, owned by nothing else.
    pub unsafe fn adopt(api: Rc<BytesApi>, address: Address) -> Self {
        log::trace!("{} adopted at {:?}", TYPE_NAME, address);
        Self { handle: OwnershipHandle::occupied(address), api }
    }

    /// # Safety
    /// As for [`RustBytes::adopt`].
    pub unsafe fn adopt_raw(api: Rc<BytesApi>, symbol: &str, raw: *mut c_void) -> BindResult<Self> {
        let address = dispatch::owned(symbol, raw)?;
        Ok(Self::adopt(api, address))
    }

    /// Copies the contents out.
    pub fn to_vec(&self) -> BindResult<Vec<u8>> {
        Ok(self.api.buffer.read(self.handle.borrow()?))
    }

    pub fn len(&self) -> BindResult<usize> {
        Ok(self.api.buffer.len(self.handle.borrow()?))
    }

    pub fn is_empty(&self) -> BindResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn extend(&self, bytes: &[u8]) -> BindResult<()> {
        marshal::append(&self.handle, self.api.extend, bytes)
    }

    pub fn destroy(&self) -> bool {
        let drop_fn = self.api.drop;
        self.handle.release(|address| {
            log::trace!("{} dropped at {:?}", TYPE_NAME, address);
            // SAFETY: the handle owned `address` and is inert from here on.
            unsafe { drop_fn(address.as_ptr()) }
        })
    }
}

impl NativeValue for RustBytes {
    const KIND: ValueKind = ValueKind::Bytes;

    fn handle(&self) -> &OwnershipHandle {
        &self.handle
    }
}

impl Drop for RustBytes {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for RustBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RustBytes").field("handle", &self.handle).finish()
    }
}

pub fn manifest() -> Manifest {
    let symbol = |method| method_symbol(TYPE_NAME, method);
    Manifest::new()
        .declare::<NewFn>(symbol("new"))
        .declare::<FromBufferFn>(symbol("from"))
        .declare::<BufferPtrFn>(symbol("as_ptr"))
        .declare::<BufferLenFn>(symbol("len"))
        .declare::<AppendFn>(symbol("extend"))
        .declare::<DropFn>(symbol("drop"))
}
