//! Wrappers for native values the core has no accessors for: boxes, slices,
//! vectors and tuples of some element type `T`.
//!
//! `T` is only a tag; the core never reads the value. Such values can be
//! moved, borrowed and passed to calls, and are released through a
//! destructor symbol when one is bound. Without one, dropping a live wrapper
//! leaks the value and says so.

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::{DropFn, NativeValue, ValueKind};
use crate::abi::Address;
use crate::dispatch;
use crate::error::BindResult;
use crate::handle::OwnershipHandle;
use crate::symbols::SymbolTable;

/// Kind tag for an [`Opaque`] wrapper.
pub trait OpaqueKind {
    const KIND: ValueKind;
    const TYPE_NAME: &'static str;
}

macro_rules! opaque_kinds {
    ($($tag:ident => $kind:ident, $name:literal;)*) => {
        $(
            #[derive(Debug)]
            pub enum $tag {}

            impl OpaqueKind for $tag {
                const KIND: ValueKind = ValueKind::$kind;
                const TYPE_NAME: &'static str = $name;
            }
        )*
    };
}

opaque_kinds! {
    BoxKind => Box, "RustBox";
    SliceKind => Slice, "RustSlice";
    VecKind => Vec, "RustVec";
    TupleKind => Tuple, "RustTuple";
}

pub type RustBox<T> = Opaque<BoxKind, T>;
pub type RustSlice<T> = Opaque<SliceKind, T>;
pub type RustVec<T> = Opaque<VecKind, T>;
pub type RustTuple<T> = Opaque<TupleKind, T>;

/// A resolved destructor symbol.
pub struct Destructor {
    symbol: String,
    drop: DropFn,
    table: Rc<dyn SymbolTable>,
}

impl Destructor {
    pub fn resolve(table: &Rc<dyn SymbolTable>, symbol: &str) -> BindResult<Self> {
        Ok(Self { symbol: symbol.to_string(), drop: table.function(symbol)?, table: table.clone() })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn run(&self, address: Address) {
        log::trace!("{}: {} at {:?}", self.table.library_name(), self.symbol, address);
        // SAFETY: called once, from `OwnershipHandle::release`, on an owned address.
        unsafe { (self.drop)(address.as_ptr()) }
    }
}

impl fmt::Debug for Destructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Destructor").field(&self.symbol).finish()
    }
}

/// An owned native value of kind `K` with element tag `T`.
pub struct Opaque<K: OpaqueKind, T> {
    handle: OwnershipHandle,
    destructor: Option<Rc<Destructor>>,
    _marker: PhantomData<(fn() -> K, fn() -> T)>,
}

impl<K: OpaqueKind, T> Opaque<K, T> {
    /// # Safety
    /// `address` must be an owned value of this kind, owned by nothing else,
    /// and `destructor` (if any) must be the one that releases it.
    pub unsafe fn adopt(address: Address, destructor: Option<Rc<Destructor>>) -> Self {
        log::trace!("{} adopted at {:?}", K::TYPE_NAME, address);
        Self { handle: OwnershipHandle::occupied(address), destructor, _marker: PhantomData }
    }

    /// Takes ownership of the result of an owning call to `symbol`.
    ///
    /// # Safety
    /// As for [`Opaque::adopt`].
    pub unsafe fn from_raw(symbol: &str, raw: *mut c_void, destructor: Option<Rc<Destructor>>) -> BindResult<Self> {
        Ok(Self::adopt(dispatch::owned(symbol, raw)?, destructor))
    }

    pub fn has_destructor(&self) -> bool {
        self.destructor.is_some()
    }

    pub fn destructor(&self) -> Option<&Rc<Destructor>> {
        self.destructor.as_ref()
    }

    /// Destroys the value now, if a destructor is bound and the value is still owned.
    pub fn destroy(&self) -> bool {
        match &self.destructor {
            Some(destructor) => self.handle.release(|address| destructor.run(address)),
            None => false,
        }
    }
}

impl<K: OpaqueKind, T> NativeValue for Opaque<K, T> {
    const KIND: ValueKind = K::KIND;

    fn handle(&self) -> &OwnershipHandle {
        &self.handle
    }
}

impl<K: OpaqueKind, T> Drop for Opaque<K, T> {
    fn drop(&mut self) {
        if self.destroy() {
            return;
        }
        if let Ok(address) = self.handle.move_out() {
            log::warn!("{} at {:?} leaked: no destructor bound", K::TYPE_NAME, address);
        }
    }
}

impl<K: OpaqueKind, T> fmt::Debug for Opaque<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::TYPE_NAME)
            .field("handle", &self.handle)
            .field("destructor", &self.destructor)
            .finish()
    }
}
