//! User-defined record types.
//!
//! A record is a native struct exported under its type name. Its operations
//! follow the dispatch convention: `__<Name>__<method>` for constructors and
//! methods, `__<Name>__drop` for the destructor. Bindings for a concrete
//! record name it through [`RecordType`] and call its methods through
//! [`Record::invoke`] and friends, which apply the receiver mode to the
//! record's handle.

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::{DropFn, NativeValue, ValueKind};
use crate::abi::{Address, ForeignFn};
use crate::dispatch::{self, Borrowed, Operation, Receiver, ReturnPolicy};
use crate::error::BindResult;
use crate::handle::OwnershipHandle;
use crate::symbols::{Manifest, SymbolTable};

/// Names a native record type.
pub trait RecordType: 'static {
    const NAME: &'static str;
}

/// The resolved destructor of `R`, plus the table its methods resolve against.
pub struct RecordApi<R: RecordType> {
    table: Rc<dyn SymbolTable>,
    drop: DropFn,
    _marker: PhantomData<fn() -> R>,
}

impl<R: RecordType> RecordApi<R> {
    pub fn resolve(table: Rc<dyn SymbolTable>) -> BindResult<Rc<Self>> {
        let destructor = Operation::destructor(R::NAME);
        let drop = table.function(&destructor.symbol())?;
        log::debug!("{}: bound record {}", table.library_name(), R::NAME);
        Ok(Rc::new(Self { table, drop, _marker: PhantomData }))
    }

    /// Resolves the function behind `op` as `F`.
    pub fn function<F: ForeignFn>(&self, op: &Operation) -> BindResult<F> {
        op.validate()?;
        self.table.function(&op.symbol())
    }

    pub fn table(&self) -> &Rc<dyn SymbolTable> {
        &self.table
    }
}

impl<R: RecordType> fmt::Debug for RecordApi<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordApi")
            .field("record", &R::NAME)
            .field("library", &self.table.library_name())
            .finish_non_exhaustive()
    }
}

/// An owned instance of the native record `R`.
pub struct Record<R: RecordType> {
    handle: OwnershipHandle,
    api: Rc<RecordApi<R>>,
}

impl<R: RecordType> Record<R> {
    /// Calls the constructor `__<R>__<name>` and takes ownership of its result.
    pub fn construct<F: ForeignFn>(
        api: &Rc<RecordApi<R>>,
        name: &str,
        call: impl FnOnce(F) -> *mut c_void,
    ) -> BindResult<Self> {
        let op = Operation::constructor(R::NAME, name.to_string());
        let f = api.function::<F>(&op)?;
        let address = dispatch::owned(&op.symbol(), call(f))?;
        // SAFETY: `__<R>__<name>` is declared as an owning constructor of `R`.
        Ok(unsafe { Self::adopt(api.clone(), address) })
    }

    /// Calls the static method `__<R>__<name>`, which has no receiver.
    pub fn invoke_static<F: ForeignFn, T>(api: &Rc<RecordApi<R>>, name: &str, call: impl FnOnce(F) -> T) -> BindResult<T> {
        let op = Operation::method(R::NAME, name.to_string(), Receiver::Static, ReturnPolicy::Scalar);
        let f = api.function::<F>(&op)?;
        Ok(call(f))
    }

    /// Takes ownership of an `R` the native side handed out.
    ///
    /// # Safety
    /// `address` must be an owned `R` from the library `api` was resolved
    /// from, owned by nothing else: the wrapper passes it to `__<R>__drop`.
    pub unsafe fn adopt(api: Rc<RecordApi<R>>, address: Address) -> Self {
        log::trace!("{} adopted at {:?}", R::NAME, address);
        Self { handle: OwnershipHandle::occupied(address), api }
    }

    pub fn api(&self) -> &Rc<RecordApi<R>> {
        &self.api
    }

    /// Calls a method returning a scalar (or nothing).
    ///
    /// `call` receives the resolved function and the receiver address. The
    /// function is resolved before the receiver is applied, so a failed
    /// lookup never consumes the record.
    pub fn invoke<F: ForeignFn, T>(
        &self,
        name: &str,
        receiver: Receiver,
        call: impl FnOnce(F, *mut c_void) -> T,
    ) -> BindResult<T> {
        let op = Operation::method(R::NAME, name.to_string(), receiver, ReturnPolicy::Scalar);
        self.run(&op, call)
    }

    /// Calls a method returning a new owned `R`.
    pub fn invoke_owned<F: ForeignFn>(
        &self,
        name: &str,
        receiver: Receiver,
        call: impl FnOnce(F, *mut c_void) -> *mut c_void,
    ) -> BindResult<Record<R>> {
        let op = Operation::method(R::NAME, name.to_string(), receiver, ReturnPolicy::Owned);
        let raw = self.run(&op, call)?;
        let address = dispatch::owned(&op.symbol(), raw)?;
        // SAFETY: declared with an owned `R` result.
        Ok(unsafe { Self::adopt(self.api.clone(), address) })
    }

    /// Calls a method returning a borrow of an `R`.
    ///
    /// The result is never destroyed by the host and may not outlive `self`.
    pub fn invoke_borrowed<F: ForeignFn>(
        &self,
        name: &str,
        receiver: Receiver,
        call: impl FnOnce(F, *mut c_void) -> *const c_void,
    ) -> BindResult<Borrowed<'_, R>> {
        let op = Operation::method(R::NAME, name.to_string(), receiver, ReturnPolicy::Borrowed);
        let raw = self.run(&op, call)?;
        Borrowed::new(&op.symbol(), raw)
    }

    fn run<F: ForeignFn, T>(&self, op: &Operation, call: impl FnOnce(F, *mut c_void) -> T) -> BindResult<T> {
        let f = self.api.function::<F>(op)?;
        log::trace!("calling {}", op);
        dispatch::pass(op.receiver(), &self.handle, |this| call(f, this))
    }

    pub fn destroy(&self) -> bool {
        let drop_fn = self.api.drop;
        self.handle.release(|address| {
            log::trace!("{} dropped at {:?}", R::NAME, address);
            // SAFETY: the handle owned `address` and is inert from here on.
            unsafe { drop_fn(address.as_ptr()) }
        })
    }
}

impl<R: RecordType> NativeValue for Record<R> {
    const KIND: ValueKind = ValueKind::Record;

    fn handle(&self) -> &OwnershipHandle {
        &self.handle
    }
}

impl<R: RecordType> Drop for Record<R> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<R: RecordType> fmt::Debug for Record<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(R::NAME).field("handle", &self.handle).finish()
    }
}

/// The destructor entry every record declares.
pub fn manifest<R: RecordType>() -> Manifest {
    Manifest::new().declare::<DropFn>(Operation::destructor(R::NAME).symbol())
}
