//! The dispatch convention: how a logical operation maps to a native symbol
//! and how its receiver is passed.
//!
//! Symbol names are bit-exact:
//!
//! * `__<TypeName>__<method>` for constructors, instance and static methods,
//! * `__<function>` for free functions,
//! * `__<TypeName>__drop` for destructors.

use std::borrow::Cow;
use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;

use crate::abi::Address;
use crate::error::{BindError, BindResult};
use crate::handle::OwnershipHandle;

pub const SYMBOL_PREFIX: &str = "__";
pub const SEPARATOR: &str = "__";
pub const DESTRUCTOR: &str = "drop";

/// Symbol for an operation scoped to a type.
pub fn method_symbol(type_name: &str, method: &str) -> String {
    format!("{SYMBOL_PREFIX}{type_name}{SEPARATOR}{method}")
}

/// Symbol for a free function.
pub fn free_symbol(function: &str) -> String {
    format!("{SYMBOL_PREFIX}{function}")
}

/// Symbol for a type's destructor.
pub fn destructor_symbol(type_name: &str) -> String {
    method_symbol(type_name, DESTRUCTOR)
}

/// How the receiver (or an owned argument) is handed to the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// Consumes the receiver; the wrapper is inert afterwards.
    Value,
    /// Shared borrow; the wrapper is unaffected.
    Ref,
    /// Exclusive borrow, taken for the duration of the call.
    RefMut,
    /// No receiver.
    Static,
}

/// What the native call hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnPolicy {
    /// A freshly owned value, wrapped into a new typed wrapper.
    Owned,
    /// A borrow of an existing value, exposed as a raw non-owning address.
    Borrowed,
    /// A scalar, passed through unchanged.
    Scalar,
    Void,
}

/// A logical native operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    owner: Option<Cow<'static, str>>,
    name: Cow<'static, str>,
    receiver: Receiver,
    returns: ReturnPolicy,
}

impl Operation {
    /// A static operation on `owner` that returns a new owned `owner`.
    pub fn constructor(owner: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            owner: Some(owner.into()),
            name: name.into(),
            receiver: Receiver::Static,
            returns: ReturnPolicy::Owned,
        }
    }

    /// An operation scoped to `owner`.
    pub fn method(
        owner: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        receiver: Receiver,
        returns: ReturnPolicy,
    ) -> Self {
        Self { owner: Some(owner.into()), name: name.into(), receiver, returns }
    }

    /// A free function. Free functions never have a receiver.
    pub fn function(name: impl Into<Cow<'static, str>>, returns: ReturnPolicy) -> Self {
        Self { owner: None, name: name.into(), receiver: Receiver::Static, returns }
    }

    /// The destructor of `owner`: consumes the receiver, returns nothing.
    pub fn destructor(owner: impl Into<Cow<'static, str>>) -> Self {
        Self {
            owner: Some(owner.into()),
            name: Cow::Borrowed(DESTRUCTOR),
            receiver: Receiver::Value,
            returns: ReturnPolicy::Void,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    pub fn returns(&self) -> ReturnPolicy {
        self.returns
    }

    pub fn is_destructor(&self) -> bool {
        self.owner.is_some() && self.name == DESTRUCTOR
    }

    /// The native symbol this operation calls.
    pub fn symbol(&self) -> String {
        match &self.owner {
            Some(owner) => method_symbol(owner, &self.name),
            None => free_symbol(&self.name),
        }
    }

    /// Checks the operation against the convention.
    pub fn validate(&self) -> BindResult<()> {
        let invalid = |message: String| Err(BindError::InvalidOperation { message });
        if self.owner.is_none() && self.receiver != Receiver::Static {
            return invalid(format!("free function `{}` cannot take a receiver", self.name));
        }
        if self.is_destructor() && (self.receiver != Receiver::Value || self.returns != ReturnPolicy::Void) {
            return invalid(format!("destructor `{}` must consume its receiver and return nothing", self.symbol()));
        }
        if self.receiver == Receiver::Value && self.returns == ReturnPolicy::Borrowed {
            return invalid(format!("`{}` consumes its receiver and cannot return a borrow", self.symbol()));
        }
        Ok(())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:?} self, {:?} return]", self.symbol(), self.receiver, self.returns)
    }
}

/// Applies `receiver` to `handle` and passes the resulting raw address to `call`.
///
/// * `Value`: the handle is moved out before the call and stays inert.
/// * `Ref`: the handle is borrowed for the call.
/// * `RefMut`: the call runs inside `borrow_mut`, so the handle is restored
///   when it returns.
///
/// `Static` has no receiver to pass and is rejected.
pub fn pass<R>(receiver: Receiver, handle: &OwnershipHandle, call: impl FnOnce(*mut c_void) -> R) -> BindResult<R> {
    match receiver {
        Receiver::Value => {
            let address = handle.move_out()?;
            Ok(call(address.as_ptr()))
        }
        Receiver::Ref => {
            let token = handle.borrow()?;
            Ok(call(token.as_ptr() as *mut c_void))
        }
        Receiver::RefMut => handle.borrow_mut(|target| call(target.as_ptr())),
        Receiver::Static => Err(BindError::InvalidOperation {
            message: "a static operation has no receiver to pass".to_string(),
        }),
    }
}

/// Checks an address returned by an owning call.
pub fn owned(symbol: &str, raw: *mut c_void) -> BindResult<Address> {
    Address::new(raw).ok_or_else(|| BindError::NullAddress { symbol: symbol.to_string() })
}

/// A borrow handed back by a native call. Never owning, never destroyed.
pub struct Borrowed<'a, T> {
    address: Address,
    _marker: PhantomData<(&'a (), fn() -> T)>,
}

impl<'a, T> Borrowed<'a, T> {
    pub fn new(symbol: &str, raw: *const c_void) -> BindResult<Self> {
        let address = Address::from_const(raw).ok_or_else(|| BindError::NullAddress { symbol: symbol.to_string() })?;
        Ok(Self { address, _marker: PhantomData })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.address.as_ptr()
    }
}

// Manual impls: the element tag `T` is phantom and need not be `Clone` or `Debug`.
impl<T> Clone for Borrowed<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Borrowed<'_, T> {}

impl<T> fmt::Debug for Borrowed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Borrowed").field(&self.address).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_follow_the_convention() {
        assert_eq!(method_symbol("RustString", "push"), "__RustString__push");
        assert_eq!(free_symbol("test_2"), "__test_2");
        assert_eq!(destructor_symbol("CustomType"), "__CustomType__drop");
        assert_eq!(Operation::constructor("CustomType", "new").symbol(), "__CustomType__new");
        assert_eq!(Operation::function("test_bool", ReturnPolicy::Scalar).symbol(), "__test_bool");
        assert_eq!(Operation::destructor("RustBytes").symbol(), "__RustBytes__drop");
    }

    #[test]
    fn free_functions_reject_receivers() {
        let mut op = Operation::function("test_2", ReturnPolicy::Owned);
        assert!(op.validate().is_ok());
        op.receiver = Receiver::Value;
        assert!(matches!(op.validate(), Err(BindError::InvalidOperation { .. })));
    }

    #[test]
    fn destructor_shape_is_fixed() {
        assert!(Operation::destructor("CustomType").validate().is_ok());
        let op = Operation::method("CustomType", "drop", Receiver::Ref, ReturnPolicy::Void);
        assert!(op.validate().is_err());
    }

    #[test]
    fn pass_by_value_consumes_the_handle() {
        let mut slot = 3u8;
        let addr = Address::new(&mut slot as *mut u8 as *mut c_void).unwrap();
        let handle = OwnershipHandle::occupied(addr);
        let seen = pass(Receiver::Value, &handle, |this| this).unwrap();
        assert_eq!(seen, addr.as_ptr());
        assert!(handle.is_inert());
        assert!(matches!(pass(Receiver::Ref, &handle, |_| ()), Err(BindError::ValueMoved)));
    }

    #[test]
    fn pass_by_reference_keeps_the_handle() {
        let mut slot = 3u8;
        let addr = Address::new(&mut slot as *mut u8 as *mut c_void).unwrap();
        let handle = OwnershipHandle::occupied(addr);
        pass(Receiver::Ref, &handle, |_| ()).unwrap();
        pass(Receiver::RefMut, &handle, |_| assert!(!handle.is_occupied())).unwrap();
        assert_eq!(handle.address(), Some(addr));
        assert!(pass(Receiver::Static, &handle, |_| ()).is_err());
    }

    #[test]
    fn null_results_are_rejected() {
        assert!(matches!(
            owned("__CustomType__new", std::ptr::null_mut()),
            Err(BindError::NullAddress { symbol }) if symbol == "__CustomType__new"
        ));
        assert!(Borrowed::<u8>::new("__x", std::ptr::null()).is_err());
    }
}
