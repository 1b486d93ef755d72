//! The ownership handle: runtime move/borrow/drop checks over one native address.
//!
//! The host side has no borrow checker for values on the other side of the
//! boundary, so every ownership transfer goes through [`OwnershipHandle`].
//! Misuse (using a value after it moved) becomes a uniform
//! [`BindError::ValueMoved`] instead of a dangling address.
//!
//! Handles use interior mutability and are deliberately `!Send + !Sync`: a
//! handle is confined to the thread that created it. Only borrow tokens may be
//! shared, and only for the call that issued them.

use std::cell::Cell;
use std::ffi::c_void;
use std::marker::PhantomData;

use crate::abi::Address;
use crate::error::{BindError, BindResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Occupied(Address),
    /// A mutable borrow is in progress; restored when it completes.
    Lent,
    /// Moved out or released. Terminal.
    Inert,
}

/// Owns zero or one native address.
#[derive(Debug)]
pub struct OwnershipHandle {
    slot: Cell<Slot>,
}

impl OwnershipHandle {
    /// A handle owning `address`.
    pub fn occupied(address: Address) -> Self {
        Self { slot: Cell::new(Slot::Occupied(address)) }
    }

    /// A handle that owns nothing. Every ownership operation on it fails.
    pub fn empty() -> Self {
        Self { slot: Cell::new(Slot::Inert) }
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self.slot.get(), Slot::Occupied(_))
    }

    /// True once the value has been moved out or released; never reverts.
    pub fn is_inert(&self) -> bool {
        self.slot.get() == Slot::Inert
    }

    /// The owned address, if any. For diagnostics and identity checks only.
    pub fn address(&self) -> Option<Address> {
        match self.slot.get() {
            Slot::Occupied(address) => Some(address),
            Slot::Lent | Slot::Inert => None,
        }
    }

    fn current(&self) -> BindResult<Address> {
        match self.slot.get() {
            Slot::Occupied(address) => Ok(address),
            Slot::Lent | Slot::Inert => {
                log::debug!("ownership check failed: value already moved");
                Err(BindError::ValueMoved)
            }
        }
    }

    /// Transfers ownership of the address to the caller and leaves the handle
    /// permanently inert.
    pub fn move_out(&self) -> BindResult<Address> {
        let address = self.current()?;
        self.slot.set(Slot::Inert);
        log::trace!("moved out {:?}", address);
        Ok(address)
    }

    /// A shared borrow of the current address. The handle is unaffected.
    ///
    /// The token must not outlive the native call it is passed to; the
    /// lifetime ties it to the handle, the rest is caller discipline.
    pub fn borrow(&self) -> BindResult<BorrowToken<'_>> {
        let address = self.current()?;
        Ok(BorrowToken { address, _call: PhantomData })
    }

    /// Runs `op` with an exclusive borrow of the address.
    ///
    /// For the duration of `op` the handle reports empty, so a reentrant
    /// `move_out`, `borrow` or `borrow_mut` on the same handle fails with
    /// `ValueMoved`. The address is restored on every exit path, including a
    /// panic unwinding out of `op`.
    ///
    /// The restored address is the one recorded on entry: native values are
    /// boxed, so a mutation never relocates the value itself.
    pub fn borrow_mut<R>(&self, op: impl FnOnce(BorrowMut<'_>) -> R) -> BindResult<R> {
        let address = self.current()?;
        self.slot.set(Slot::Lent);
        let _restore = Restore { handle: self, address };
        Ok(op(BorrowMut { address, _call: PhantomData }))
    }

    /// Destroys the owned value through `destroyer`, at most once.
    ///
    /// Returns whether `destroyer` ran. Releasing an emptied handle is a
    /// no-op: a value that was moved away has nothing left to destroy here.
    pub fn release(&self, destroyer: impl FnOnce(Address)) -> bool {
        match self.slot.get() {
            Slot::Occupied(address) => {
                // Inert before the call, so a panicking destructor is never retried.
                self.slot.set(Slot::Inert);
                destroyer(address);
                true
            }
            Slot::Lent | Slot::Inert => false,
        }
    }
}

/// Puts the lent address back when a mutable borrow ends.
struct Restore<'h> {
    handle: &'h OwnershipHandle,
    address: Address,
}

impl Drop for Restore<'_> {
    fn drop(&mut self) {
        if self.handle.slot.get() == Slot::Lent {
            self.handle.slot.set(Slot::Occupied(self.address));
        }
    }
}

/// A shared, non-owning reference to a native address, valid for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowToken<'a> {
    address: Address,
    _call: PhantomData<&'a ()>,
}

impl BorrowToken<'_> {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.address.as_ptr()
    }
}

/// An exclusive, non-owning reference to a native address, valid for the
/// `borrow_mut` callback that received it.
#[derive(Debug, PartialEq, Eq)]
pub struct BorrowMut<'a> {
    address: Address,
    _call: PhantomData<&'a mut ()>,
}

impl BorrowMut<'_> {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.address.as_ptr()
    }
}

// SAFETY: tokens carry no ownership and are bounded by the call that issued
// them; sharing one across threads cannot outlive or free the value.
unsafe impl Send for BorrowToken<'_> {}
unsafe impl Sync for BorrowToken<'_> {}
unsafe impl Send for BorrowMut<'_> {}
unsafe impl Sync for BorrowMut<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn address(slot: &mut u64) -> Address {
        Address::new(slot as *mut u64 as *mut c_void).unwrap()
    }

    #[test]
    fn move_out_empties_the_handle_for_good() {
        let mut value = 7u64;
        let handle = OwnershipHandle::occupied(address(&mut value));
        let moved = handle.move_out().unwrap();
        assert_eq!(moved, address(&mut value));

        assert!(matches!(handle.move_out(), Err(BindError::ValueMoved)));
        assert!(matches!(handle.borrow(), Err(BindError::ValueMoved)));
        assert!(matches!(handle.borrow_mut(|_| ()), Err(BindError::ValueMoved)));
        assert!(handle.is_inert());
    }

    #[test]
    fn borrow_leaves_state_alone() {
        let mut value = 1u64;
        let handle = OwnershipHandle::occupied(address(&mut value));
        let token = handle.borrow().unwrap();
        assert_eq!(token.address(), address(&mut value));
        assert!(handle.is_occupied());
    }

    #[test]
    fn borrow_mut_restores_the_same_address() {
        let mut value = 1u64;
        let expected = address(&mut value);
        let handle = OwnershipHandle::occupied(expected);
        let seen = handle
            .borrow_mut(|target| {
                unsafe { *(target.as_ptr() as *mut u64) += 1 };
                target.address()
            })
            .unwrap();
        assert_eq!(seen, expected);
        assert_eq!(handle.address(), Some(expected));
        assert_eq!(value, 2);
    }

    #[test]
    fn handle_reports_empty_during_borrow_mut() {
        let mut value = 0u64;
        let handle = OwnershipHandle::occupied(address(&mut value));
        handle
            .borrow_mut(|_| {
                assert!(!handle.is_occupied());
                assert!(matches!(handle.move_out(), Err(BindError::ValueMoved)));
                assert!(matches!(handle.borrow(), Err(BindError::ValueMoved)));
                assert!(matches!(handle.borrow_mut(|_| ()), Err(BindError::ValueMoved)));
                assert!(!handle.release(|_| panic!("destroyed mid-borrow")));
            })
            .unwrap();
        assert!(handle.is_occupied());
    }

    #[test]
    fn borrow_mut_restores_after_panic() {
        let mut value = 0u64;
        let expected = address(&mut value);
        let handle = OwnershipHandle::occupied(expected);
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            handle.borrow_mut(|_| panic!("native call failed")).unwrap();
        }));
        assert!(outcome.is_err());
        assert_eq!(handle.address(), Some(expected));
    }

    #[test]
    fn release_runs_the_destroyer_once() {
        let mut value = 0u64;
        let handle = OwnershipHandle::occupied(address(&mut value));
        let mut calls = 0;
        assert!(handle.release(|_| calls += 1));
        assert!(!handle.release(|_| calls += 1));
        assert_eq!(calls, 1);
        assert!(matches!(handle.move_out(), Err(BindError::ValueMoved)));
    }

    #[test]
    fn release_after_move_is_a_no_op() {
        let mut value = 0u64;
        let handle = OwnershipHandle::occupied(address(&mut value));
        handle.move_out().unwrap();
        assert!(!handle.release(|_| panic!("nothing to destroy")));
    }
}
