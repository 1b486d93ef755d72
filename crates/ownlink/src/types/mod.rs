//! Typed value wrappers: an ownership handle tagged with the kind of native
//! value it owns, plus the kind's operations.

use std::ffi::c_void;
use std::fmt;

use crate::abi::Address;
use crate::error::BindResult;
use crate::handle::{BorrowToken, OwnershipHandle};

pub mod bytes;
pub mod char;
pub mod opaque;
pub mod record;
pub mod string;

/// Allocates an empty value.
pub type NewFn = unsafe extern "C" fn() -> *mut c_void;
/// Allocates a value from a `(base, len)` byte buffer.
pub type FromBufferFn = unsafe extern "C" fn(*const u8, usize) -> *mut c_void;
/// Destroys a value, consuming it.
pub type DropFn = unsafe extern "C" fn(*mut c_void);

/// The logical kind of a native value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Bytes,
    Box,
    Slice,
    Vec,
    Tuple,
    Record,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Box => "box",
            ValueKind::Slice => "slice",
            ValueKind::Vec => "vec",
            ValueKind::Tuple => "tuple",
            ValueKind::Record => "record",
        };
        f.write_str(name)
    }
}

/// Common surface of every typed wrapper.
///
/// Wrappers release their value when dropped, unless it was moved out or
/// destroyed first.
pub trait NativeValue {
    const KIND: ValueKind;

    fn handle(&self) -> &OwnershipHandle;

    /// Moves the value out. The wrapper is inert afterwards and its drop does nothing.
    fn take(&self) -> BindResult<Address> {
        self.handle().move_out()
    }

    /// A shared borrow for passing to a single native call.
    fn borrow(&self) -> BindResult<BorrowToken<'_>> {
        self.handle().borrow()
    }

    /// True once the value was moved out or destroyed.
    fn is_moved(&self) -> bool {
        self.handle().is_inert()
    }
}

pub use self::bytes::{BytesApi, RustBytes};
pub use self::char::RustChar;
pub use self::opaque::{Destructor, Opaque, RustBox, RustSlice, RustTuple, RustVec};
pub use self::record::{Record, RecordApi, RecordType};
pub use self::string::{RustString, StringApi};
