//! Runtime ownership emulation and marshalling for calls into native
//! libraries that follow single-owner move semantics.
//!
//! Every native value the host holds lives behind an [`OwnershipHandle`],
//! which turns use-after-move into [`BindError::ValueMoved`] and guarantees
//! each value is destroyed at most once. Typed wrappers ([`RustString`],
//! [`RustBytes`], [`Record`], ...) pair a handle with the operations of its
//! kind, resolved by name from a [`SymbolTable`] following the
//! `__<Type>__<method>` convention in [`dispatch`].

pub mod abi;
pub mod bindings;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod marshal;
pub mod metadata;
pub mod symbols;
pub mod types;

pub use abi::{Address, FnAddress, ForeignFn, NativeRepr, NativeReturn, NativeType, Signature};
pub use bindings::Bindings;
pub use config::BindingConfig;
pub use dispatch::{Borrowed, Operation, Receiver, ReturnPolicy};
pub use error::{BindError, BindResult};
pub use handle::{BorrowMut, BorrowToken, OwnershipHandle};
pub use metadata::Metadata;
pub use symbols::{builtin_manifest, library_display_name, DynamicLibrary, ExportTable, Manifest, SymbolEntry, SymbolTable};
pub use types::{
    Destructor, NativeValue, Opaque, Record, RecordApi, RecordType, RustBox, RustBytes, RustChar, RustSlice,
    RustString, RustTuple, RustVec, ValueKind,
};
