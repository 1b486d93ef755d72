use std::ffi::{c_char, CStr};

use crate::error::{BindError, BindResult};
use crate::symbols::{Manifest, SymbolTable};

type MetadataFn = unsafe extern "C" fn() -> *const u8;

pub const LIB_NAME: &str = "__Metadata__lib_name";
pub const LIB_VERSION: &str = "__Metadata__lib_version";
pub const RUST_TOOLCHAIN: &str = "__Metadata__rust_toolchain";
pub const RUST_VERSION: &str = "__Metadata__rust_version";

/// Descriptive strings a native library reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub lib_name: String,
    pub lib_version: String,
    pub rust_toolchain: String,
    pub rust_version: String,
}

impl Metadata {
    /// Calls the four metadata accessors once each.
    pub fn read(table: &dyn SymbolTable) -> BindResult<Self> {
        let metadata = Self {
            lib_name: read_one(table, LIB_NAME)?,
            lib_version: read_one(table, LIB_VERSION)?,
            rust_toolchain: read_one(table, RUST_TOOLCHAIN)?,
            rust_version: read_one(table, RUST_VERSION)?,
        };
        log::info!(
            "{} {} (rust {}, toolchain {})",
            metadata.lib_name,
            metadata.lib_version,
            metadata.rust_version,
            metadata.rust_toolchain
        );
        Ok(metadata)
    }
}

fn read_one(table: &dyn SymbolTable, symbol: &str) -> BindResult<String> {
    let accessor = table.function::<MetadataFn>(symbol)?;
    // SAFETY: declared as a zero-argument call returning a static C string.
    let ptr = unsafe { accessor() };
    if ptr.is_null() {
        return Err(BindError::NullAddress { symbol: symbol.to_string() });
    }
    // SAFETY: the native side returns a null-terminated string it never frees.
    let text = unsafe { CStr::from_ptr(ptr as *const c_char) };
    Ok(text.to_str()?.to_string())
}

/// Entries for the four metadata accessors.
pub fn manifest() -> Manifest {
    Manifest::new()
        .declare::<MetadataFn>(LIB_NAME)
        .declare::<MetadataFn>(LIB_VERSION)
        .declare::<MetadataFn>(RUST_TOOLCHAIN)
        .declare::<MetadataFn>(RUST_VERSION)
}
