use std::ffi::c_void;

use rustc_hash::FxHashMap;

use super::{Manifest, Resolved, SymbolEntry, SymbolTable};
use crate::abi::Address;
use crate::error::BindResult;

/// A table over functions already linked into this process.
///
/// Used when the native library is linked as an rlib (tests, static builds)
/// rather than opened through the dynamic loader.
#[derive(Debug)]
pub struct ExportTable {
    resolved: Resolved,
}

impl ExportTable {
    /// Resolves `manifest` against `exports`, a list of `(symbol name, address)` pairs.
    pub fn new<'a>(
        name: impl Into<String>,
        manifest: Manifest,
        exports: impl IntoIterator<Item = (&'a str, *const c_void)>,
    ) -> BindResult<Self> {
        let exports: FxHashMap<&str, *const c_void> = exports.into_iter().collect();
        let resolved = Resolved::build(name.into(), manifest, |entry| {
            exports.get(entry.name()).and_then(|ptr| Address::from_const(*ptr))
        })?;
        Ok(Self { resolved })
    }
}

impl SymbolTable for ExportTable {
    fn library_name(&self) -> &str {
        self.resolved.name()
    }

    fn entry(&self, name: &str) -> Option<&SymbolEntry> {
        self.resolved.entry(name)
    }

    fn address(&self, name: &str) -> BindResult<Address> {
        self.resolved.address(name)
    }

    fn manifest(&self) -> &Manifest {
        self.resolved.manifest()
    }
}
