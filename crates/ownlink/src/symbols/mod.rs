//! Symbol resolution.
//!
//! The core only ever talks to a [`SymbolTable`]: something that maps a
//! declared name to an address. Two tables exist: [`DynamicLibrary`] opens a
//! shared object with `libloading`, [`ExportTable`] wraps addresses that are
//! already linked into the process. Both resolve their whole manifest up
//! front, so a missing symbol fails at load time rather than at first call.

mod dynamic;
mod exports;

use std::borrow::Cow;

use rustc_hash::FxHashMap;

pub use dynamic::{library_display_name, DynamicLibrary};
pub use exports::ExportTable;

use crate::abi::{Address, ForeignFn, NativeType, Signature};
use crate::error::{BindError, BindResult};

/// A declared entry point: name, parameter kinds, result kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    name: Cow<'static, str>,
    signature: Signature,
}

impl SymbolEntry {
    pub fn new(name: impl Into<Cow<'static, str>>, params: &[NativeType], result: NativeType) -> Self {
        Self { name: name.into(), signature: Signature::new(params, result) }
    }

    /// Declares `name` with the signature of the function-pointer type `F`.
    pub fn of<F: ForeignFn>(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into(), signature: F::signature() }
    }

    pub fn with_signature(name: impl Into<Cow<'static, str>>, signature: Signature) -> Self {
        Self { name: name.into(), signature }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// The ordered set of entries a table must resolve.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<SymbolEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. A later entry with the same name replaces the earlier one.
    pub fn push(&mut self, entry: SymbolEntry) {
        match self.entries.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn declare<F: ForeignFn>(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.push(SymbolEntry::of::<F>(name));
        self
    }

    pub fn merge(mut self, other: Manifest) -> Self {
        for entry in other.entries {
            self.push(entry);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SymbolEntry> for Manifest {
    fn from_iter<I: IntoIterator<Item = SymbolEntry>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for entry in iter {
            manifest.push(entry);
        }
        manifest
    }
}

/// Callable-by-name capability the core depends on.
///
/// Tables are read-only once built.
pub trait SymbolTable {
    /// Display name of the library behind this table.
    fn library_name(&self) -> &str;

    /// The declared entry for `name`.
    fn entry(&self, name: &str) -> Option<&SymbolEntry>;

    /// The resolved address for `name`.
    fn address(&self, name: &str) -> BindResult<Address>;

    /// Every declared entry, in manifest order.
    fn manifest(&self) -> &Manifest;
}

impl<'a> dyn SymbolTable + 'a {
    /// Resolves `name` as the function-pointer type `F`.
    ///
    /// Fails with `UnknownSymbol` when `name` is not declared and with
    /// `SignatureMismatch` when `F` disagrees with the declaration, so the
    /// address is only reinterpreted under the declared signature.
    pub fn function<F: ForeignFn>(&self, name: &str) -> BindResult<F> {
        let entry = self
            .entry(name)
            .ok_or_else(|| BindError::UnknownSymbol { name: name.to_string() })?;
        let requested = F::signature();
        if entry.signature() != &requested {
            return Err(BindError::SignatureMismatch {
                name: name.to_string(),
                declared: entry.signature().clone(),
                requested,
            });
        }
        let address = self.address(name)?;
        // SAFETY: the manifest declared this symbol with exactly `F`'s signature.
        Ok(unsafe { F::from_address(address) })
    }
}

/// A manifest resolved to addresses; shared by both table kinds.
#[derive(Debug)]
pub(crate) struct Resolved {
    name: String,
    manifest: Manifest,
    addresses: FxHashMap<String, Address>,
}

impl Resolved {
    /// Resolves every manifest entry through `lookup`.
    pub(crate) fn build(
        name: String,
        manifest: Manifest,
        mut lookup: impl FnMut(&SymbolEntry) -> Option<Address>,
    ) -> BindResult<Self> {
        let mut addresses = FxHashMap::default();
        for entry in manifest.iter() {
            let address = lookup(entry).ok_or_else(|| {
                log::debug!("{}: symbol `{}` missing", name, entry.name());
                BindError::SymbolNotFound { name: entry.name().to_string() }
            })?;
            log::debug!("{}: resolved `{}` {} at {:?}", name, entry.name(), entry.signature(), address);
            addresses.insert(entry.name().to_string(), address);
        }
        Ok(Self { name, manifest, addresses })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn entry(&self, name: &str) -> Option<&SymbolEntry> {
        self.manifest.get(name)
    }

    pub(crate) fn address(&self, name: &str) -> BindResult<Address> {
        self.addresses
            .get(name)
            .copied()
            .ok_or_else(|| BindError::UnknownSymbol { name: name.to_string() })
    }

    pub(crate) fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

/// Every builtin entry: metadata, strings and byte vectors.
pub fn builtin_manifest() -> Manifest {
    crate::metadata::manifest()
        .merge(crate::types::string::manifest())
        .merge(crate::types::bytes::manifest())
}
