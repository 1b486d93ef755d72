use std::fmt;
use std::path::Path;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::abi::ForeignFn;
use crate::config::BindingConfig;
use crate::error::BindResult;
use crate::metadata::Metadata;
use crate::symbols::{DynamicLibrary, Manifest, SymbolTable};
use crate::types::{BytesApi, RecordApi, RecordType, RustBytes, RustString, StringApi};

/// Entry point: one loaded native library and the wrappers bound to it.
///
/// Per-kind operations are resolved on first use and shared by every value
/// of that kind. Like the handles it hands out, a `Bindings` stays on the
/// thread that created it.
pub struct Bindings {
    table: Rc<dyn SymbolTable>,
    metadata: OnceCell<Metadata>,
    strings: OnceCell<Rc<StringApi>>,
    bytes: OnceCell<Rc<BytesApi>>,
}

impl Bindings {
    pub fn new(table: Rc<dyn SymbolTable>) -> Self {
        Self { table, metadata: OnceCell::new(), strings: OnceCell::new(), bytes: OnceCell::new() }
    }

    /// Opens the library at `path` and resolves `manifest` against it.
    pub fn open(path: impl AsRef<Path>, manifest: Manifest) -> BindResult<Self> {
        let library = DynamicLibrary::open(path, manifest)?;
        Ok(Self::new(Rc::new(library)))
    }

    /// Opens the library a configuration file points at.
    pub fn from_config(config: &BindingConfig) -> BindResult<Self> {
        let library = DynamicLibrary::open_named(config.library_path(), config.library_name(), config.manifest())?;
        Ok(Self::new(Rc::new(library)))
    }

    pub fn table(&self) -> &Rc<dyn SymbolTable> {
        &self.table
    }

    /// The library's self-description, read once.
    pub fn metadata(&self) -> BindResult<&Metadata> {
        self.metadata.get_or_try_init(|| Metadata::read(&*self.table))
    }

    pub fn strings(&self) -> BindResult<Rc<StringApi>> {
        self.strings
            .get_or_try_init(|| StringApi::resolve(self.table.clone()).map(Rc::new))
            .cloned()
    }

    pub fn bytes(&self) -> BindResult<Rc<BytesApi>> {
        self.bytes.get_or_try_init(|| BytesApi::resolve(self.table.clone()).map(Rc::new)).cloned()
    }

    /// Binds the record type `R`.
    pub fn record<R: RecordType>(&self) -> BindResult<Rc<RecordApi<R>>> {
        RecordApi::resolve(self.table.clone())
    }

    /// Resolves a declared function by its full symbol name.
    pub fn function<F: ForeignFn>(&self, symbol: &str) -> BindResult<F> {
        self.table.function(symbol)
    }

    pub fn string(&self, text: &str) -> BindResult<RustString> {
        RustString::from_text(&self.strings()?, text)
    }

    pub fn byte_vec(&self, bytes: &[u8]) -> BindResult<RustBytes> {
        RustBytes::from_slice(&self.bytes()?, bytes)
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("library", &self.table.library_name())
            .field("symbols", &self.table.manifest().len())
            .finish()
    }
}
