use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};

use libloading::Library;

use super::{Manifest, Resolved, SymbolEntry, SymbolTable};
use crate::abi::Address;
use crate::error::{BindError, BindResult};

/// A shared object opened with `dlopen` (or the platform equivalent).
pub struct DynamicLibrary {
    path: PathBuf,
    resolved: Resolved,
    // Declared last: addresses in `resolved` must not outlive the mapping.
    #[allow(dead_code)]
    library: Library,
}

impl fmt::Debug for DynamicLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicLibrary")
            .field("path", &self.path)
            .field("resolved", &self.resolved)
            .field("library", &"[Library]")
            .finish()
    }
}

/// The name a library is known by: the file stem of `path` without one
/// leading `lib`, so `libfoo.so` and `foo.dll` are both `foo`.
pub fn library_display_name(path: &Path) -> String {
    match path.file_stem() {
        Some(stem) => {
            let stem = stem.to_string_lossy();
            match stem.strip_prefix("lib") {
                Some(rest) if !rest.is_empty() => rest.to_string(),
                _ => stem.into_owned(),
            }
        }
        None => path.display().to_string(),
    }
}

impl DynamicLibrary {
    /// Opens the library at `path` and resolves every entry of `manifest`.
    pub fn open(path: impl AsRef<Path>, manifest: Manifest) -> BindResult<Self> {
        let path = path.as_ref().to_path_buf();
        let name = library_display_name(&path);
        Self::open_named(path, name, manifest)
    }

    /// Like [`DynamicLibrary::open`] with an explicit display name.
    pub fn open_named(path: PathBuf, name: String, manifest: Manifest) -> BindResult<Self> {
        log::debug!("Opening native library {}", path.display());
        // SAFETY: running the library's initialisers is inherent to loading it;
        // the library is trusted to be an ownlink-convention native library.
        let library = unsafe { Library::new(path.as_os_str()) }.map_err(|source| {
            log::error!("Failed to open {}: {}", path.display(), source);
            BindError::LibraryLoad { path: path.clone(), source }
        })?;

        let resolved = Resolved::build(name, manifest, |entry| lookup(&library, entry))?;
        log::info!(
            "Loaded {} ({} symbols) from {}",
            resolved.name(),
            resolved.manifest().len(),
            path.display()
        );
        Ok(Self { path, resolved, library })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the library at `path` and reports which entries of `manifest`
    /// it exports, without failing on missing ones.
    pub fn probe(path: &Path, manifest: &Manifest) -> BindResult<Vec<(SymbolEntry, bool)>> {
        // SAFETY: as in `open_named`.
        let library = unsafe { Library::new(path.as_os_str()) }
            .map_err(|source| BindError::LibraryLoad { path: path.to_path_buf(), source })?;
        Ok(manifest.iter().map(|entry| (entry.clone(), lookup(&library, entry).is_some())).collect())
    }
}

fn lookup(library: &Library, entry: &SymbolEntry) -> Option<Address> {
    // SAFETY: the symbol is read as a bare address and only reinterpreted as a
    // function later, under its declared signature.
    let symbol = unsafe { library.get::<*mut c_void>(entry.name().as_bytes()) }.ok()?;
    Address::new(*symbol)
}

impl SymbolTable for DynamicLibrary {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_one_lib_prefix() {
        assert_eq!(library_display_name(Path::new("target/debug/libownlink_native.so")), "ownlink_native");
        assert_eq!(library_display_name(Path::new("libownlink_native")), "ownlink_native");
        assert_eq!(library_display_name(Path::new("liblibfoo.so")), "libfoo");
        assert_eq!(library_display_name(Path::new("ownlink_native.dll")), "ownlink_native");
        assert_eq!(library_display_name(Path::new("lib.so")), "lib");
        assert_eq!(library_display_name(Path::new("x.so")), "x");
    }

    #[test]
    fn missing_image_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libdoes_not_exist.so");
        match DynamicLibrary::open(&path, Manifest::new()) {
            Err(BindError::LibraryLoad { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected LibraryLoad, got {:?}", other),
        }
        assert!(matches!(
            DynamicLibrary::probe(&path, &Manifest::new()),
            Err(BindError::LibraryLoad { .. })
        ));
    }

    #[test]
    fn garbage_image_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libgarbage.so");
        std::fs::write(&path, b"not a shared object").unwrap();
        assert!(matches!(DynamicLibrary::open(&path, Manifest::new()), Err(BindError::LibraryLoad { .. })));
    }
}
