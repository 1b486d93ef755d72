//! `ownlink.toml`: which native library to open and which symbols to bind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::abi::Signature;
use crate::error::{BindError, BindResult};
use crate::symbols::{library_display_name, Manifest, SymbolEntry};

pub const CONFIG_FILE: &str = "ownlink.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// The native library to open
    pub library: LibrarySection,

    /// Symbols to resolve beyond the library metadata
    #[serde(default)]
    pub bindings: BindingsSection,

    #[serde(default)]
    pub log: LogSection,

    /// Directory the configuration was loaded from; relative library paths resolve against it.
    #[serde(skip)]
    root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySection {
    pub path: PathBuf,

    /// Display name; defaults to the file stem of `path` without a leading `lib`
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingsSection {
    /// Builtin kinds whose operations must resolve
    #[serde(default = "default_kinds")]
    pub kinds: Vec<BuiltinKind>,

    /// Additional functions, declared with their signature
    #[serde(default)]
    pub extra: Vec<ExtraSymbol>,
}

impl Default for BindingsSection {
    fn default() -> Self {
        Self { kinds: default_kinds(), extra: vec![] }
    }
}

fn default_kinds() -> Vec<BuiltinKind> {
    vec![BuiltinKind::String, BuiltinKind::Bytes]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinKind {
    String,
    Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSymbol {
    pub name: String,
    #[serde(flatten)]
    pub signature: Signature,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self { level: default_level() }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl BindingConfig {
    /// Parses a configuration. Relative library paths stay relative to the working directory.
    pub fn parse(source: &str, origin: &Path) -> BindResult<Self> {
        toml::from_str(source).map_err(|e| BindError::Config { path: origin.to_path_buf(), message: e.to_string() })
    }

    pub fn load(path: &Path) -> BindResult<Self> {
        let source = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&source, path)?;
        config.root = path.parent().map(Path::to_path_buf);
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Searches `start` and its ancestors for `ownlink.toml` and loads the first one found.
    pub fn find(start: &Path) -> BindResult<Self> {
        let mut current = if start.is_dir() {
            start.to_path_buf()
        } else {
            start.parent().map_or_else(|| start.to_path_buf(), Path::to_path_buf)
        };

        loop {
            let candidate = current.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
            if !current.pop() {
                return Err(BindError::Config {
                    path: start.to_path_buf(),
                    message: format!("no {} found here or in any parent directory", CONFIG_FILE),
                });
            }
        }
    }

    pub fn library_path(&self) -> PathBuf {
        match &self.root {
            Some(root) if self.library.path.is_relative() => root.join(&self.library.path),
            _ => self.library.path.clone(),
        }
    }

    pub fn library_name(&self) -> String {
        self.library.name.clone().unwrap_or_else(|| library_display_name(&self.library.path))
    }

    /// Metadata accessors, the configured builtin kinds and every extra symbol.
    pub fn manifest(&self) -> Manifest {
        let mut manifest = crate::metadata::manifest();
        for kind in &self.bindings.kinds {
            manifest = manifest.merge(match kind {
                BuiltinKind::String => crate::types::string::manifest(),
                BuiltinKind::Bytes => crate::types::bytes::manifest(),
            });
        }
        for extra in &self.bindings.extra {
            manifest.push(SymbolEntry::with_signature(extra.name.clone(), extra.signature.clone()));
        }
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::NativeType;

    const SAMPLE: &str = r#"
[library]
path = "target/debug/libownlink_native.so"

[bindings]
kinds = ["string"]

[[bindings.extra]]
name = "__test_2"
params = ["pointer"]
result = "pointer"

[[bindings.extra]]
name = "__test_1"

[log]
level = "debug"
"#;

    #[test]
    fn parses_every_section() {
        let config = BindingConfig::parse(SAMPLE, Path::new("ownlink.toml")).unwrap();
        assert_eq!(config.library_name(), "ownlink_native");
        assert_eq!(config.bindings.kinds, vec![BuiltinKind::String]);
        assert_eq!(config.log.level, "debug");

        let manifest = config.manifest();
        assert!(manifest.get("__RustString__push").is_some());
        assert!(manifest.get("__RustBytes__extend").is_none());
        assert!(manifest.get("__Metadata__lib_name").is_some());
        let test_2 = manifest.get("__test_2").unwrap();
        assert_eq!(test_2.signature(), &Signature::new(&[NativeType::Pointer], NativeType::Pointer));
        let test_1 = manifest.get("__test_1").unwrap();
        assert_eq!(test_1.signature(), &Signature::new(&[], NativeType::Void));
    }

    #[test]
    fn defaults_apply() {
        let config = BindingConfig::parse("[library]\npath = \"x.so\"\n", Path::new("ownlink.toml")).unwrap();
        assert_eq!(config.bindings.kinds, vec![BuiltinKind::String, BuiltinKind::Bytes]);
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.library_name(), "x");
    }

    #[test]
    fn library_name_drops_only_one_lib_prefix() {
        let config = BindingConfig::parse("[library]\npath = \"liblibfoo.so\"\n", Path::new("ownlink.toml")).unwrap();
        assert_eq!(config.library_name(), "libfoo");
        assert_eq!(config.library_name(), library_display_name(&config.library.path));

        let config =
            BindingConfig::parse("[library]\npath = \"libownlink_native\"\n", Path::new("ownlink.toml")).unwrap();
        assert_eq!(config.library_name(), "ownlink_native");

        let named = "[library]\npath = \"libx.so\"\nname = \"custom\"\n";
        let config = BindingConfig::parse(named, Path::new("ownlink.toml")).unwrap();
        assert_eq!(config.library_name(), "custom");
    }

    #[test]
    fn missing_library_is_a_config_error() {
        let err = BindingConfig::parse("[log]\nlevel = \"info\"\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, BindError::Config { path, .. } if path == Path::new("bad.toml")));
    }

    #[test]
    fn finds_config_in_a_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[library]\npath = \"lib/native.so\"\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = BindingConfig::find(&nested).unwrap();
        assert_eq!(config.library_path(), dir.path().join("lib/native.so"));
    }

    #[test]
    fn find_fails_without_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(BindingConfig::find(dir.path()), Err(BindError::Config { .. })));
    }
}
