//! Native side of the ownlink boundary.
//!
//! Every export is a flat `extern "C"` function named after the dispatch
//! convention (`__<Type>__<method>`, `__<function>`, `__<Type>__drop`).
//! Owned values cross the boundary as `Box::into_raw` addresses, so the
//! address of a value never changes while it is alive, even when the value
//! itself reallocates internally (e.g. `String::push_str`).
//!
//! Built both as a `cdylib` (loaded through `dlopen` by the host) and as an
//! `rlib` so the host crate's tests can link it in-process.

#![allow(non_snake_case)]

use std::ffi::c_void;

pub mod bytes;
pub mod fixtures;
pub mod metadata;
pub mod string;

/// Pairs an export with its symbol name.
macro_rules! export {
    ($($module:ident::$name:ident),* $(,)?) => {
        vec![$((stringify!($name), $module::$name as *const c_void)),*]
    };
}

/// Every symbol this library exports, paired with its in-process address.
///
/// `dlopen` consumers never need this; it exists so a host linking the rlib
/// can resolve the same table without going through the dynamic loader.
pub fn exports() -> Vec<(&'static str, *const c_void)> {
    export![
        metadata::__Metadata__lib_name,
        metadata::__Metadata__lib_version,
        metadata::__Metadata__rust_toolchain,
        metadata::__Metadata__rust_version,
        string::__RustString__new,
        string::__RustString__from,
        string::__RustString__into_ptr,
        string::__RustString__into_len,
        string::__RustString__push,
        string::__RustString__drop,
        bytes::__RustBytes__new,
        bytes::__RustBytes__from,
        bytes::__RustBytes__as_ptr,
        bytes::__RustBytes__len,
        bytes::__RustBytes__extend,
        bytes::__RustBytes__drop,
        fixtures::__test_1,
        fixtures::__test_2,
        fixtures::__test_string,
        fixtures::__test_bool,
        fixtures::__test_numeric,
        fixtures::__test_char,
        fixtures::__test_box_new,
        fixtures::__test_box_get,
        fixtures::__test_box,
        fixtures::__test_box_drop,
        fixtures::__CustomType__new,
        fixtures::__CustomType__id,
        fixtures::__CustomType__count,
        fixtures::__CustomType__bump,
        fixtures::__CustomType__test_self,
        fixtures::__CustomType__test_ref_self,
        fixtures::__CustomType__test_mut_self,
        fixtures::__CustomType__dropped,
        fixtures::__CustomType__drop,
    ]
}

/// Reads `len` bytes at `ptr` as text.
///
/// # Safety
/// `ptr` must point to `len` readable bytes (or `len` must be 0).
pub(crate) unsafe fn text_from_raw_parts<'a>(ptr: *const u8, len: usize) -> std::borrow::Cow<'a, str> {
    if len == 0 || ptr.is_null() {
        return std::borrow::Cow::Borrowed("");
    }
    let bytes = std::slice::from_raw_parts(ptr, len);
    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_names_follow_the_symbol_convention() {
        let exports = exports();
        assert!(exports.iter().all(|(name, _)| name.starts_with("__")));
        assert!(exports.iter().any(|(name, _)| *name == "__RustString__push"));
        assert!(exports.iter().all(|(_, addr)| !addr.is_null()));
    }

    #[test]
    fn export_names_are_unique() {
        let exports = exports();
        let mut names: Vec<_> = exports.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), exports.len());
    }
}
