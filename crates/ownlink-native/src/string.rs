//! `String` exports.
//!
//! A string crosses the boundary as a `*mut String` obtained from
//! `Box::into_raw`. The box never moves, so `push` mutates in place and the
//! host may keep using the same address afterwards.

use crate::text_from_raw_parts;

/// Allocates an empty string.
#[no_mangle]
pub extern "C" fn __RustString__new() -> *mut String {
    Box::into_raw(Box::new(String::new()))
}

/// Allocates a string holding a copy of `len` UTF-8 bytes at `ptr`.
///
/// # Safety
/// `ptr` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn __RustString__from(ptr: *const u8, len: usize) -> *mut String {
    let text = text_from_raw_parts(ptr, len).into_owned();
    Box::into_raw(Box::new(text))
}

/// Base address of the string's bytes. Only valid until the next mutation.
///
/// # Safety
/// `string` must be a live address returned by this module.
#[no_mangle]
pub unsafe extern "C" fn __RustString__into_ptr(string: *const String) -> *const u8 {
    (*string).as_ptr()
}

/// Length of the string in bytes.
///
/// # Safety
/// `string` must be a live address returned by this module.
#[no_mangle]
pub unsafe extern "C" fn __RustString__into_len(string: *const String) -> usize {
    (&(*string)).len()
}

/// Appends `len` UTF-8 bytes at `ptr`.
///
/// # Safety
/// `string` must be a live address returned by this module, not aliased for
/// the duration of the call. `ptr` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn __RustString__push(string: *mut String, ptr: *const u8, len: usize) {
    let text = text_from_raw_parts(ptr, len);
    (*string).push_str(&text);
}

/// Destroys a string.
///
/// # Safety
/// `string` must be a live address returned by this module; it is dangling afterwards.
#[no_mangle]
pub unsafe extern "C" fn __RustString__drop(string: *mut String) {
    if !string.is_null() {
        drop(Box::from_raw(string));
    }
}
