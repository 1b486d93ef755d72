//! `Vec<u8>` exports, boxed the same way as strings.

/// Allocates an empty byte vector.
#[no_mangle]
pub extern "C" fn __RustBytes__new() -> *mut Vec<u8> {
    Box::into_raw(Box::new(Vec::new()))
}

/// Allocates a byte vector holding a copy of `len` bytes at `ptr`.
///
/// # Safety
/// `ptr` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn __RustBytes__from(ptr: *const u8, len: usize) -> *mut Vec<u8> {
    let bytes = if len == 0 || ptr.is_null() {
        Vec::new()
    } else {
        std::slice::from_raw_parts(ptr, len).to_vec()
    };
    Box::into_raw(Box::new(bytes))
}

/// # Safety
/// `bytes` must be a live address returned by this module.
#[no_mangle]
pub unsafe extern "C" fn __RustBytes__as_ptr(bytes: *const Vec<u8>) -> *const u8 {
    (*bytes).as_ptr()
}

/// # Safety
/// `bytes` must be a live address returned by this module.
#[no_mangle]
pub unsafe extern "C" fn __RustBytes__len(bytes: *const Vec<u8>) -> usize {
    (*bytes).len()
}

/// Appends `len` bytes at `ptr`.
///
/// # Safety
/// `bytes` must be a live, unaliased address returned by this module and
/// `ptr` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn __RustBytes__extend(bytes: *mut Vec<u8>, ptr: *const u8, len: usize) {
    if len == 0 || ptr.is_null() {
        return;
    }
    (*bytes).extend_from_slice(std::slice::from_raw_parts(ptr, len));
}

/// # Safety
/// `bytes` must be a live address returned by this module; it is dangling afterwards.
#[no_mangle]
pub unsafe extern "C" fn __RustBytes__drop(bytes: *mut Vec<u8>) {
    if !bytes.is_null() {
        drop(Box::from_raw(bytes));
    }
}
