// Process-wide metadata. Each accessor hands out a pointer to a static,
// null-terminated string; callers must not free it.

#[no_mangle]
pub extern "C" fn __Metadata__lib_name() -> *const u8 {
    concat!(env!("CARGO_CRATE_NAME"), "\0").as_ptr()
}

#[no_mangle]
pub extern "C" fn __Metadata__lib_version() -> *const u8 {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr()
}

#[no_mangle]
pub extern "C" fn __Metadata__rust_toolchain() -> *const u8 {
    concat!(env!("OWNLINK_TOOLCHAIN"), "\0").as_ptr()
}

#[no_mangle]
pub extern "C" fn __Metadata__rust_version() -> *const u8 {
    concat!(env!("CARGO_PKG_RUST_VERSION"), "\0").as_ptr()
}
