// Bakes the active toolchain name into the library so `__Metadata__rust_toolchain`
// can hand out a static, null-terminated string.
fn main() {
    println!("cargo:rerun-if-env-changed=RUSTUP_TOOLCHAIN");
    let toolchain = std::env::var("RUSTUP_TOOLCHAIN").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=OWNLINK_TOOLCHAIN={}", toolchain);
}
