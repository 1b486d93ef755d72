//! Test surface: free functions and a user-defined record covering each
//! receiver and return rule of the dispatch convention.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

#[no_mangle]
pub extern "C" fn __test_1() {
    println!("Hello, world!");
}

/// Consumes a string and returns a new one with `" to Rust!"` appended.
///
/// # Safety
/// `string` must be a live, owned `String` address; ownership moves into this call.
#[no_mangle]
pub unsafe extern "C" fn __test_2(string: *mut String) -> *mut String {
    let string = Box::from_raw(string);
    Box::into_raw(Box::new(format!("{} to Rust!", string)))
}

/// Takes a string by value and hands it straight back.
///
/// # Safety
/// `string` must be a live, owned `String` address.
#[no_mangle]
pub unsafe extern "C" fn __test_string(string: *mut String) -> *mut String {
    let string = Box::from_raw(string);
    Box::into_raw(string)
}

#[no_mangle]
pub extern "C" fn __test_bool(value: bool) -> bool {
    !value
}

#[no_mangle]
pub extern "C" fn __test_numeric(value: f64) -> f64 {
    value
}

/// Returns the next Unicode scalar, or the input if there is none.
#[no_mangle]
pub extern "C" fn __test_char(code: u32) -> u32 {
    match char::from_u32(code.wrapping_add(1)) {
        Some(next) => next as u32,
        None => code,
    }
}

#[no_mangle]
pub extern "C" fn __test_box_new(value: u8) -> *mut u8 {
    Box::into_raw(Box::new(value))
}

/// # Safety
/// `boxed` must be a live address from `__test_box_new`.
#[no_mangle]
pub unsafe extern "C" fn __test_box_get(boxed: *const u8) -> u8 {
    *boxed
}

/// Takes a box by value and returns it unchanged.
///
/// # Safety
/// `boxed` must be a live, owned address from `__test_box_new`.
#[no_mangle]
pub unsafe extern "C" fn __test_box(boxed: *mut u8) -> *mut u8 {
    Box::into_raw(Box::from_raw(boxed))
}

/// # Safety
/// `boxed` must be a live, owned address from `__test_box_new`.
#[no_mangle]
pub unsafe extern "C" fn __test_box_drop(boxed: *mut u8) {
    if !boxed.is_null() {
        drop(Box::from_raw(boxed));
    }
}

// --- CustomType --- //

static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static DROPPED: Mutex<Vec<u64>> = parking_lot::const_mutex(Vec::new());

/// A user-defined record with an identity and a counter.
#[derive(Debug)]
pub struct CustomType {
    id: u64,
    count: u64,
}

impl Drop for CustomType {
    fn drop(&mut self) {
        DROPPED.lock().push(self.id);
    }
}

#[no_mangle]
pub extern "C" fn __CustomType__new() -> *mut CustomType {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    Box::into_raw(Box::new(CustomType { id, count: 0 }))
}

/// # Safety
/// `this` must be a live `CustomType` address.
#[no_mangle]
pub unsafe extern "C" fn __CustomType__id(this: *const CustomType) -> u64 {
    (*this).id
}

/// # Safety
/// `this` must be a live `CustomType` address.
#[no_mangle]
pub unsafe extern "C" fn __CustomType__count(this: *const CustomType) -> u64 {
    (*this).count
}

/// # Safety
/// `this` must be a live, unaliased `CustomType` address.
#[no_mangle]
pub unsafe extern "C" fn __CustomType__bump(this: *mut CustomType, by: u64) {
    (*this).count += by;
}

/// By-value receiver: consumes `this` and returns it as a fresh owned value.
///
/// # Safety
/// `this` must be a live, owned `CustomType` address.
#[no_mangle]
pub unsafe extern "C" fn __CustomType__test_self(this: *mut CustomType) -> *mut CustomType {
    Box::into_raw(Box::from_raw(this))
}

/// By-reference receiver returning a borrow of itself.
///
/// # Safety
/// `this` must be a live `CustomType` address.
#[no_mangle]
pub unsafe extern "C" fn __CustomType__test_ref_self(this: *const CustomType) -> *const CustomType {
    this
}

/// By-mutable-reference receiver: bumps the counter and returns a mutable borrow of itself.
///
/// # Safety
/// `this` must be a live, unaliased `CustomType` address.
#[no_mangle]
pub unsafe extern "C" fn __CustomType__test_mut_self(this: *mut CustomType) -> *mut CustomType {
    (*this).count += 1;
    this
}

/// How many times the record with `id` has been destroyed.
#[no_mangle]
pub extern "C" fn __CustomType__dropped(id: u64) -> u32 {
    DROPPED.lock().iter().filter(|dropped| **dropped == id).count() as u32
}

/// # Safety
/// `this` must be a live, owned `CustomType` address; it is dangling afterwards.
#[no_mangle]
pub unsafe extern "C" fn __CustomType__drop(this: *mut CustomType) {
    if !this.is_null() {
        drop(Box::from_raw(this));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_is_recorded_per_instance() {
        unsafe {
            let a = __CustomType__new();
            let b = __CustomType__new();
            let (id_a, id_b) = (__CustomType__id(a), __CustomType__id(b));
            assert_ne!(id_a, id_b);
            __CustomType__drop(a);
            assert_eq!(__CustomType__dropped(id_a), 1);
            assert_eq!(__CustomType__dropped(id_b), 0);
            __CustomType__drop(b);
        }
    }

    #[test]
    fn mutable_receiver_bumps_in_place() {
        unsafe {
            let this = __CustomType__new();
            let same = __CustomType__test_mut_self(this);
            assert_eq!(this, same);
            __CustomType__bump(this, 4);
            assert_eq!(__CustomType__count(this), 5);
            __CustomType__drop(this);
        }
    }
}
