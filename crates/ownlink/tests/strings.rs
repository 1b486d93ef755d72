mod common;

use common::{bindings, StringFn};
use ownlink::{dispatch, BindError, NativeValue, Receiver, RustString};

#[test]
fn text_round_trips() {
    let bindings = bindings();
    for text in ["Hello from the host", "", "ünïcödé ✓", "日本語"] {
        let string = bindings.string(text).unwrap();
        assert_eq!(string.read().unwrap(), text);
        assert_eq!(string.len().unwrap(), text.len());
    }
}

#[test]
fn new_string_is_empty() {
    let bindings = bindings();
    let string = RustString::new(&bindings.strings().unwrap()).unwrap();
    assert!(string.is_empty().unwrap());
    assert_eq!(string.read().unwrap(), "");
}

#[test]
fn pushes_onto_an_empty_string() {
    let bindings = bindings();
    let string = RustString::new(&bindings.strings().unwrap()).unwrap();
    let before = string.handle().address();
    string.push_str("Hello").unwrap();
    string.push_str(", world!").unwrap();
    assert_eq!(string.handle().address(), before);
    assert_eq!(string.read().unwrap(), "Hello, world!");
    assert_eq!(string.len().unwrap(), 13);
}

#[test]
fn push_keeps_the_address() {
    let bindings = bindings();
    let string = bindings.string("Hello").unwrap();
    let before = string.handle().address();
    string.push_str(", world!").unwrap();
    assert_eq!(string.handle().address(), before);
    assert_eq!(string.read().unwrap(), "Hello, world!");
}

#[test]
fn by_value_call_moves_the_argument() {
    let bindings = bindings();
    let strings = bindings.strings().unwrap();
    let test_2: StringFn = bindings.function("__test_2").unwrap();

    let hello = bindings.string("Hello").unwrap();
    let raw = dispatch::pass(Receiver::Value, hello.handle(), |this| unsafe { test_2(this) }).unwrap();
    // SAFETY: `__test_2` returns a new owned string.
    let result = unsafe { RustString::adopt_raw(strings, "__test_2", raw) }.unwrap();

    assert_eq!(result.read().unwrap(), "Hello to Rust!");
    assert!(hello.is_moved());
    assert!(matches!(hello.read(), Err(BindError::ValueMoved)));
    assert!(matches!(hello.push_str("!"), Err(BindError::ValueMoved)));
}

#[test]
fn identity_call_hands_back_the_same_text() {
    let bindings = bindings();
    let test_string: StringFn = bindings.function("__test_string").unwrap();
    let original = bindings.string("Hello from Deno").unwrap();
    let raw = dispatch::pass(Receiver::Value, original.handle(), |this| unsafe { test_string(this) }).unwrap();
    // SAFETY: `__test_string` hands back the string it was given.
    let returned = unsafe { RustString::adopt_raw(bindings.strings().unwrap(), "__test_string", raw) }.unwrap();
    assert_eq!(returned.read().unwrap(), "Hello from Deno");
    assert!(original.is_moved());
    assert!(matches!(original.take(), Err(BindError::ValueMoved)));
    assert!(matches!(original.read(), Err(BindError::ValueMoved)));
}

#[test]
fn second_take_fails() {
    let bindings = bindings();
    let string = bindings.string("once").unwrap();
    let address = string.take().unwrap();
    assert!(matches!(string.take(), Err(BindError::ValueMoved)));
    assert!(!string.destroy());

    // The moved-out value is still live; hand it back so it gets freed.
    // SAFETY: `address` was moved out of a string from the same bindings.
    let back = unsafe { RustString::adopt(bindings.strings().unwrap(), address) };
    assert_eq!(back.read().unwrap(), "once");
}

#[test]
fn destroy_is_idempotent() {
    let bindings = bindings();
    let string = bindings.string("bye").unwrap();
    assert!(string.destroy());
    assert!(!string.destroy());
    assert!(matches!(string.len(), Err(BindError::ValueMoved)));
}

#[test]
fn api_is_resolved_once() {
    let bindings = bindings();
    let a = bindings.strings().unwrap();
    let b = bindings.strings().unwrap();
    assert!(std::rc::Rc::ptr_eq(&a, &b));
}
