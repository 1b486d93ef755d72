// Shared helpers for the integration tests: bindings over the in-process
// native library, and a hand-written binding for its `CustomType` record.
#![allow(dead_code)]

use std::ffi::c_void;
use std::rc::Rc;

use ownlink::types::record;
use ownlink::{
    builtin_manifest, BindResult, Bindings, Borrowed, ExportTable, Manifest, Receiver, Record, RecordApi, RecordType,
    RustChar, SymbolTable,
};

pub type VoidFn = unsafe extern "C" fn();
pub type StringFn = unsafe extern "C" fn(*mut c_void) -> *mut c_void;
pub type BoolFn = unsafe extern "C" fn(bool) -> bool;
pub type NumericFn = unsafe extern "C" fn(f64) -> f64;
pub type CharFn = unsafe extern "C" fn(RustChar) -> RustChar;
pub type BoxNewFn = unsafe extern "C" fn(u8) -> *mut c_void;
pub type BoxGetFn = unsafe extern "C" fn(*const c_void) -> u8;
pub type BoxFn = unsafe extern "C" fn(*mut c_void) -> *mut c_void;
pub type DropFn = unsafe extern "C" fn(*mut c_void);

pub type NewFn = unsafe extern "C" fn() -> *mut c_void;
pub type GetFn = unsafe extern "C" fn(*const c_void) -> u64;
pub type BumpFn = unsafe extern "C" fn(*mut c_void, u64);
pub type SelfFn = unsafe extern "C" fn(*mut c_void) -> *mut c_void;
pub type RefSelfFn = unsafe extern "C" fn(*const c_void) -> *const c_void;
pub type DroppedFn = unsafe extern "C" fn(u64) -> u32;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Declarations for the fixture exports.
pub fn fixture_manifest() -> Manifest {
    Manifest::new()
        .declare::<VoidFn>("__test_1")
        .declare::<StringFn>("__test_2")
        .declare::<StringFn>("__test_string")
        .declare::<BoolFn>("__test_bool")
        .declare::<NumericFn>("__test_numeric")
        .declare::<CharFn>("__test_char")
        .declare::<BoxNewFn>("__test_box_new")
        .declare::<BoxGetFn>("__test_box_get")
        .declare::<BoxFn>("__test_box")
        .declare::<DropFn>("__test_box_drop")
        .merge(record::manifest::<CustomTypeRecord>())
        .declare::<NewFn>("__CustomType__new")
        .declare::<GetFn>("__CustomType__id")
        .declare::<GetFn>("__CustomType__count")
        .declare::<BumpFn>("__CustomType__bump")
        .declare::<SelfFn>("__CustomType__test_self")
        .declare::<RefSelfFn>("__CustomType__test_ref_self")
        .declare::<SelfFn>("__CustomType__test_mut_self")
        .declare::<DroppedFn>("__CustomType__dropped")
}

pub fn table() -> Rc<dyn SymbolTable> {
    init_logging();
    let manifest = builtin_manifest().merge(fixture_manifest());
    let table = ExportTable::new("ownlink_native", manifest, ownlink_native::exports()).unwrap();
    Rc::new(table)
}

pub fn bindings() -> Bindings {
    Bindings::new(table())
}

pub enum CustomTypeRecord {}

impl RecordType for CustomTypeRecord {
    const NAME: &'static str = "CustomType";
}

/// A binding for the native `CustomType`, shaped the way a generator would emit it.
pub struct CustomType(pub Record<CustomTypeRecord>);

impl CustomType {
    pub fn new(api: &Rc<RecordApi<CustomTypeRecord>>) -> BindResult<Self> {
        Record::construct(api, "new", |f: NewFn| unsafe { f() }).map(Self)
    }

    pub fn id(&self) -> BindResult<u64> {
        self.0.invoke("id", Receiver::Ref, |f: GetFn, this| unsafe { f(this) })
    }

    pub fn count(&self) -> BindResult<u64> {
        self.0.invoke("count", Receiver::Ref, |f: GetFn, this| unsafe { f(this) })
    }

    pub fn bump(&self, by: u64) -> BindResult<()> {
        self.0.invoke("bump", Receiver::RefMut, |f: BumpFn, this| unsafe { f(this, by) })
    }

    pub fn test_self(&self) -> BindResult<CustomType> {
        self.0.invoke_owned("test_self", Receiver::Value, |f: SelfFn, this| unsafe { f(this) }).map(Self)
    }

    pub fn test_ref_self(&self) -> BindResult<Borrowed<'_, CustomTypeRecord>> {
        self.0.invoke_borrowed("test_ref_self", Receiver::Ref, |f: RefSelfFn, this| unsafe { f(this) })
    }

    pub fn test_mut_self(&self) -> BindResult<Borrowed<'_, CustomTypeRecord>> {
        self.0
            .invoke_borrowed("test_mut_self", Receiver::RefMut, |f: SelfFn, this| unsafe { f(this) as *const c_void })
    }

    /// How many times the instance with `id` has been destroyed natively.
    pub fn dropped(api: &Rc<RecordApi<CustomTypeRecord>>, id: u64) -> BindResult<u32> {
        Record::invoke_static(api, "dropped", |f: DroppedFn| unsafe { f(id) })
    }
}
