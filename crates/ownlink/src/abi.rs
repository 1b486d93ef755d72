//! The closed set of kinds that may cross the boundary, and the glue that
//! ties a Rust `extern "C"` function-pointer type to a declared signature.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

use serde::{Deserialize, Serialize};

/// An opaque, non-null address of a value living in native-managed memory.
///
/// Host code compares addresses for identity but never dereferences them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Address(NonNull<c_void>);

impl Address {
    /// Returns `None` for a null pointer.
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Address)
    }

    pub fn from_const(ptr: *const c_void) -> Option<Self> {
        Self::new(ptr as *mut c_void)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#x})", self.addr())
    }
}

/// Parameter and result kinds understood by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeType {
    U8,
    U16,
    U32,
    U64,
    Usize,
    I8,
    I16,
    I32,
    I64,
    Isize,
    F32,
    F64,
    Bool,
    /// Opaque address of a native value.
    Pointer,
    /// Address of a byte buffer; its length travels as a separate argument.
    Buffer,
    /// Address of a native function.
    Function,
    Void,
}

impl NativeType {
    pub fn name(self) -> &'static str {
        match self {
            NativeType::U8 => "u8",
            NativeType::U16 => "u16",
            NativeType::U32 => "u32",
            NativeType::U64 => "u64",
            NativeType::Usize => "usize",
            NativeType::I8 => "i8",
            NativeType::I16 => "i16",
            NativeType::I32 => "i32",
            NativeType::I64 => "i64",
            NativeType::Isize => "isize",
            NativeType::F32 => "f32",
            NativeType::F64 => "f64",
            NativeType::Bool => "bool",
            NativeType::Pointer => "pointer",
            NativeType::Buffer => "buffer",
            NativeType::Function => "function",
            NativeType::Void => "void",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered parameter kinds plus a result kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<NativeType>,
    #[serde(default = "default_result")]
    pub result: NativeType,
}

fn default_result() -> NativeType {
    NativeType::Void
}

impl Signature {
    pub fn new(params: &[NativeType], result: NativeType) -> Self {
        Self { params: params.to_vec(), result }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.result)
    }
}

/// Address of a native function passed as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct FnAddress(pub *const c_void);

/// A Rust type whose ABI matches one [`NativeType`] when passed as an argument.
pub trait NativeRepr: Copy {
    const KIND: NativeType;
}

/// A Rust type usable as the result of an `extern "C"` call.
pub trait NativeReturn {
    const KIND: NativeType;
}

macro_rules! native_repr {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl NativeRepr for $ty {
                const KIND: NativeType = NativeType::$kind;
            }
            impl NativeReturn for $ty {
                const KIND: NativeType = NativeType::$kind;
            }
        )*
    };
}

native_repr! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    *mut c_void => Pointer,
    *const c_void => Pointer,
    *mut u8 => Buffer,
    *const u8 => Buffer,
    FnAddress => Function,
}

impl NativeReturn for () {
    const KIND: NativeType = NativeType::Void;
}

/// An `unsafe extern "C" fn(..) -> R` pointer type with a known signature.
///
/// # Safety
/// Implementors must be function-pointer types whose ABI matches
/// [`ForeignFn::signature`]; `from_address` reinterprets a raw address.
pub unsafe trait ForeignFn: Copy {
    fn signature() -> Signature;

    /// # Safety
    /// `address` must point to a function with exactly this signature.
    unsafe fn from_address(address: Address) -> Self;
}

macro_rules! foreign_fn {
    ($($arg:ident),*) => {
        unsafe impl<Ret: NativeReturn, $($arg: NativeRepr),*> ForeignFn for unsafe extern "C" fn($($arg),*) -> Ret {
            fn signature() -> Signature {
                Signature {
                    params: vec![$(<$arg as NativeRepr>::KIND),*],
                    result: <Ret as NativeReturn>::KIND,
                }
            }

            unsafe fn from_address(address: Address) -> Self {
                debug_assert_eq!(std::mem::size_of::<Self>(), std::mem::size_of::<*mut c_void>());
                let raw = address.as_ptr();
                std::mem::transmute_copy::<*mut c_void, Self>(&raw)
            }
        }
    };
}

foreign_fn!();
foreign_fn!(A);
foreign_fn!(A, B);
foreign_fn!(A, B, C);
foreign_fn!(A, B, C, D);
foreign_fn!(A, B, C, D, E);
foreign_fn!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;

    type PushFn = unsafe extern "C" fn(*mut c_void, *const u8, usize);
    type LenFn = unsafe extern "C" fn(*const c_void) -> usize;

    #[test]
    fn signature_follows_the_function_type() {
        assert_eq!(
            <PushFn as ForeignFn>::signature(),
            Signature::new(&[NativeType::Pointer, NativeType::Buffer, NativeType::Usize], NativeType::Void)
        );
        assert_eq!(
            <LenFn as ForeignFn>::signature().to_string(),
            "(pointer) -> usize"
        );
    }

    #[test]
    fn null_is_not_an_address() {
        assert!(Address::new(std::ptr::null_mut()).is_none());
        let mut slot = 0u8;
        let addr = Address::new(&mut slot as *mut u8 as *mut c_void).unwrap();
        assert_eq!(addr.addr(), &slot as *const u8 as usize);
    }

    #[test]
    fn kinds_deserialize_lowercase() {
        let sig: Signature = toml::from_str("params = [\"pointer\", \"u32\"]\nresult = \"bool\"").unwrap();
        assert_eq!(sig, Signature::new(&[NativeType::Pointer, NativeType::U32], NativeType::Bool));
    }

    #[test]
    fn foreign_fn_round_trips_an_address() {
        unsafe extern "C" fn twice(value: u32) -> u32 {
            value * 2
        }
        let addr = Address::from_const(twice as *const c_void).unwrap();
        let f = unsafe { <unsafe extern "C" fn(u32) -> u32 as ForeignFn>::from_address(addr) };
        assert_eq!(unsafe { f(21) }, 42);
    }
}
