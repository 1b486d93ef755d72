use std::fmt;

use crate::abi::{NativeRepr, NativeReturn, NativeType};

/// A Unicode scalar value crossing the boundary as its 32-bit code.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RustChar(u32);

impl RustChar {
    pub fn new(value: char) -> Self {
        Self(value as u32)
    }

    /// The first scalar of `text`, if any.
    pub fn from_first_char(text: &str) -> Option<Self> {
        text.chars().next().map(Self::new)
    }

    pub fn code(self) -> u32 {
        self.0
    }

    /// `None` if the native side returned a code that is not a scalar value.
    pub fn into_char(self) -> Option<char> {
        char::from_u32(self.0)
    }
}

impl From<char> for RustChar {
    fn from(value: char) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for RustChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.into_char() {
            Some(c) => write!(f, "{c}"),
            None => write!(f, "\\u{{{:x}}}", self.0),
        }
    }
}

impl NativeRepr for RustChar {
    const KIND: NativeType = NativeType::U32;
}

impl NativeReturn for RustChar {
    const KIND: NativeType = NativeType::U32;
}
