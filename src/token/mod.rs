//! Device tokens and the allocator that hands them out.
//!
//! Every symbol that the embedded execution engine must reference is addressed by a
//! 32-bit token. Tokens live in two disjoint namespaces:
//!
//! - **Symbol tokens** (types, methods, fields, special types) share a small ascending
//!   counter. Generic type definitions are spaced [`GENERIC_TOKEN_STEP`] apart so that a
//!   definition token plus a plain argument token yields the token of the closed type.
//! - **String tokens** advance by [`STRING_TOKEN_STEP`]; their low 16 bits carry the encoded
//!   byte length of the string.
//!
//! # Key Components
//!
//! - [`Token`] - The raw 32-bit identifier
//! - [`TypeToken`] - Explicit shape of a type token before it is flattened to wire form
//! - [`TokenAllocator`] - Idempotent token assignment and reverse lookup
//! - [`SpecialTypeList`] - Side table for generic instantiations that cannot be composed
//! - [`StringTable`] - Deduplicated UTF-8 string constants

mod allocator;
mod shape;
mod special;
mod strings;

use std::fmt;

pub use allocator::{FieldEntry, NoRedirect, TokenAllocator, TypeRedirect};
pub use shape::TypeToken;
pub use special::{SpecialTypeGroup, SpecialTypeList};
pub use strings::{StringEntry, StringTable};

/// Distance between two generic definition tokens
pub const GENERIC_TOKEN_STEP: u32 = 0x0100_0000;
/// First token handed out to a dynamically registered generic definition
pub const FIRST_GENERIC_TOKEN: u32 = GENERIC_TOKEN_STEP * 4;
/// Bit added to the token of `T` to form the token of `Nullable<T>`
pub const NULLABLE_TOKEN: u32 = 0x0080_0000;
/// Marker for tokens that are described by a [`SpecialTypeGroup`]
pub const SPECIAL_TOKEN_MARKER: u32 = 0xFF00_0000;
/// Distance between two string tokens, the low bits hold the byte length
pub const STRING_TOKEN_STEP: u32 = 0x0001_0000;

/// A token addressing a symbol on the target device.
///
/// ```text
///  31      24 23 22                     0
/// +----------+--+------------------------+
/// | generic  |N | ordinary counter       |
/// +----------+--+------------------------+
/// ```
///
/// The high byte is the generic definition part (`0xFF` marks a special type), `N` is the
/// `Nullable<T>` bit. String tokens use their own layout, see [`STRING_TOKEN_STEP`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// The null token, used where no startup method exists
    pub const NULL: Token = Token(0);

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the generic definition part of the token (high byte)
    #[must_use]
    pub fn tag(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the argument part of the token (low 24 bits)
    #[must_use]
    pub fn index(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns the token with only its generic definition part kept
    #[must_use]
    pub fn definition_part(&self) -> Token {
        Token(self.0 & 0xFF00_0000)
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the token refers to an entry of the special type list
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.0 & SPECIAL_TOKEN_MARKER == SPECIAL_TOKEN_MARKER
    }

    /// Returns true if the nullable bit is set
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        !self.is_special() && self.0 & NULLABLE_TOKEN != 0
    }

    /// Byte length encoded in a string token
    #[must_use]
    pub fn string_length(&self) -> usize {
        (self.0 & (STRING_TOKEN_STEP - 1)) as usize
    }

    /// Adds an argument token to a definition token, as done for `D<T>` and `Nullable<T>`
    #[must_use]
    pub fn compose(self, argument: Token) -> Token {
        Token(self.0.wrapping_add(argument.0))
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_special() {
            write!(f, "Token(special {})", self.0 & !SPECIAL_TOKEN_MARKER)
        } else if self.tag() != 0 {
            write!(f, "Token(0x{:02x} + {})", self.tag(), self.index())
        } else {
            write!(f, "Token({})", self.0)
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
