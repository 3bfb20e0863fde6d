//! Built-in types with reserved tokens.
//!
//! The execution engine implements a handful of core types natively and expects them at
//! fixed tokens. These are checked before any dynamic allocation happens.

use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::{
    symbols::{TypeName, TypeSig},
    token::{Token, GENERIC_TOKEN_STEP},
};

/// Largest token value that is reserved for built-in non-generic types
pub const LARGEST_KNOWN_TYPE_TOKEN: u32 = 40;

/// Built-in types understood natively by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum KnownType {
    /// `System.Object`
    Object,
    /// `System.UInt32`
    UInt32,
    /// `System.Int32`
    Int32,
    /// `System.UInt64`
    UInt64,
    /// `System.Int64`
    Int64,
    /// `System.Byte`
    Byte,
    /// `System.Delegate`
    Delegate,
    /// `System.MulticastDelegate`
    MulticastDelegate,
    /// `System.Enum` (the class, not an enum value type)
    Enum,
    /// `System.Reflection.TypeInfo`
    TypeInfo,
    /// `System.String`
    String,
    /// `System.RuntimeType`
    RuntimeType,
    /// `System.Type`
    Type,
    /// `System.Array`
    Array,
    /// `System.ByReference<byte>`
    ByReferenceByte,
    /// `System.Collections.Generic.IEnumerable<>`
    IEnumerableOfT,
    /// `System.Span<>`
    SpanOfT,
}

impl KnownType {
    /// The reserved token of this type
    #[must_use]
    pub fn token(self) -> Token {
        Token(match self {
            KnownType::Object => 1,
            KnownType::UInt32 => 2,
            KnownType::Int32 => 3,
            KnownType::UInt64 => 4,
            KnownType::Int64 => 5,
            KnownType::Byte => 6,
            KnownType::Delegate => 7,
            KnownType::MulticastDelegate => 8,
            KnownType::Enum => 9,
            KnownType::TypeInfo => 10,
            KnownType::String => 11,
            KnownType::RuntimeType => 12,
            KnownType::Type => 13,
            KnownType::Array => 14,
            KnownType::ByReferenceByte => 15,
            KnownType::IEnumerableOfT => GENERIC_TOKEN_STEP,
            KnownType::SpanOfT => GENERIC_TOKEN_STEP * 2,
        })
    }

    /// The type this entry stands for
    #[must_use]
    pub fn type_sig(self) -> TypeSig {
        match self {
            KnownType::Object => TypeSig::named("System", "Object"),
            KnownType::UInt32 => TypeSig::named("System", "UInt32"),
            KnownType::Int32 => TypeSig::named("System", "Int32"),
            KnownType::UInt64 => TypeSig::named("System", "UInt64"),
            KnownType::Int64 => TypeSig::named("System", "Int64"),
            KnownType::Byte => TypeSig::named("System", "Byte"),
            KnownType::Delegate => TypeSig::named("System", "Delegate"),
            KnownType::MulticastDelegate => TypeSig::named("System", "MulticastDelegate"),
            KnownType::Enum => TypeSig::named("System", "Enum"),
            KnownType::TypeInfo => TypeSig::named("System.Reflection", "TypeInfo"),
            KnownType::String => TypeSig::named("System", "String"),
            KnownType::RuntimeType => TypeSig::named("System", "RuntimeType"),
            KnownType::Type => TypeSig::named("System", "Type"),
            KnownType::Array => TypeSig::named("System", "Array"),
            KnownType::ByReferenceByte => TypeSig::Generic {
                definition: TypeName::generic("System", "ByReference`1", 1),
                args: vec![TypeSig::named("System", "Byte")],
            },
            KnownType::IEnumerableOfT => {
                TypeSig::definition("System.Collections.Generic", "IEnumerable`1", 1)
            }
            KnownType::SpanOfT => TypeSig::definition("System", "Span`1", 1),
        }
    }

    /// Look up the built-in entry for `ty`, if it is one
    #[must_use]
    pub fn of(ty: &TypeSig) -> Option<KnownType> {
        KnownType::iter().find(|known| known.type_sig() == *ty)
    }

    /// Look up the built-in entry owning `token`, if any
    #[must_use]
    pub fn from_token(token: Token) -> Option<KnownType> {
        KnownType::iter().find(|known| known.token() == token)
    }
}

/// Returns true if `ty` is `System.Nullable<T>` or its open definition
#[must_use]
pub fn is_nullable(ty: &TypeSig) -> bool {
    ty.is("System", "Nullable`1")
}
