//! Symbol model shared by every linking stage.
//!
//! Symbols are described structurally by the frontend, so lookups never depend on object
//! identity of decoded metadata. The [`MetadataRegistry`] carries the type universe needed
//! to answer inheritance and member queries.
//!
//! # Key Components
//!
//! - [`TypeName`], [`TypeSig`] - Type definitions and type references
//! - [`MethodSig`], [`FieldSig`] - Canonical method and field keys
//! - [`Symbol`] - Any of the above, as returned by reverse token lookup
//! - [`MetadataRegistry`] - Type descriptors registered by the frontend
//! - [`KnownType`] - Built-in types with reserved tokens
//! - [`SymbolHash`] - Stable identity hash used by snapshot fingerprints

mod hash;
mod known;
mod registry;
mod signature;

use std::fmt;

pub use hash::SymbolHash;
pub use known::{is_nullable, KnownType, LARGEST_KNOWN_TYPE_TOKEN};
pub use registry::{
    FieldDescriptor, MetadataRegistry, MethodAttributes, MethodDescriptor, TypeDescriptor,
};
pub use signature::{FieldSig, MethodSig, TypeName, TypeSig};

/// A symbol that owns a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A type
    Type(TypeSig),
    /// A method
    Method(MethodSig),
    /// A field
    Field(FieldSig),
}

impl Symbol {
    /// Stable 32-bit identity of the symbol, standing in for its source metadata token
    #[must_use]
    pub fn identity(&self) -> u32 {
        match self {
            Symbol::Type(ty) => SymbolHash::new().add_type(ty).finalize_u32(),
            Symbol::Method(method) => SymbolHash::new().add_method(method).finalize_u32(),
            Symbol::Field(field) => SymbolHash::new().add_field(field).finalize_u32(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Type(ty) => write!(f, "type {ty}"),
            Symbol::Method(method) => write!(f, "method {method}"),
            Symbol::Field(field) => write!(f, "field {field}"),
        }
    }
}
