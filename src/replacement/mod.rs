//! Replacement of standard symbols by embedded-native substitutes.
//!
//! The standard library of the host cannot run on the target as is. Replacement classes
//! provide compatible implementations for the parts that are needed, and everything the
//! program calls on a replaced type is redirected to them while tokens are assigned.
//!
//! The declared rules live in a [`ReplacementPolicy`]; the [`ReplacementResolver`] derives
//! method mappings from them, adds rules for subclasses on first encounter and answers
//! resolution queries.
//!
//! # Key Components
//!
//! - [`ReplacementPolicy`] - Declared class and method replacements and suppressions
//! - [`ReplacementResolver`] - Method mappings and resolution with sentinel fallback
//! - [`OperatorKind`] - Operator identity used to match `op_` methods

mod matching;
mod policy;
mod resolver;

pub use matching::OperatorKind;
pub use policy::{ClassReplacement, MethodReplacement, ReplacementPolicy};
pub use resolver::{MethodMapping, ReplacementResolver, NOT_SUPPORTED_SENTINEL};
