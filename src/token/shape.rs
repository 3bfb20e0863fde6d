//! Explicit shape of a type token.
//!
//! On the wire a type token is a bare `u32` whose meaning depends on its bit pattern. Inside
//! the linker the shape is kept explicit, so nothing ever needs to guess whether a value is a
//! plain counter token, a `definition + argument` sum or a special-type reference.

use crate::token::Token;

/// How a type token was formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeToken {
    /// Reserved or counter-allocated token
    Simple(Token),
    /// A generic definition applied to arguments
    Composed {
        /// Token of the generic definition (`Nullable<>` uses the nullable bit)
        definition: Token,
        /// Wire tokens of the type arguments
        arguments: Vec<Token>,
        /// Special-type token when the instantiation is described by a side-table group
        special: Option<Token>,
    },
}

impl TypeToken {
    /// Single-argument composition that is expressed as a sum on the wire
    #[must_use]
    pub fn summed(definition: Token, argument: Token) -> Self {
        TypeToken::Composed {
            definition,
            arguments: vec![argument],
            special: None,
        }
    }

    /// Token value as transmitted to the device
    #[must_use]
    pub fn wire(&self) -> Token {
        match self {
            TypeToken::Simple(token) => *token,
            TypeToken::Composed {
                special: Some(token),
                ..
            } => *token,
            TypeToken::Composed {
                definition,
                arguments,
                special: None,
            } => arguments
                .first()
                .map_or(*definition, |argument| definition.compose(*argument)),
        }
    }

    /// Returns true if the token is backed by a special-type group
    #[must_use]
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            TypeToken::Composed {
                special: Some(_),
                ..
            }
        )
    }
}
