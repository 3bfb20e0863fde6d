//! Special type list.
//!
//! Generic instantiations with several arguments, or with an argument that is generic
//! itself, cannot be composed by a single addition. Each of them gets a token marked with
//! [`SPECIAL_TOKEN_MARKER`](crate::token::SPECIAL_TOKEN_MARKER) and a group in this list
//! that spells out the composition.
//!
//! # Wire Layout
//!
//! Groups are flattened back to back. Every group is self-describing:
//!
//! ```text
//! +-------------+---------------+--------------------+------------+-----+
//! | len = n + 3 | special token | definition token   | argument 0 | ... |
//! +-------------+---------------+--------------------+------------+-----+
//! ```
//!
//! The length value counts its own slot, so a reader can skip unknown groups.

use crate::{symbols::TypeSig, token::Token};

/// One special-type group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialTypeGroup {
    /// The special token assigned to the instantiation
    pub token: Token,
    /// The instantiated type (debug only, never transmitted)
    pub owner: TypeSig,
    /// Token of the generic definition
    pub definition: Token,
    /// Wire tokens of every type argument, in order
    pub arguments: Vec<Token>,
}

impl SpecialTypeGroup {
    /// Number of `u32` slots this group occupies on the wire
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len() + 3
    }

    /// Always false, a group has at least its three header slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The group in wire layout
    #[must_use]
    pub fn to_wire(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.len());
        out.push(self.len() as u32);
        out.push(self.token.value());
        out.push(self.definition.value());
        out.extend(self.arguments.iter().map(Token::value));
        out
    }
}

/// Ordered collection of special-type groups.
///
/// Groups of nested instantiations are appended before the group that uses them.
#[derive(Debug, Clone, Default)]
pub struct SpecialTypeList {
    groups: Vec<SpecialTypeGroup>,
}

impl SpecialTypeList {
    /// Create an empty list
    #[must_use]
    pub fn new() -> Self {
        SpecialTypeList { groups: Vec::new() }
    }

    /// Append a group
    pub fn push(&mut self, group: SpecialTypeGroup) {
        self.groups.push(group);
    }

    /// Number of groups
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if no group was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All groups in insertion order
    #[must_use]
    pub fn groups(&self) -> &[SpecialTypeGroup] {
        &self.groups
    }

    /// Find the group describing `token`
    #[must_use]
    pub fn get(&self, token: Token) -> Option<&SpecialTypeGroup> {
        self.groups.iter().find(|group| group.token == token)
    }

    /// Special tokens in insertion order
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        self.groups.iter().map(|group| group.token).collect()
    }

    /// The complete list in wire layout
    #[must_use]
    pub fn to_wire(&self) -> Vec<u32> {
        self.groups.iter().flat_map(SpecialTypeGroup::to_wire).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(token: u32, arguments: Vec<u32>) -> SpecialTypeGroup {
        SpecialTypeGroup {
            token: Token(token),
            owner: TypeSig::named("Test", "Owner"),
            definition: Token(0x0400_0000),
            arguments: arguments.into_iter().map(Token).collect(),
        }
    }

    #[test]
    fn test_group_wire_layout() {
        let g = group(0xFF00_0030, vec![11, 0x0500_0003]);
        assert_eq!(g.len(), 5);
        assert_eq!(g.to_wire(), vec![5, 0xFF00_0030, 0x0400_0000, 11, 0x0500_0003]);
    }

    #[test]
    fn test_list_flattens_in_order() {
        let mut list = SpecialTypeList::new();
        list.push(group(0xFF00_0030, vec![3]));
        list.push(group(0xFF00_0031, vec![3, 11]));

        assert_eq!(list.len(), 2);
        assert_eq!(list.tokens(), vec![Token(0xFF00_0030), Token(0xFF00_0031)]);
        assert_eq!(list.to_wire().len(), 4 + 5);
        assert_eq!(list.get(Token(0xFF00_0031)).map(SpecialTypeGroup::len), Some(5));
        assert!(list.get(Token(0xFF00_0032)).is_none());
    }
}
