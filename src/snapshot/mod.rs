//! Point-in-time records of the tokens resident on a target.
//!
//! A [`Snapshot`] lists every token a build has assigned, per category. The kernel snapshot
//! describes what is flashed once and shared by many programs; a program snapshot describes
//! a complete build. The [`SnapshotDiff`] between the two is exactly what a program upload
//! has to transmit.
//!
//! # Equality and Fingerprints
//!
//! Two snapshots are equal when each category holds the same set of tokens, regardless of
//! order. [`Snapshot::fingerprint`] condenses a snapshot into 32 bits for the device-side
//! "is this image already loaded" check: the number of assigned tokens, an XOR fold over
//! assigned and string tokens, and the identity of the symbol behind the last assigned token.

mod diff;

use std::collections::HashSet;

use crate::token::Token;

pub use diff::SnapshotDiff;

fn xor(tokens: &[Token]) -> u32 {
    tokens.iter().fold(0, |acc, token| acc ^ token.value())
}

fn same_set(a: &[Token], b: &[Token]) -> bool {
    let a: HashSet<_> = a.iter().collect();
    let b: HashSet<_> = b.iter().collect();
    a == b
}

/// Immutable record of the tokens of a build.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    types: Vec<Token>,
    methods: Vec<Token>,
    fields: Vec<Token>,
    strings: Vec<Token>,
    special_types: Vec<Token>,
    origin: Option<u32>,
}

impl Snapshot {
    /// The snapshot of an erased target
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot from its token lists.
    ///
    /// `origin` is the identity of the symbol behind the last assigned token, see
    /// [`Snapshot::assigned`].
    #[must_use]
    pub fn new(
        types: Vec<Token>,
        methods: Vec<Token>,
        fields: Vec<Token>,
        strings: Vec<Token>,
        special_types: Vec<Token>,
        origin: Option<u32>,
    ) -> Self {
        Snapshot {
            types,
            methods,
            fields,
            strings,
            special_types,
            origin,
        }
    }

    /// Type tokens, in allocation order
    #[must_use]
    pub fn types(&self) -> &[Token] {
        &self.types
    }

    /// Tokens of declared methods, in declaration order
    #[must_use]
    pub fn methods(&self) -> &[Token] {
        &self.methods
    }

    /// Tokens of fields with initializer data
    #[must_use]
    pub fn fields(&self) -> &[Token] {
        &self.fields
    }

    /// String tokens
    #[must_use]
    pub fn strings(&self) -> &[Token] {
        &self.strings
    }

    /// Special type tokens, one per group
    #[must_use]
    pub fn special_types(&self) -> &[Token] {
        &self.special_types
    }

    /// All assigned symbol tokens: methods, then fields, then types
    pub fn assigned(&self) -> impl Iterator<Item = Token> + '_ {
        self.methods
            .iter()
            .chain(&self.fields)
            .chain(&self.types)
            .copied()
    }

    /// The last assigned symbol token
    #[must_use]
    pub fn last_assigned(&self) -> Option<Token> {
        self.types
            .last()
            .or_else(|| self.fields.last())
            .or_else(|| self.methods.last())
            .copied()
    }

    /// Returns true if no token at all is recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.methods.is_empty()
            && self.fields.is_empty()
            && self.strings.is_empty()
            && self.special_types.is_empty()
    }

    /// Order-independent 32-bit fingerprint
    #[must_use]
    pub fn fingerprint(&self) -> u32 {
        let assigned: Vec<Token> = self.assigned().collect();

        // Truncation is fine, this only feeds the hash
        #[allow(clippy::cast_possible_truncation)]
        let mut hash = assigned.len() as u32;
        hash ^= xor(&assigned);
        hash ^= xor(&self.strings);
        if !assigned.is_empty() {
            hash ^= self.origin.unwrap_or(0);
        }
        hash
    }

    /// The tokens of `target` that are not in this snapshot
    #[must_use]
    pub fn diff_to(&self, target: &Snapshot) -> SnapshotDiff {
        SnapshotDiff::between(self, target)
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        same_set(&self.types, &other.types)
            && same_set(&self.methods, &other.methods)
            && same_set(&self.fields, &other.fields)
            && same_set(&self.strings, &other.strings)
            && same_set(&self.special_types, &other.special_types)
    }
}

impl Eq for Snapshot {}
