use std::collections::HashSet;

use crate::{snapshot::Snapshot, token::Token};

fn missing(baseline: &[Token], target: &[Token]) -> Vec<Token> {
    let resident: HashSet<&Token> = baseline.iter().collect();
    target
        .iter()
        .filter(|token| !resident.contains(token))
        .copied()
        .collect()
}

/// Tokens present in a target snapshot but not in its baseline, per category.
///
/// Every list keeps the order of the target snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// New type tokens
    pub types: Vec<Token>,
    /// New method tokens
    pub methods: Vec<Token>,
    /// New tokens of fields with initializer data
    pub fields: Vec<Token>,
    /// New string tokens
    pub strings: Vec<Token>,
    /// New special type tokens
    pub special_types: Vec<Token>,
}

impl SnapshotDiff {
    /// Compute what `target` adds on top of `baseline`
    #[must_use]
    pub fn between(baseline: &Snapshot, target: &Snapshot) -> Self {
        SnapshotDiff {
            types: missing(baseline.types(), target.types()),
            methods: missing(baseline.methods(), target.methods()),
            fields: missing(baseline.fields(), target.fields()),
            strings: missing(baseline.strings(), target.strings()),
            special_types: missing(baseline.special_types(), target.special_types()),
        }
    }

    /// Returns true if nothing needs to be transmitted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.methods.is_empty()
            && self.fields.is_empty()
            && self.strings.is_empty()
            && self.special_types.is_empty()
    }

    /// Bytes needed for the string upload: a trailing 4-byte terminator plus, per string, a
    /// 4-byte token and the encoded text
    #[must_use]
    pub fn string_payload_size(&self) -> usize {
        4 + self
            .strings
            .iter()
            .map(|token| 4 + token.string_length())
            .sum::<usize>()
    }

    /// Returns true if `token` is a new type, method or field token
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.types.contains(&token) || self.methods.contains(&token) || self.fields.contains(&token)
    }
}
