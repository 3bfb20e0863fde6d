//! String constant table.
//!
//! Strings are stored UTF-8 encoded and deduplicated by their encoded bytes. Each string
//! token is `counter + byte_length`, with the counter advancing by
//! [`STRING_TOKEN_STEP`](crate::token::STRING_TOKEN_STEP), so the device can skip strings
//! it does not know without a separate length table.

use std::collections::HashMap;

use crate::{
    token::{Token, STRING_TOKEN_STEP},
    Error, Result,
};

/// A deduplicated string constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEntry {
    /// The string token, its low 16 bits are the byte length
    pub token: Token,
    /// UTF-8 encoded content as transmitted
    pub encoded: Vec<u8>,
    /// The text it was first registered with (debug only)
    pub text: String,
}

/// Deduplicating string table with its own token namespace.
#[derive(Debug, Clone)]
pub struct StringTable {
    entries: Vec<StringEntry>,
    by_content: HashMap<Vec<u8>, Token>,
    next: u32,
}

impl StringTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        StringTable {
            entries: Vec::new(),
            by_content: HashMap::new(),
            next: STRING_TOKEN_STEP,
        }
    }

    /// Return the token of `text`, registering it on first use.
    ///
    /// # Errors
    /// Returns [`Error::StringTooLong`] if the encoded text does not fit the length field,
    /// or [`Error::TokenSpaceExhausted`] once the string counter overflows.
    pub fn get_or_add(&mut self, text: &str) -> Result<Token> {
        let encoded = text.as_bytes();
        if let Some(token) = self.by_content.get(encoded) {
            return Ok(*token);
        }

        if encoded.len() >= STRING_TOKEN_STEP as usize {
            return Err(Error::StringTooLong(encoded.len()));
        }

        let token = Token(self.next + encoded.len() as u32);
        self.next = self
            .next
            .checked_add(STRING_TOKEN_STEP)
            .ok_or(Error::TokenSpaceExhausted("strings"))?;

        self.by_content.insert(encoded.to_vec(), token);
        self.entries.push(StringEntry {
            token,
            encoded: encoded.to_vec(),
            text: text.to_string(),
        });
        Ok(token)
    }

    /// Look up an entry by token
    #[must_use]
    pub fn get(&self, token: Token) -> Option<&StringEntry> {
        let offset = (token.value() / STRING_TOKEN_STEP).checked_sub(1)?;
        self.entries
            .get(offset as usize)
            .filter(|entry| entry.token == token)
    }

    /// All entries in registration order
    #[must_use]
    pub fn entries(&self) -> &[StringEntry] {
        &self.entries
    }

    /// Tokens in registration order
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        self.entries.iter().map(|entry| entry.token).collect()
    }

    /// Number of distinct strings
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no string was registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}
