//! Findings of a build session that do not abort it.
//!
//! A replacement class declaring a method that replaces nothing, a token that splits into a
//! generic type which cannot be constructed, or a suppression rule that covers no registered
//! type are reported here. The build continues; the frontend decides what to do with them
//! once linking is done.
//!
//! Entries are appended through `&self` (backed by `boxcar::Vec`), so the catalog and the
//! resolver share one [`Diagnostics`] behind an `Arc`.
//!
//! # Examples
//!
//! ```rust
//! use mculink::diagnostics::{DiagnosticCategory, DiagnosticSeverity, Diagnostics};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.report(
//!     DiagnosticSeverity::Warning,
//!     DiagnosticCategory::Replacement,
//!     "MiniString.Wipe() has no counterpart in System.String",
//! );
//!
//! assert_eq!(diagnostics.worst(), Some(DiagnosticSeverity::Warning));
//! println!("{diagnostics}");
//! ```

use std::fmt;

use strum::Display;

use crate::token::Token;

/// How serious a finding is. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Worth knowing, nothing is wrong
    Info,
    /// The image is usable but probably not what was intended
    Warning,
    /// A symbol of the image is unusable
    Error,
}

/// The part of the linker a finding comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DiagnosticCategory {
    /// Token allocation and reverse lookup
    Token,
    /// Class and method replacement
    Replacement,
    /// Declarations and suppression rules of the catalog
    Catalog,
}

/// One finding, optionally tied to a token or a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How serious it is
    pub severity: DiagnosticSeverity,
    /// Where it comes from
    pub category: DiagnosticCategory,
    /// What happened
    pub message: String,
    /// The token involved
    pub token: Option<Token>,
    /// The symbol involved, rendered for display
    pub symbol: Option<String>,
}

impl Diagnostic {
    /// A finding without token or symbol
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity,
            category,
            message: message.into(),
            token: None,
            symbol: None,
        }
    }

    /// Attach the token the finding is about
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Attach the symbol the finding is about
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl fmt::Display) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.severity, self.category)?;
        if let Some(symbol) = &self.symbol {
            write!(f, " {symbol}")?;
        }
        if let Some(token) = self.token {
            write!(f, " @ {token}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Append-only collection of [`Diagnostic`] entries, shareable across threads.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// An empty collection
    #[must_use]
    pub fn new() -> Self {
        Diagnostics {
            entries: boxcar::Vec::new(),
        }
    }

    /// Append a finding that carries no token or symbol
    pub fn report(
        &self,
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic::new(severity, category, message));
    }

    /// Append `diagnostic`
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Number of findings
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Returns true if nothing was reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All findings in the order they were reported
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, entry)| entry)
    }

    /// Findings from `category`
    #[must_use]
    pub fn in_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Number of findings with exactly `severity`
    #[must_use]
    pub fn count(&self, severity: DiagnosticSeverity) -> usize {
        self.iter().filter(|d| d.severity == severity).count()
    }

    /// The most severe finding so far
    #[must_use]
    pub fn worst(&self) -> Option<DiagnosticSeverity> {
        self.iter().map(|d| d.severity).max()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} findings ({} errors, {} warnings)",
            self.len(),
            self.count(DiagnosticSeverity::Error),
            self.count(DiagnosticSeverity::Warning)
        )?;
        for entry in self.iter() {
            writeln!(f, "  {entry}")?;
        }
        Ok(())
    }
}
