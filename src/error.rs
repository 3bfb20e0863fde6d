use thiserror::Error;

use crate::token::Token;

macro_rules! config_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Configuration {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Configuration {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every variant except [`Error::Device`] describes a build configuration or programming
/// problem. Those are raised while symbols are registered, before any device I/O happens,
/// and are never retried.
///
/// # Error Categories
///
/// ## Replacement Errors
/// - [`Error::MissingReplacement`] - A replaced type lacks a method and offers no sentinel
/// - [`Error::ReplacedSymbolRegistered`] - A symbol that should have been replaced was added
/// - [`Error::ReplacementNotImplemented`] - A known-missing method was added directly
/// - [`Error::PolicyFinalized`] - The replacement policy no longer accepts registrations
///
/// ## Capacity Errors
/// - [`Error::TooManyMethods`] - The method table is full
/// - [`Error::TooManyLocals`] - A method uses too many local slots
/// - [`Error::StackTooDeep`] - A method needs too much evaluation stack
/// - [`Error::TokenSpaceExhausted`] - A token counter ran out of values
/// - [`Error::StringTooLong`] - A string constant does not fit the string token length field
///
/// ## Identity Errors
/// - [`Error::IdentityCollision`] - One token would name two different symbols
/// - [`Error::SettingsMismatch`] - A session was forked with different settings
/// - [`Error::TypeConstruction`] - A generic instantiation is malformed
/// - [`Error::UnknownType`] - A type is missing from the metadata registry
///
/// # Examples
///
/// ```rust
/// use mculink::Error;
///
/// fn report(err: &Error) {
///     match err {
///         Error::MissingReplacement { method, caller } => {
///             eprintln!("no replacement for {method} (called from {caller})");
///         }
///         Error::Device(message) => eprintln!("upload failed: {message}"),
///         other => eprintln!("build failed: {other}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The declaring type of a method is replaced, but the replacement neither provides a
    /// matching method nor the `NotSupportedException` sentinel.
    #[error("Expected replacement not found for {method}, caller: {caller}")]
    MissingReplacement {
        /// The method that could not be resolved
        method: String,
        /// The method calling it
        caller: String,
    },

    /// A symbol that has a registered replacement was added to the catalog directly.
    ///
    /// The frontend must ask for the token first, which redirects to the replacement.
    #[error("{0} should have been replaced by its replacement")]
    ReplacedSymbolRegistered(String),

    /// A method that the replacement class left unimplemented was added directly.
    #[error("{0} should be replaced, but has no new implementation")]
    ReplacementNotImplemented(String),

    /// The replacement policy was finalized and rejects further registrations.
    #[error("The replacement policy is finalized")]
    PolicyFinalized,

    /// More methods than the method table of the execution engine can hold.
    #[error("Too many methods declared, only {0} supported")]
    TooManyMethods(usize),

    /// A method uses more local variable slots than supported.
    #[error("Method {method} uses {count} local variables, at most 255 are supported")]
    TooManyLocals {
        /// The offending method
        method: String,
        /// Number of locals it declares
        count: u16,
    },

    /// A method needs a deeper evaluation stack than supported.
    #[error("Method {method} needs a stack of {depth}, at most 255 is supported")]
    StackTooDeep {
        /// The offending method
        method: String,
        /// The maximum stack depth it declares
        depth: u16,
    },

    /// A token counter ran out of values.
    ///
    /// The associated value names the exhausted namespace.
    #[error("Token space exhausted - {0}")]
    TokenSpaceExhausted(&'static str),

    /// A string constant is longer than the length field of a string token can express.
    #[error("String constant of {0} bytes is too long")]
    StringTooLong(usize),

    /// A token would refer to two different symbols.
    #[error("Token {token} already names {existing}, cannot assign it to {incoming}")]
    IdentityCollision {
        /// The contested token
        token: Token,
        /// The symbol already owning it
        existing: String,
        /// The symbol trying to claim it
        incoming: String,
    },

    /// A build session was forked with settings that differ from the original.
    #[error("Target settings must be equal to the existing ones")]
    SettingsMismatch,

    /// A generic type could not be constructed from its definition and arguments.
    #[error("{0}")]
    TypeConstruction(String),

    /// A type required for a registration is missing from the metadata registry.
    #[error("Type {0} is not registered")]
    UnknownType(String),

    /// The program has no entry point to start.
    #[error("Main entry point not defined")]
    NoEntryPoint,

    /// Recursion limit reached.
    ///
    /// Replacement chains are followed up to a fixed depth to guard against cycles.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// The build configuration is inconsistent.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the problem
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Configuration - {file}:{line}: {message}")]
    Configuration {
        /// The message to be printed for the Configuration error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The device channel failed. Its details are opaque to the linker.
    #[error("{0}")]
    Device(String),
}
