//! # mculink Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the mculink library. Import this module to get quick access to everything a frontend
//! needs to drive a build and upload it.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all mculink operations
pub use crate::Error;

/// The result type used throughout mculink
pub use crate::Result;

/// Settings of a build session
pub use crate::config::LinkerSettings;

// ================================================================================================
// Symbols
// ================================================================================================

/// Structural symbol keys
pub use crate::symbols::{FieldSig, MethodSig, Symbol, TypeName, TypeSig};

/// Metadata supplied by the frontend
pub use crate::symbols::{
    FieldDescriptor, MetadataRegistry, MethodAttributes, MethodDescriptor, TypeDescriptor,
};

// ================================================================================================
// Tokens
// ================================================================================================

/// Token types
pub use crate::token::{Token, TokenAllocator, TypeToken};

// ================================================================================================
// Build Session
// ================================================================================================

/// The catalog and its declarations
pub use crate::catalog::{
    Catalog, ClassDeclaration, ClassMember, MemberKind, MethodDeclaration, MethodFlags,
};

/// Replacement rules
pub use crate::replacement::{ClassReplacement, ReplacementPolicy};

/// Diagnostics
pub use crate::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};

// ================================================================================================
// Upload
// ================================================================================================

/// Snapshots
pub use crate::snapshot::{Snapshot, SnapshotDiff};

/// Loader and device channel
pub use crate::loader::{DeviceChannel, LoadState, Loader, StartupFlags};

/// Memory estimate
pub use crate::estimate::{ClassStatistics, MemoryEstimate};
