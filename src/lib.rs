// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # mculink
//!
//! The linking core of a cross-compiler that runs managed (CIL) programs on microcontrollers.
//! A frontend walks the program and registers every class, method, field and string it needs;
//! `mculink` assigns each of them a compact 32-bit token, redirects standard library symbols
//! to their embedded replacements, and uploads only what the device does not already hold.
//!
//! ## Features
//!
//! - **Compact token algebra** - Closed generic types with one plain argument are addressed by
//!   adding two tokens, everything else falls back to a side table of special type groups
//! - **Replacement resolution** - Standard classes are swapped for embedded-native substitutes,
//!   with subclass propagation, operator matching and a not-supported sentinel
//! - **Incremental uploads** - A flashed kernel image is shared by many programs, each program
//!   upload transmits the difference only
//! - **Capacity planning** - Static estimate of the device memory a build occupies
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use mculink::prelude::*;
//!
//! let registry = MetadataRegistry::new();
//! registry.insert(
//!     TypeDescriptor::new(TypeName::new("App", "Program"))
//!         .with_method(
//!             "Main",
//!             vec![],
//!             TypeSig::Void,
//!             MethodAttributes::PUBLIC | MethodAttributes::STATIC,
//!         ),
//! );
//!
//! let mut catalog = Catalog::new(LinkerSettings::ram_only(), Arc::new(registry));
//! let program = TypeSig::named("App", "Program");
//! let main = MethodSig::new(program.clone(), "Main", vec![], TypeSig::Void);
//!
//! let class_token = catalog.type_token(&program)?;
//! catalog.register_class(ClassDeclaration::new(program, class_token))?;
//!
//! let method_token = catalog.method_token(&main, None)?;
//! let declaration = MethodDeclaration::new(main.clone(), method_token).with_code(vec![0x2A]);
//! catalog.register_method(declaration)?;
//! catalog.register_string("Hello")?;
//! catalog.set_entry_point(main);
//!
//! let diff = Snapshot::empty().diff_to(&catalog.snapshot());
//! assert_eq!(diff.methods, vec![method_token]);
//! # Ok::<(), mculink::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`symbols`] - Structural symbol model and the metadata registry supplied by the frontend
//! - [`token`] - Token allocation, special type groups and the string table
//! - [`replacement`] - Replacement policy and resolution
//! - [`catalog`] - The build session tying allocation, replacement and declarations together
//! - [`snapshot`] - Token snapshots and their differences
//! - [`loader`] - Upload sequencing over a [`loader::DeviceChannel`]
//! - [`estimate`] - Memory usage estimate
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`] with [`Error`]. Configuration problems, such as
//! a missing replacement, surface while symbols are registered and never after the upload has
//! started. Failures of the device are passed through as [`Error::Device`].
//!
//! Anomalies that do not abort a build are collected as [`diagnostics::Diagnostic`] entries in
//! the catalog, and every phase is traced through the [`log`] facade.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use mculink::prelude::*;
///
/// let settings = LinkerSettings::kernel();
/// assert!(settings.copy_to_flash(true));
/// ```
pub mod prelude;

/// Build and upload settings
pub mod config;

/// Non-fatal findings collected during a build
pub mod diagnostics;

/// Structural symbol model and metadata registry
///
/// Types, methods and fields are identified by structure. The [`symbols::MetadataRegistry`]
/// answers inheritance and member queries that the replacement resolver needs.
pub mod symbols;

/// Device tokens and their allocation
pub mod token;

/// Replacement of standard symbols by embedded substitutes
pub mod replacement;

/// The build session
pub mod catalog;

/// Token snapshots and differences
pub mod snapshot;

/// Upload sequencing
///
/// # Examples
///
/// ```rust,ignore
/// use mculink::loader::Loader;
///
/// let task = Loader::new(&catalog, &mut channel).load(true)?;
/// ```
pub mod loader;

/// Memory usage estimate
pub mod estimate;

/// `mculink` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `mculink` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust
/// use mculink::Error;
///
/// let err = Error::TooManyMethods(16383);
/// assert_eq!(err.to_string(), "Too many methods declared, only 16383 supported");
/// ```
pub use error::Error;

pub use catalog::Catalog;
pub use config::LinkerSettings;
