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
#![warn(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # tlbscope
//!
//! Projection of managed type graphs onto COM type libraries.
//!
//! `tlbscope` computes everything needed to author a binary COM type library from the
//! reflected metadata of an assembly: variant type tags and nested type descriptors for every
//! signature element, dispatch IDs for every interface member, implemented-interface lists
//! with default and source flags, and the identities of types referenced across libraries.
//! Serializing the result into the binary container is left to the platform's native type
//! library authoring service.
//!
//! ## Features
//!
//! - **Type-descriptor projection** - Per-context defaults, marshalling-hint override tables
//!   and safe-array sub-type rules as a pure, table-driven function
//! - **Dispatch ID allocation** - Generated ID ranges per interface ABI, explicit IDs,
//!   enumerator and default-member conventions, duplicate recovery
//! - **Identity resolution** - Cached type and library identities with on-demand loading
//!   of foreign libraries
//! - **Name resolution** - Preferred casings from lists or names files, plus alias annotations
//!
//! ## Quick Start
//!
//! ```rust
//! use tlbscope::prelude::*;
//!
//! let string = TypeBuilder::well_known(TypeFlavor::String).unwrap().build();
//! let mut resolver = TypeInfoResolver::new(Box::new(NoLibraries), &ConverterSettings::default());
//! let diagnostics = Diagnostics::new();
//!
//! let mut projector = TypeProjector::new(&mut resolver, &diagnostics);
//! let method = projector.project(&string, None, ProjectionContext::Method)?;
//! let field = projector.project(&string, None, ProjectionContext::Field)?;
//!
//! assert_eq!(method, Some(TypeDescriptor::Scalar(VariantTag::BStr)));
//! assert_eq!(field, Some(TypeDescriptor::Scalar(VariantTag::LPStr)));
//! # Ok::<(), tlbscope::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Operations that can fail return [`Result<T>`]. Only problems that make the whole run
//! meaningless surface as [`Error`]: a type without identity where one is required, two
//! different libraries claiming the same identity, an undecodable marshalling descriptor or an
//! unreadable names file. Everything else degrades the output and is reported on a
//! [`metadata::diagnostics::Diagnostics`] sink.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use tlbscope::prelude::*;
///
/// let names = SimpleNameResolver::new(["URL"]);
/// assert_eq!(names.get_mapped_name("url"), "URL");
/// ```
pub mod prelude;

/// Input model: reflected types, annotations, identities and diagnostics.
pub mod metadata;

/// The projection engine and per-type layouts.
pub mod typelib;

/// `tlbscope` Result type
pub type Result<T> = std::result::Result<T, Error>;

/// `tlbscope` Error type
pub use error::Error;

/// Bounds-checked byte cursor used to decode marshalling descriptors
pub use file::parser::Parser;
