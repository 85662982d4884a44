//! Input model of the exporter.
//!
//! This module describes the reflected type graph the engine consumes and the identities
//! attached to it. Annotations are plain records on the graph nodes, so the engine can be fed
//! synthetic graphs without any metadata reader behind them.
//!
//! # Key Components
//!
//! - [`typesystem`] - Types, members, parameters and their annotations
//! - [`marshalling`] - Marshalling hints and their ECMA-335 descriptor encoding
//! - [`identity`] - Library identities, well-known GUIDs and identity derivation
//! - [`diagnostics`] - Notification sink for recoverable problems
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::metadata::typesystem::{AssemblyInfo, MethodDef, TypeBuilder, Version};
//!
//! let assembly = AssemblyInfo::new("Contoso.Widgets", Version::new(1, 0, 0, 0)).into_rc();
//! let widget = TypeBuilder::interface(&assembly, "Contoso", "IWidget").build();
//! widget.add_method(MethodDef::new("Refresh", None));
//!
//! assert_eq!(widget.full_name(), "Contoso.IWidget");
//! assert_eq!(widget.methods().count(), 1);
//! ```

/// Notification sink for warnings and export events
pub mod diagnostics;
/// Library identities, well-known GUIDs and identity hashing
pub mod identity;
/// Marshalling hints
pub mod marshalling;
/// The reflected type graph
pub mod typesystem;
