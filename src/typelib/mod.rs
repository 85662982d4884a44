//! COM type library projection.
//!
//! Everything the type library writer needs is computed here: variant tags and type
//! descriptors for every signature element, dispatch IDs per interface member, the default
//! interface of each class, and the identities of referenced types in other libraries.
//!
//! # Architecture
//!
//! Components, leaves first:
//!
//! - [`names`] - Maps identifiers to their preferred spelling
//! - [`resolver`] - Caches type and library identities and loads foreign libraries on demand
//! - [`projector`] - Maps a managed type, a marshalling hint and a context to a type descriptor
//! - [`dispatch`] - Allocates dispatch IDs for the members of one interface
//! - [`layout`] - Per-type layouts built from all of the above
//!
//! One [`context::ExportContext`] serves exactly one conversion run. Recoverable problems
//! (unsupported projections, duplicate dispatch IDs, unresolved references) degrade the output
//! and are reported on its diagnostics; only contradictory identity declarations and missing
//! mandatory identities abort the run.
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::prelude::*;
//!
//! let assembly = AssemblyInfo::new("Contoso.Widgets", Version::new(1, 0, 0, 0)).into_rc();
//! let widget = TypeBuilder::interface(&assembly, "Contoso", "IWidget").build();
//! let int = TypeBuilder::well_known(TypeFlavor::I4).unwrap().build();
//! widget.add_property(PropertyDef::new("Size", &int, true, Vec::new()));
//!
//! let mut context = ExportContext::new(
//!     ConverterSettings::default(),
//!     Box::new(NoLibraries),
//!     &assembly,
//!     vec![widget.clone()],
//! )?;
//! let layout = InterfaceLayout::build(&widget, &mut context)?;
//!
//! assert_eq!(layout.functions.len(), 2);
//! assert_eq!(layout.functions[0].dispatch_id, 0x6002_0000);
//! # Ok::<(), tlbscope::Error>(())
//! ```

/// Export context of one conversion run
pub mod context;
/// Dispatch ID allocation
pub mod dispatch;
/// Per-type layouts
pub mod layout;
/// Name resolution
pub mod names;
/// Type-descriptor projection
pub mod projector;
/// Type identity resolver and cache
pub mod resolver;
/// Converter settings
pub mod settings;
/// Type library handles and entries
pub mod types;
/// Variant tags and type descriptors
pub mod variant;
