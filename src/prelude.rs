//! # tlbscope Prelude
//!
//! The most commonly used types and traits of the library. Import this module to get quick
//! access to everything needed to project a type graph.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all tlbscope operations
pub use crate::Error;

/// The result type used throughout tlbscope
pub use crate::Result;

/// Conversion settings
pub use crate::typelib::settings::ConverterSettings;

// ================================================================================================
// Input Model
// ================================================================================================

/// Type graph nodes and their annotations
pub use crate::metadata::typesystem::{
    AssemblyInfo, AssemblyInfoRc, ClassInterfaceType, ComInterfaceType, FieldDef, ManagedType,
    ManagedTypeRc, MemberDef, MethodDef, ParamDef, PropertyDef, TypeBuilder, TypeFlavor, Version,
};

/// Marshalling hints
pub use crate::metadata::marshalling::{MarshalHint, UnmanagedType};

/// Identities
pub use crate::metadata::identity::{
    IdentityHasher, Md5IdentityHasher, TypeLibraryIdentity, WELL_KNOWN,
};

/// Notification sink
pub use crate::metadata::diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics, HRESULT,
};

// ================================================================================================
// Projection Engine
// ================================================================================================

/// Variant tags and type descriptors
pub use crate::typelib::variant::{TypeDescriptor, VariantTag};

/// Type-descriptor projection
pub use crate::typelib::projector::{Projection, ProjectionContext, TypeProjector};

/// Dispatch ID allocation
pub use crate::typelib::dispatch::{DispatchId, DispatchIdAllocator, DispatchMember};

/// Identity resolution
pub use crate::typelib::resolver::{LibraryLoader, NoLibraries, TypeInfoResolver};

/// Type library handles
pub use crate::typelib::types::{
    ImplTypeFlags, ImplementedType, TypeInfo, TypeInfoRc, TypeKind, TypeLibrary, TypeLibraryRc,
};

/// Name resolution
pub use crate::typelib::names::{
    AliasNameResolver, ChainedNameResolver, NameResolver, NameTarget, SimpleNameResolver,
};

// ================================================================================================
// Layouts
// ================================================================================================

/// Export context of one run
pub use crate::typelib::context::ExportContext;

/// Per-type layouts
pub use crate::typelib::layout::{
    CoClassLayout, EnumLayout, FunctionLayout, InterfaceLayout, InvokeKind, LibraryLayout,
    ParamFlags, ParamLayout, RecordLayout,
};
