//! Type-descriptor projection.
//!
//! Maps one managed type, an optional marshalling hint and a context (method signature or
//! struct field) to a COM [`TypeDescriptor`]. Projection happens in two steps:
//!
//! 1. [`project_flavor`] is a pure function over the type's [`TypeFlavor`] and the requested
//!    [`UnmanagedType`]. It encodes the per-type default tags, the per-type hint override
//!    tables and the unsupported combinations, and never consults any state.
//! 2. [`TypeProjector::project`] handles the structure around it: managed references become
//!    `VT_PTR`, arrays get their element projected under the safe-array sub-type rules, and
//!    user-defined references are resolved through the [`TypeInfoResolver`], degrading to
//!    `VT_UNKNOWN` for interfaces and classes that cannot be found.
//!
//! Unsupported combinations yield `None` together with a warning on the diagnostics sink;
//! the caller drops the affected member.
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::metadata::{marshalling::UnmanagedType, typesystem::TypeFlavor};
//! use tlbscope::typelib::projector::{project_flavor, Projection, ProjectionContext};
//! use tlbscope::typelib::variant::VariantTag;
//!
//! assert_eq!(
//!     project_flavor(TypeFlavor::String, None, ProjectionContext::Method),
//!     Projection::Tag(VariantTag::BStr)
//! );
//! assert_eq!(
//!     project_flavor(TypeFlavor::String, None, ProjectionContext::Field),
//!     Projection::Tag(VariantTag::LPStr)
//! );
//! assert_eq!(
//!     project_flavor(TypeFlavor::String, Some(UnmanagedType::Currency), ProjectionContext::Method),
//!     Projection::Unsupported
//! );
//! ```

use crate::{
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics, HRESULT},
        marshalling::{MarshalHint, UnmanagedType},
        typesystem::{ManagedType, ManagedTypeRc, TypeFlavor},
    },
    typelib::{
        resolver::TypeInfoResolver,
        variant::{TypeDescriptor, VariantTag},
    },
    Error, Result,
};

/// Deepest wrapper nesting (arrays and references) the projector follows.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Where a projected type appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionContext {
    /// Parameter or return value of a method
    Method,
    /// Field of a struct
    Field,
}

/// Result of the tag tables, before references are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    /// The value is described by this tag
    Tag(VariantTag),
    /// The value is a `VT_PTR` to this tag
    PointerTo(VariantTag),
    /// The value is an interface pointer if the type resolves, `VT_UNKNOWN` otherwise
    Reference,
    /// No valid representation exists
    Unsupported,
}

/// Projects a type category under an optional requested native type.
///
/// `native` is `None` when no hint is present. A hint carrying only a safe-array sub-type
/// arrives as `Some(UnmanagedType::Unspecified)`; some types accept it as "use the default"
/// and others reject it.
///
/// Arrays whose element is `System.Object` follow [`project_object_array`] instead.
#[must_use]
pub fn project_flavor(
    flavor: TypeFlavor,
    native: Option<UnmanagedType>,
    context: ProjectionContext,
) -> Projection {
    use Projection::{PointerTo, Reference, Tag, Unsupported};
    use UnmanagedType as U;
    use VariantTag as VT;

    let method = context == ProjectionContext::Method;

    match flavor {
        TypeFlavor::Void => Tag(VT::Void),
        TypeFlavor::Boolean => match native {
            None | Some(U::Unspecified) => Tag(if method { VT::Bool } else { VT::I4 }),
            Some(U::VariantBool | U::AsAny) => Tag(VT::Bool),
            Some(U::Bool) => Tag(VT::I4),
            Some(U::U1 | U::I1) => Tag(VT::UI1),
            Some(_) => Unsupported,
        },
        TypeFlavor::Char => match native {
            None => Tag(if method { VT::UI2 } else { VT::UI1 }),
            Some(U::Unspecified | U::AsAny | U::U2 | U::I2) => Tag(VT::UI2),
            Some(U::U1 | U::I1) => Tag(VT::UI1),
            Some(_) => Unsupported,
        },
        TypeFlavor::String => match native {
            None => Tag(if method { VT::BStr } else { VT::LPStr }),
            Some(U::BStr | U::AsAny) => Tag(VT::BStr),
            Some(U::LPStr) => Tag(VT::LPStr),
            Some(U::LPWStr) => Tag(VT::LPWStr),
            Some(_) => Unsupported,
        },
        TypeFlavor::Object => match native {
            None => Tag(if method { VT::Variant } else { VT::Unknown }),
            Some(U::AsAny | U::Struct) => Tag(VT::Variant),
            Some(U::IUnknown | U::Interface) => Tag(VT::Unknown),
            Some(U::IDispatch) => Tag(VT::Dispatch),
            Some(_) => Unsupported,
        },
        TypeFlavor::Decimal => match native {
            None | Some(U::AsAny) => Tag(VT::Decimal),
            Some(U::Currency) => Tag(VT::Cy),
            Some(_) => Unsupported,
        },
        TypeFlavor::I4 => match native {
            None | Some(U::Unspecified | U::I4 | U::AsAny | U::U4 | U::Interface) => Tag(VT::I4),
            Some(U::Error) => Tag(VT::HResult),
            Some(_) => Unsupported,
        },
        TypeFlavor::U4 => match native {
            None | Some(U::Unspecified | U::AsAny | U::U4) => Tag(VT::UI4),
            Some(U::Error) => Tag(VT::HResult),
            Some(_) => Unsupported,
        },
        TypeFlavor::I1 => Tag(VT::I1),
        TypeFlavor::U1 => Tag(VT::UI1),
        TypeFlavor::I2 => Tag(VT::I2),
        TypeFlavor::U2 => Tag(VT::UI2),
        TypeFlavor::I8 => Tag(VT::I8),
        TypeFlavor::U8 => Tag(VT::UI8),
        TypeFlavor::R4 => Tag(VT::R4),
        TypeFlavor::R8 => Tag(VT::R8),
        TypeFlavor::IntPtr => Tag(VT::I8),
        TypeFlavor::DateTime => Tag(VT::Date),
        TypeFlavor::Guid => match native {
            None | Some(U::Struct | U::AsAny) => Tag(VT::UserDefined),
            Some(U::LPStruct) => PointerTo(VT::UserDefined),
            Some(_) => Unsupported,
        },
        TypeFlavor::Color | TypeFlavor::ValueType => Tag(VT::UserDefined),
        TypeFlavor::Enumerator => PointerTo(VT::UserDefined),
        TypeFlavor::ComIDispatch => Tag(VT::Dispatch),
        TypeFlavor::ComIUnknown | TypeFlavor::DelegateBase | TypeFlavor::Delegate => {
            Tag(VT::Unknown)
        }
        TypeFlavor::UIntPtr => Tag(VT::Unknown),
        TypeFlavor::Enum => match native {
            Some(U::I4) => Tag(VT::I4),
            Some(U::I2) => Tag(VT::I2),
            Some(U::U4) => Tag(VT::UI4),
            Some(U::U2) => Tag(VT::UI2),
            _ => Tag(VT::UserDefined),
        },
        TypeFlavor::Array => match native {
            Some(U::LPArray) => Tag(VT::Ptr),
            _ => Tag(VT::SafeArray),
        },
        TypeFlavor::Interface | TypeFlavor::Class => Reference,
        TypeFlavor::ByRef => Unsupported,
    }
}

/// Projects `System.Object[]`, which accepts fewer hints than other arrays.
#[must_use]
pub fn project_object_array(native: Option<UnmanagedType>) -> Projection {
    match native {
        None | Some(UnmanagedType::SafeArray | UnmanagedType::AsAny) => {
            Projection::Tag(VariantTag::SafeArray)
        }
        Some(UnmanagedType::LPArray) => Projection::Tag(VariantTag::Ptr),
        Some(_) => Projection::Unsupported,
    }
}

/// Applies the tables to a type node, without resolving references.
///
/// With `element` set, `ty` is the element of an array and the hint's safe-array sub-type
/// decides: rejected sub-types are unsupported, a concrete sub-type is taken as is, and an
/// unspecified or user-defined sub-type falls back to the element's natural projection.
#[must_use]
pub fn classify(
    ty: &ManagedType,
    hint: Option<&MarshalHint>,
    context: ProjectionContext,
    element: bool,
) -> Projection {
    let mut hint = hint;

    if element {
        if ty.is_array() {
            return Projection::Unsupported;
        }

        match hint.and_then(|h| h.safe_array_sub_type) {
            Some(sub_type) if sub_type.is_rejected_safe_array_element() => {
                return Projection::Unsupported;
            }
            Some(sub_type) if sub_type != VariantTag::UserDefined => {
                return Projection::Tag(sub_type);
            }
            _ => hint = None,
        }
    }

    let native = hint.map(|h| h.native);

    if ty.is_array() {
        if let Some(element) = &ty.element {
            if element.flavor == TypeFlavor::Object {
                return project_object_array(native);
            }
        }
    }

    if ty.is_generic && ty.flavor == TypeFlavor::Interface {
        return Projection::Tag(VariantTag::Unknown);
    }

    project_flavor(ty.flavor, native, context)
}

/// Projects managed types to type descriptors, resolving user-defined references.
pub struct TypeProjector<'a> {
    resolver: &'a mut TypeInfoResolver,
    diagnostics: &'a Diagnostics,
}

impl<'a> TypeProjector<'a> {
    /// Creates a projector over `resolver`, reporting to `diagnostics`.
    pub fn new(resolver: &'a mut TypeInfoResolver, diagnostics: &'a Diagnostics) -> Self {
        TypeProjector {
            resolver,
            diagnostics,
        }
    }

    /// Projects `ty` under `hint` in `context`.
    ///
    /// Returns `Ok(None)` if the combination is unsupported, the signature uses a generic
    /// instantiation, or a value type cannot be resolved. A warning is reported in each case.
    ///
    /// # Errors
    /// Returns [`crate::Error::RecursionLimit`] for absurdly nested wrapper chains and
    /// [`crate::Error::MissingIdentity`] for types without identity.
    pub fn project(
        &mut self,
        ty: &ManagedTypeRc,
        hint: Option<&MarshalHint>,
        context: ProjectionContext,
    ) -> Result<Option<TypeDescriptor>> {
        check_nesting(ty)?;

        let underlying = ty.underlying();
        if underlying.is_generic {
            self.report(
                HRESULT::TLBX_E_GENERICINST_SIGNATURE,
                ty,
                format!("Generic type {} cannot be exported", underlying.full_name()),
            );
            return Ok(None);
        }

        let target = ty.unref();
        let descriptor = match classify(&target, hint, context, false) {
            Projection::Tag(tag @ (VariantTag::SafeArray | VariantTag::Ptr)) if target.is_array() => {
                let Some(element) = target.element.clone() else {
                    return Ok(None);
                };

                let element_projection = classify(&element, hint, context, true);
                if element_projection == Projection::Unsupported {
                    self.report_unsupported(ty, hint);
                    return Ok(None);
                }

                let Some(inner) = self.describe(element_projection, &element)? else {
                    return Ok(None);
                };

                if tag == VariantTag::SafeArray {
                    TypeDescriptor::safe_array(inner)
                } else {
                    TypeDescriptor::pointer(inner)
                }
            }
            Projection::Unsupported => {
                self.report_unsupported(ty, hint);
                return Ok(None);
            }
            projection => match self.describe(projection, &target)? {
                Some(descriptor) => descriptor,
                None => return Ok(None),
            },
        };

        if ty.is_by_ref() {
            Ok(Some(TypeDescriptor::pointer(descriptor)))
        } else {
            Ok(Some(descriptor))
        }
    }

    fn describe(
        &mut self,
        projection: Projection,
        ty: &ManagedTypeRc,
    ) -> Result<Option<TypeDescriptor>> {
        match projection {
            Projection::Unsupported => Ok(None),
            Projection::Reference => self.reference(ty).map(Some),
            Projection::Tag(VariantTag::UserDefined) => self.user_defined(ty),
            Projection::PointerTo(VariantTag::UserDefined) => {
                Ok(self.user_defined(ty)?.map(|inner| match inner {
                    TypeDescriptor::Scalar(VariantTag::Unknown) => inner,
                    other => TypeDescriptor::pointer(other),
                }))
            }
            Projection::PointerTo(tag) => {
                Ok(Some(TypeDescriptor::pointer(TypeDescriptor::Scalar(tag))))
            }
            Projection::Tag(VariantTag::SafeArray | VariantTag::Ptr) => Ok(None),
            Projection::Tag(tag) => Ok(Some(TypeDescriptor::Scalar(tag))),
        }
    }

    /// Interfaces and classes: pointer to the resolved entry, or `VT_UNKNOWN`.
    fn reference(&mut self, ty: &ManagedTypeRc) -> Result<TypeDescriptor> {
        if ty.flavor == TypeFlavor::Class {
            if let Some(default) = self.resolver.resolve_default_coclass_interface(ty)? {
                let target = self.resolver.resolve_type(ty)?.unwrap_or(default);
                return Ok(TypeDescriptor::pointer(TypeDescriptor::UserDefined(target)));
            }
        } else if let Some(info) = self.resolver.resolve_type(ty)? {
            return Ok(TypeDescriptor::pointer(TypeDescriptor::UserDefined(info)));
        }

        self.report_unknown(ty);
        Ok(TypeDescriptor::Scalar(VariantTag::Unknown))
    }

    /// Value types and bridge shapes: the resolved entry itself.
    fn user_defined(&mut self, ty: &ManagedTypeRc) -> Result<Option<TypeDescriptor>> {
        if ty.flavor == TypeFlavor::Enum && !ty.is_com_visible() {
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::Reference,
                    format!("Enumeration {} is not COM visible", ty.full_name()),
                )
                .with_subject(ty.full_name()),
            );
            return Ok(None);
        }

        if let Some(info) = self.resolver.resolve_type(ty)? {
            return Ok(Some(TypeDescriptor::UserDefined(info)));
        }

        if ty.is_interface() || ty.flavor == TypeFlavor::Class {
            if let Some(default) = self.resolver.resolve_default_coclass_interface(ty)? {
                return Ok(Some(TypeDescriptor::UserDefined(default)));
            }
            self.report_unknown(ty);
            return Ok(Some(TypeDescriptor::Scalar(VariantTag::Unknown)));
        }

        self.diagnostics.push(
            Diagnostic::new(
                DiagnosticSeverity::Warning,
                DiagnosticCategory::Reference,
                format!("Type library entry for {} not found", ty.full_name()),
            )
            .with_subject(ty.full_name()),
        );
        Ok(None)
    }

    fn report(&self, code: u32, ty: &ManagedType, message: String) {
        self.diagnostics
            .report(DiagnosticCategory::Projection, code, ty.full_name(), message);
    }

    fn report_unsupported(&self, ty: &ManagedType, hint: Option<&MarshalHint>) {
        let requested = match hint {
            Some(hint) => match hint.safe_array_sub_type {
                Some(sub_type) => format!("{} of {}", hint.native, sub_type),
                None => hint.native.to_string(),
            },
            None => "its default representation".to_string(),
        };
        self.report(
            HRESULT::TLBX_E_BAD_NATIVETYPE,
            ty,
            format!("{} cannot be marshalled as {}", ty.full_name(), requested),
        );
    }

    fn report_unknown(&self, ty: &ManagedType) {
        self.diagnostics.report(
            DiagnosticCategory::Reference,
            HRESULT::TLBX_I_USEIUNKNOWN,
            ty.full_name(),
            format!("Reference to {} replaced by IUnknown", ty.full_name()),
        );
    }
}

fn check_nesting(ty: &ManagedType) -> Result<()> {
    let mut depth = 0;
    let mut current = ty.element.as_ref();
    while let Some(element) = current {
        depth += 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::RecursionLimit(MAX_NESTING_DEPTH));
        }
        current = element.element.as_ref();
    }
    Ok(())
}
