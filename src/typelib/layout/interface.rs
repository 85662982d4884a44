//! Interface layout: functions, parameters, dispatch IDs and vtable offsets.

use crate::{
    metadata::{
        diagnostics::{DiagnosticCategory, HRESULT},
        identity::WELL_KNOWN,
        marshalling::UnmanagedType,
        typesystem::{
            ClassInterfaceType, ComInterfaceType, ManagedType, ManagedTypeRc, MemberDef,
            MethodDef, ParameterAnnotations, TypeFlavor,
        },
    },
    typelib::{
        context::ExportContext,
        dispatch::{DispatchId, DispatchIdAllocator, DispatchMember, DISPID_VALUE},
        layout::{kind_for, InvokeKind, ParamFlags},
        names::NameTarget,
        projector::ProjectionContext,
        types::{TypeInfo, TypeInfoRc, TypeKind},
        variant::{TypeDescriptor, VariantTag},
    },
    Error, Result,
};

const RETVAL_NAME: &str = "pRetVal";
const IUNKNOWN_METHODS: [&str; 3] = ["QueryInterface", "AddRef", "Release"];
const IDISPATCH_METHODS: [&str; 4] = ["GetTypeInfoCount", "GetTypeInfo", "GetIDsOfNames", "Invoke"];

/// One parameter of an exported function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamLayout {
    /// Exported name; `None` for unnamed setter values
    pub name: Option<String>,
    /// Projected type
    pub descriptor: TypeDescriptor,
    /// `PARAMFLAG_*` bits
    pub flags: ParamFlags,
}

/// One exported function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionLayout {
    /// Dense index over the exported functions of the interface
    pub index: usize,
    /// Exported name
    pub name: String,
    /// Effective dispatch ID
    pub dispatch_id: DispatchId,
    /// Invocation kind
    pub invoke: InvokeKind,
    /// Byte offset of the function's vtable slot
    pub vtable_offset: usize,
    /// Parameters, including a transformed return value
    pub params: Vec<ParamLayout>,
    /// Return type
    pub returns: TypeDescriptor,
    /// Documentation string
    pub description: Option<String>,
    /// A plain method that became the property getter for `DISPID_VALUE`
    pub forced_getter: bool,
}

/// Layout of one interface.
#[derive(Debug, Clone)]
pub struct InterfaceLayout {
    /// Exported name
    pub name: String,
    /// Interface identity
    pub guid: uguid::Guid,
    /// Interface ABI
    pub kind: ComInterfaceType,
    /// Base interface entry, if it could be resolved
    pub base: Option<TypeInfoRc>,
    /// Exported functions, in declaration order
    pub functions: Vec<FunctionLayout>,
}

struct Slot<'a> {
    key: usize,
    member: &'a MemberDef,
    method: &'a MethodDef,
    invoke: InvokeKind,
    name: String,
    visible: bool,
}

struct Draft {
    key: usize,
    name: String,
    invoke: InvokeKind,
    vtable_offset: usize,
    params: Vec<ParamLayout>,
    returns: TypeDescriptor,
    description: Option<String>,
}

impl InterfaceLayout {
    /// Lays out `interface`.
    ///
    /// Members whose signatures cannot be projected are dropped with a warning; they still
    /// occupy their vtable slot and dispatch ID.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedInterfaceKind`] for `IInspectable` interfaces and
    /// [`Error::MissingIdentity`] for types without identity.
    pub fn build(interface: &ManagedTypeRc, context: &mut ExportContext) -> Result<Self> {
        let kind = interface.interface_kind();
        if kind == ComInterfaceType::IInspectable {
            return Err(Error::UnsupportedInterfaceKind(interface.full_name()));
        }

        let guid = interface.guid(context.resolver.hasher())?;
        let name = context.mapped_name(NameTarget::Type(interface), &interface.name);
        context.diagnostics.info(
            DiagnosticCategory::Export,
            format!("Interface '{name}' exported."),
        );

        let base = context.resolver.resolve_guid(match kind {
            ComInterfaceType::IUnknown => WELL_KNOWN::IID_IUNKNOWN,
            _ => WELL_KNOWN::IID_IDISPATCH,
        });
        let base_names: Vec<&str> = match (&base, kind) {
            (None, _) => Vec::new(),
            (Some(_), ComInterfaceType::IUnknown) => IUNKNOWN_METHODS.to_vec(),
            (Some(_), _) => IUNKNOWN_METHODS.iter().chain(IDISPATCH_METHODS.iter()).copied().collect(),
        };

        let slots = collect_slots(interface, &base_names);

        let transform = kind != ComInterfaceType::IDispatch;
        let pointer_size = context.settings.pointer_size;
        let first_slot = match kind {
            ComInterfaceType::IUnknown => IUNKNOWN_METHODS.len(),
            _ => IUNKNOWN_METHODS.len() + IDISPATCH_METHODS.len(),
        } * pointer_size;

        let mut allocator = DispatchIdAllocator::new(kind)
            .with_default_member(interface.annotations.default_member.as_deref());
        let mut drafts = Vec::new();

        for (index, slot) in slots.iter().enumerate() {
            if !slot.visible {
                allocator.skip_slot();
                continue;
            }

            allocator.register_member(DispatchMember {
                declared: slot.member.annotations().dispatch_id,
                returns_enumerator: slot
                    .method
                    .returns
                    .as_ref()
                    .is_some_and(|ty| ty.flavor == TypeFlavor::Enumerator),
                ..DispatchMember::new(slot.key, slot.member.name())
            });

            let vtable_offset = first_slot + index * pointer_size;
            if let Some(draft) = draft_function(interface, slot, vtable_offset, transform, context)? {
                drafts.push(draft);
            }
        }

        allocator.normalize(&context.diagnostics, &interface.name);

        let functions = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                let dispatch_id = allocator.id(draft.key).unwrap_or_else(|| allocator.base());
                let forced_getter = dispatch_id == DISPID_VALUE && draft.invoke == InvokeKind::Func;
                FunctionLayout {
                    index,
                    name: draft.name,
                    dispatch_id,
                    invoke: if forced_getter {
                        InvokeKind::PropertyGet
                    } else {
                        draft.invoke
                    },
                    vtable_offset: draft.vtable_offset,
                    params: draft.params,
                    returns: draft.returns,
                    description: draft.description,
                    forced_getter,
                }
            })
            .collect();

        Ok(InterfaceLayout {
            name,
            guid,
            kind,
            base,
            functions,
        })
    }

    /// Lays out the class interface `_Name` of `class`, if it gets one.
    ///
    /// The interface is dual, derives from `IDispatch` and lists no functions of its own: the
    /// class's members are reached through late binding. Classes opting out with
    /// [`ClassInterfaceType::None`] or deriving from a generic class get none.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedClassInterface`] for [`ClassInterfaceType::AutoDual`] and
    /// [`Error::MissingIdentity`] if the class has no identity.
    pub fn build_class_interface(
        class: &ManagedTypeRc,
        context: &mut ExportContext,
    ) -> Result<Option<Self>> {
        match class.class_interface_kind() {
            ClassInterfaceType::None => return Ok(None),
            ClassInterfaceType::AutoDual => {
                return Err(Error::UnsupportedClassInterface(class.full_name()))
            }
            ClassInterfaceType::AutoDispatch => {}
        }
        if class.has_generic_base() {
            return Ok(None);
        }

        let guid = context.resolver.lookup_guid(class)?;
        let name = format!("_{}", context.mapped_name(NameTarget::Type(class), &class.name));
        context.diagnostics.info(
            DiagnosticCategory::Export,
            format!("Class interface '{name}' exported."),
        );

        Ok(Some(InterfaceLayout {
            name,
            guid,
            kind: ComInterfaceType::Dual,
            base: context.resolver.resolve_guid(WELL_KNOWN::IID_IDISPATCH),
            functions: Vec::new(),
        }))
    }

    /// Finds an exported function by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionLayout> {
        self.functions.iter().find(|function| function.name == name)
    }

    /// Builds the type-info entry the resolver registers for this interface.
    #[must_use]
    pub fn to_type_info(&self) -> TypeInfoRc {
        let kind = kind_for(TypeFlavor::Interface, self.kind).unwrap_or(TypeKind::Interface);
        TypeInfo::new(self.guid, self.name.clone(), kind).into_rc()
    }
}

/// Computes `PARAMFLAG_*` bits for a parameter.
///
/// `transformed` marks the return value moved into the parameter list by the HRESULT
/// transformation.
#[must_use]
pub fn param_flags(annotations: &ParameterAnnotations, by_ref: bool, transformed: bool) -> ParamFlags {
    let mut flags = ParamFlags::empty();

    if annotations.is_out || (by_ref && !annotations.is_in) || transformed {
        flags |= ParamFlags::OUT;
    }
    if annotations.is_in || (!annotations.is_retval && !annotations.is_out && !transformed) {
        flags |= ParamFlags::IN;
    }
    if annotations.is_retval || transformed {
        flags |= ParamFlags::RETVAL;
    }
    if annotations.is_optional {
        flags |= ParamFlags::OPT;
    }
    if annotations.has_default {
        flags |= ParamFlags::HASDEFAULT;
    }

    flags
}

fn collect_slots<'a>(interface: &'a ManagedType, base_names: &[&str]) -> Vec<Slot<'a>> {
    let mut slots: Vec<Slot<'a>> = Vec::new();

    for (key, member) in interface.members.iter() {
        match member {
            MemberDef::Method(method) => {
                let visible = method.annotations.is_visible();
                let name = if visible {
                    overload_name(&method.name, &slots, base_names)
                } else {
                    method.name.clone()
                };
                slots.push(Slot {
                    key,
                    member,
                    method,
                    invoke: InvokeKind::Func,
                    name,
                    visible,
                });
            }
            MemberDef::Property(property) => {
                let accessors = [
                    (property.getter.as_ref(), InvokeKind::PropertyGet),
                    (property.setter.as_ref(), InvokeKind::PropertyPut),
                ];
                for (accessor, invoke) in accessors {
                    let Some(method) = accessor else {
                        continue;
                    };
                    let invoke = if invoke == InvokeKind::PropertyPut && takes_reference(method) {
                        InvokeKind::PropertyPutRef
                    } else {
                        invoke
                    };
                    slots.push(Slot {
                        key,
                        member,
                        method,
                        invoke,
                        name: property.name.clone(),
                        visible: property.annotations.is_visible()
                            && method.annotations.is_visible(),
                    });
                }
            }
        }
    }

    slots
}

/// `Name`, or `Name_{n+1}` when `n` visible members or base methods already use it.
fn overload_name(name: &str, slots: &[Slot<'_>], base_names: &[&str]) -> String {
    let prefix = format!("{name}_");
    let taken = slots
        .iter()
        .filter(|slot| slot.visible)
        .filter(|slot| slot.member.name() == name || slot.name.starts_with(&prefix))
        .count()
        + base_names
            .iter()
            .filter(|base| **base == name || base.starts_with(&prefix))
            .count();

    if taken == 0 {
        name.to_string()
    } else {
        format!("{name}_{}", taken + 1)
    }
}

/// Setters taking an object, class or interface become `PropertyPutRef`.
fn takes_reference(setter: &MethodDef) -> bool {
    setter.params.iter().any(|param| {
        let flavor = param.ty.flavor;
        flavor == TypeFlavor::Object
            || (flavor.is_class() && !flavor.is_special_handled() && flavor != TypeFlavor::Array)
            || flavor.is_interface()
    })
}

fn draft_function(
    interface: &ManagedType,
    slot: &Slot<'_>,
    vtable_offset: usize,
    transform: bool,
    context: &mut ExportContext,
) -> Result<Option<Draft>> {
    let method = slot.method;
    if method.is_generic {
        context.diagnostics.report(
            DiagnosticCategory::Projection,
            HRESULT::TLBX_E_GENERICINST_SIGNATURE,
            format!("{}.{}", interface.full_name(), method.name),
            format!("Generic method {} cannot be exported", method.name),
        );
        return Ok(None);
    }

    let transform = transform && !method.annotations.preserve_sig;
    let mut valid = true;
    let mut params = Vec::with_capacity(method.params.len() + 1);

    for param in &method.params {
        let hint = param.annotations.marshal.as_ref();
        let Some(descriptor) = context
            .projector()
            .project(&param.ty, hint, ProjectionContext::Method)?
        else {
            valid = false;
            continue;
        };

        let by_ref = param.is_by_ref();
        let mut flags = param_flags(&param.annotations, by_ref, false);
        if !by_ref
            && param.ty.flavor == TypeFlavor::Guid
            && hint.is_some_and(|hint| hint.native == UnmanagedType::LPStruct)
        {
            flags |= ParamFlags::OUT;
        }

        let name = match slot.invoke {
            InvokeKind::PropertyPut => None,
            InvokeKind::PropertyPutRef if param.name.eq_ignore_ascii_case("value") => None,
            _ => Some(context.mapped_name(
                NameTarget::Parameter {
                    declaring: interface,
                    method: &method.name,
                    parameter: &param.name,
                },
                &param.name,
            )),
        };

        params.push(ParamLayout {
            name,
            descriptor,
            flags,
        });
    }

    let value = method
        .returns
        .as_ref()
        .filter(|ty| ty.flavor != TypeFlavor::Void);
    let return_hint = method.annotations.marshal.as_ref();

    let returns = match value {
        Some(ty) => {
            match context
                .projector()
                .project(ty, return_hint, ProjectionContext::Method)?
            {
                Some(descriptor) if transform => {
                    params.push(ParamLayout {
                        name: Some(RETVAL_NAME.to_string()),
                        descriptor: TypeDescriptor::pointer(descriptor),
                        flags: param_flags(&ParameterAnnotations::default(), false, true),
                    });
                    TypeDescriptor::Scalar(VariantTag::HResult)
                }
                Some(descriptor) => descriptor,
                None => {
                    valid = false;
                    TypeDescriptor::Scalar(VariantTag::Void)
                }
            }
        }
        None if transform => TypeDescriptor::Scalar(VariantTag::HResult),
        None => TypeDescriptor::Scalar(VariantTag::Void),
    };

    if !valid {
        return Ok(None);
    }

    let name = context.mapped_name(
        NameTarget::Member {
            declaring: interface,
            member: slot.member.name(),
        },
        &slot.name,
    );

    Ok(Some(Draft {
        key: slot.key,
        name,
        invoke: slot.invoke,
        vtable_offset,
        params,
        returns,
        description: method.annotations.description.clone(),
    }))
}
