//! Coclass layout: the ordered implemented-interface list of a class.

use crate::{
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
        typesystem::{ManagedType, ManagedTypeRc},
    },
    typelib::{
        context::ExportContext,
        names::NameTarget,
        types::{ImplTypeFlags, ImplementedType, TypeInfo, TypeInfoRc, TypeKind},
    },
    Result,
};

/// Layout of one class.
#[derive(Debug, Clone)]
pub struct CoClassLayout {
    /// Exported name
    pub name: String,
    /// Class identity
    pub guid: uguid::Guid,
    /// Implemented interfaces, in export order
    pub implemented: Vec<ImplementedType>,
}

impl CoClassLayout {
    /// Lays out `class`, with `class_interface` as first entry if the class has one.
    ///
    /// Order: class interface, COM-visible implemented interfaces, then resolvable event
    /// source interfaces. Interfaces that cannot be resolved are skipped with a warning. If
    /// nothing was flagged `DEFAULT`, the first entry is.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingIdentity`] if the class or an interface has no identity.
    pub fn build(
        class: &ManagedTypeRc,
        class_interface: Option<TypeInfoRc>,
        context: &mut ExportContext,
    ) -> Result<Self> {
        let guid = class.guid(context.resolver.hasher())?;
        let name = context.mapped_name(NameTarget::Type(class), &class.name);

        let mut implemented = Vec::new();
        let mut default_set = false;

        if let Some(target) = class_interface {
            implemented.push(ImplementedType {
                target,
                flags: ImplTypeFlags::empty(),
            });
        }

        for (_, interface) in class.interfaces.iter() {
            if !interface.is_com_visible() {
                continue;
            }

            let Some(target) = context.resolver.resolve_type(interface)? else {
                report_unresolved(context, class, interface);
                continue;
            };

            let mut flags = ImplTypeFlags::empty();
            if names_match(class.annotations.default_interface.as_deref(), interface) {
                flags = ImplTypeFlags::DEFAULT;
                default_set = true;
            }
            if let Some(source) = &interface.annotations.event_source_interface {
                if class
                    .annotations
                    .source_interfaces
                    .iter()
                    .any(|listed| listed == source)
                {
                    flags = ImplTypeFlags::DEFAULT | ImplTypeFlags::SOURCE;
                    default_set = true;
                }
            }

            implemented.push(ImplementedType { target, flags });
        }

        for source in &class.annotations.source_interfaces {
            let Some(interface) = context.find_type(source).cloned() else {
                continue;
            };
            match context.resolver.resolve_type(&interface)? {
                Some(target) => implemented.push(ImplementedType {
                    target,
                    flags: ImplTypeFlags::DEFAULT | ImplTypeFlags::SOURCE,
                }),
                None => report_unresolved(context, class, &interface),
            }
        }

        if !default_set {
            if let Some(first) = implemented.first_mut() {
                first.flags |= ImplTypeFlags::DEFAULT;
            }
        }

        context.diagnostics.info(
            DiagnosticCategory::Export,
            format!("Class '{name}' exported."),
        );

        Ok(CoClassLayout {
            name,
            guid,
            implemented,
        })
    }

    /// Returns the first entry flagged `DEFAULT` and not `SOURCE`.
    #[must_use]
    pub fn default_interface(&self) -> Option<&TypeInfoRc> {
        self.implemented
            .iter()
            .find(|entry| {
                entry.flags.contains(ImplTypeFlags::DEFAULT)
                    && !entry.flags.contains(ImplTypeFlags::SOURCE)
            })
            .map(|entry| &entry.target)
    }

    /// Builds the type-info entry the resolver registers for this class.
    #[must_use]
    pub fn to_type_info(&self) -> TypeInfoRc {
        self.implemented
            .iter()
            .fold(
                TypeInfo::new(self.guid, self.name.clone(), TypeKind::CoClass),
                |info, entry| info.implementing(&entry.target, entry.flags),
            )
            .into_rc()
    }
}

fn names_match(declared: Option<&str>, interface: &ManagedType) -> bool {
    declared.is_some_and(|declared| declared == interface.full_name() || declared == interface.name)
}

fn report_unresolved(context: &ExportContext, class: &ManagedType, interface: &ManagedType) {
    context.diagnostics.push(
        Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::Reference,
            format!(
                "Type library for interface {} implemented by {} not found",
                interface.full_name(),
                class.name
            ),
        )
        .with_subject(class.full_name()),
    );
}
