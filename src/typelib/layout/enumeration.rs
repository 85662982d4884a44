//! Enumeration layout.

use crate::{
    metadata::{diagnostics::{DiagnosticCategory, HRESULT}, typesystem::ManagedTypeRc},
    typelib::{context::ExportContext, names::NameTarget, variant::VariantTag},
    Result,
};

/// One exported constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    /// Exported name, `{Enum}_{Field}` unless mapped otherwise
    pub name: String,
    /// Value
    pub value: i32,
}

/// Layout of one enumeration.
#[derive(Debug, Clone)]
pub struct EnumLayout {
    /// Exported name
    pub name: String,
    /// Enumeration identity
    pub guid: uguid::Guid,
    /// Constants, in declaration order
    pub constants: Vec<EnumConstant>,
}

impl EnumLayout {
    /// Tag of every enumeration constant.
    pub const TAG: VariantTag = VariantTag::I4;

    /// Lays out the constants of `enumeration`.
    ///
    /// Constants outside the `i32` range are skipped with a warning.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingIdentity`] if the enumeration has no identity.
    pub fn build(enumeration: &ManagedTypeRc, context: &mut ExportContext) -> Result<Self> {
        let guid = enumeration.guid(context.resolver.hasher())?;
        let name = context.mapped_name(NameTarget::Type(enumeration), &enumeration.name);

        let mut constants = Vec::new();
        for (_, field) in enumeration.fields.iter() {
            let Some(raw) = field.constant else {
                continue;
            };

            let Ok(value) = i32::try_from(raw) else {
                context.diagnostics.report(
                    DiagnosticCategory::Export,
                    HRESULT::E_INVALIDARG,
                    enumeration.full_name(),
                    format!("Constant {}.{} = {raw} does not fit VT_I4", enumeration.name, field.name),
                );
                continue;
            };

            let default = format!("{}_{}", enumeration.name, field.name);
            constants.push(EnumConstant {
                name: context.mapped_name(
                    NameTarget::EnumConstant {
                        declaring: enumeration,
                        field: &field.name,
                    },
                    &default,
                ),
                value,
            });
        }

        context.diagnostics.info(
            DiagnosticCategory::Export,
            format!("Enum '{name}' exported."),
        );

        Ok(EnumLayout {
            name,
            guid,
            constants,
        })
    }
}
