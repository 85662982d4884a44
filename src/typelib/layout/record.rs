//! Struct layout.

use crate::{
    metadata::{diagnostics::DiagnosticCategory, typesystem::ManagedTypeRc},
    typelib::{
        context::ExportContext, names::NameTarget, projector::ProjectionContext,
        variant::TypeDescriptor,
    },
    Result,
};

/// One exported field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    /// Exported name
    pub name: String,
    /// Projected type
    pub descriptor: TypeDescriptor,
}

/// Layout of one struct.
#[derive(Debug, Clone)]
pub struct RecordLayout {
    /// Exported name
    pub name: String,
    /// Struct identity
    pub guid: uguid::Guid,
    /// Instance fields that could be projected, in declaration order
    pub fields: Vec<FieldLayout>,
}

impl RecordLayout {
    /// Lays out the instance fields of `record` in field context.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingIdentity`] if a type involved has no identity.
    pub fn build(record: &ManagedTypeRc, context: &mut ExportContext) -> Result<Self> {
        let guid = record.guid(context.resolver.hasher())?;
        let name = context.mapped_name(NameTarget::Type(record), &record.name);

        let mut fields = Vec::new();
        for (_, field) in record.fields.iter() {
            if field.is_static {
                continue;
            }

            let projected = context.projector().project(
                &field.ty,
                field.annotations.marshal.as_ref(),
                ProjectionContext::Field,
            )?;
            let Some(descriptor) = projected else {
                context.diagnostics.warning(
                    DiagnosticCategory::Export,
                    format!("Field {}.{} was dropped", record.name, field.name),
                );
                continue;
            };

            fields.push(FieldLayout {
                name: context.mapped_name(
                    NameTarget::Member {
                        declaring: record,
                        member: &field.name,
                    },
                    &field.name,
                ),
                descriptor,
            });
        }

        context.diagnostics.info(
            DiagnosticCategory::Export,
            format!("Record '{name}' exported."),
        );

        Ok(RecordLayout { name, guid, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            marshalling::{MarshalHint, UnmanagedType},
            typesystem::{FieldDef, TypeBuilder, TypeFlavor},
        },
        test::fixtures::{assembly, context, scalar},
        typelib::variant::VariantTag,
    };

    #[test]
    fn test_field_context() {
        let record = TypeBuilder::value_type(&assembly(), "Demo", "Person").build();
        record.add_field(FieldDef::new("Name", &scalar(TypeFlavor::String)));
        record.add_field(FieldDef::new("Active", &scalar(TypeFlavor::Boolean)));
        record.add_field(FieldDef::new("Initial", &scalar(TypeFlavor::Char)));
        record.add_field(
            FieldDef::new("Title", &scalar(TypeFlavor::String))
                .marshal(MarshalHint::new(UnmanagedType::BStr)),
        );
        record.add_field(FieldDef::constant("Max", &scalar(TypeFlavor::I4), 10));

        let mut ctx = context(vec![record.clone()]);
        let layout = RecordLayout::build(&record, &mut ctx).unwrap();

        let tags: Vec<_> = layout.fields.iter().map(|f| f.descriptor.tag()).collect();
        assert_eq!(
            tags,
            vec![VariantTag::LPStr, VariantTag::I4, VariantTag::UI1, VariantTag::BStr]
        );
    }

    #[test]
    fn test_unsupported_field_dropped() {
        let record = TypeBuilder::value_type(&assembly(), "Demo", "Broken").build();
        record.add_field(FieldDef::new("Ok", &scalar(TypeFlavor::R8)));
        record.add_field(
            FieldDef::new("Bad", &scalar(TypeFlavor::Object))
                .marshal(MarshalHint::new(UnmanagedType::LPStr)),
        );

        let mut ctx = context(vec![record.clone()]);
        let layout = RecordLayout::build(&record, &mut ctx).unwrap();

        assert_eq!(layout.fields.len(), 1);
        assert_eq!(layout.fields[0].name, "Ok");
        assert_eq!(ctx.diagnostics.by_category(DiagnosticCategory::Export).len(), 2);
    }
}
