//! State shared by the layouts of one conversion run.
//!
//! [`ExportContext`] owns the resolver, the diagnostics sink, the name resolver and the set of
//! types being exported. A context serves exactly one run; nothing in it is shared across runs.

use crate::{
    metadata::{
        diagnostics::Diagnostics,
        identity::TypeLibraryIdentity,
        typesystem::{AssemblyInfoRc, ManagedTypeRc},
    },
    typelib::{
        names::{AliasNameResolver, ChainedNameResolver, NameResolver, NameTarget, SimpleNameResolver},
        projector::TypeProjector,
        resolver::{LibraryLoader, TypeInfoResolver},
        settings::ConverterSettings,
    },
    Result,
};

/// Everything a layout needs while converting one assembly.
pub struct ExportContext {
    /// Conversion settings
    pub settings: ConverterSettings,
    /// Identity cache and library loader
    pub resolver: TypeInfoResolver,
    /// Warnings and notifications of this run
    pub diagnostics: Diagnostics,
    assembly: AssemblyInfoRc,
    names: Box<dyn NameResolver>,
    types: Vec<ManagedTypeRc>,
}

impl ExportContext {
    /// Creates the context for exporting `types` of `assembly`.
    ///
    /// Names are resolved through the graph's alias annotations first, then through the
    /// preferred casings from `settings`.
    ///
    /// # Errors
    /// Returns [`crate::Error::NamesFile`] if a names file cannot be read.
    pub fn new(
        settings: ConverterSettings,
        loader: Box<dyn LibraryLoader>,
        assembly: &AssemblyInfoRc,
        types: Vec<ManagedTypeRc>,
    ) -> Result<Self> {
        let casings = SimpleNameResolver::from_sources(&settings.names, &settings.names_files)?;
        let names = ChainedNameResolver::new(AliasNameResolver::new(&types), casings);
        let resolver = TypeInfoResolver::new(loader, &settings).with_current_assembly(assembly);

        Ok(ExportContext {
            settings,
            resolver,
            diagnostics: Diagnostics::new(),
            assembly: assembly.clone(),
            names: Box::new(names),
            types,
        })
    }

    /// Replaces the name resolver.
    #[must_use]
    pub fn with_names(mut self, names: Box<dyn NameResolver>) -> Self {
        self.names = names;
        self
    }

    /// The assembly being exported.
    #[must_use]
    pub fn assembly(&self) -> &AssemblyInfoRc {
        &self.assembly
    }

    /// Types being exported, in input order.
    #[must_use]
    pub fn types(&self) -> &[ManagedTypeRc] {
        &self.types
    }

    /// Finds an exported type by full name, or by simple name if no full name matches.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<&ManagedTypeRc> {
        self.types
            .iter()
            .find(|ty| ty.full_name() == name)
            .or_else(|| self.types.iter().find(|ty| ty.name == name))
    }

    /// Identity of the library being produced, honoring `override_tlb_id`.
    #[must_use]
    pub fn library_identity(&self) -> TypeLibraryIdentity {
        let mut identity = TypeLibraryIdentity::for_assembly(&self.assembly, self.resolver.hasher());
        if let Some(guid) = self.settings.override_tlb_id {
            identity.guid = guid;
        }
        identity
    }

    /// Returns the exported spelling for `target`.
    #[must_use]
    pub fn mapped_name(&self, target: NameTarget<'_>, default: &str) -> String {
        self.names.mapped_name(target, default)
    }

    /// Returns a projector over this context's resolver and diagnostics.
    pub fn projector(&mut self) -> TypeProjector<'_> {
        TypeProjector::new(&mut self.resolver, &self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::typesystem::{AssemblyInfo, TypeBuilder, Version},
        test::fixtures::{assembly, MockLoader},
    };
    use uguid::guid;

    #[test]
    fn test_find_type() {
        let asm = assembly();
        let widget = TypeBuilder::class(&asm, "Demo.Ui", "Widget").build();
        let context = ExportContext::new(
            ConverterSettings::default(),
            Box::new(MockLoader::default()),
            &asm,
            vec![widget],
        )
        .unwrap();

        assert!(context.find_type("Demo.Ui.Widget").is_some());
        assert!(context.find_type("Widget").is_some());
        assert!(context.find_type("Gadget").is_none());
    }

    #[test]
    fn test_library_identity_override() {
        let asm = AssemblyInfo::new("Demo", Version::new(2, 1, 0, 0))
            .with_guid(guid!("aaaaaaaa-0000-0000-0000-000000000001"))
            .into_rc();
        let context = ExportContext::new(
            ConverterSettings::default(),
            Box::new(MockLoader::default()),
            &asm,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(context.library_identity().guid, guid!("aaaaaaaa-0000-0000-0000-000000000001"));
        assert_eq!(context.library_identity().major, 2);

        let override_id = guid!("bbbbbbbb-0000-0000-0000-000000000001");
        let context = ExportContext::new(
            ConverterSettings::default().with_override_tlb_id(override_id),
            Box::new(MockLoader::default()),
            &asm,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(context.library_identity().guid, override_id);
    }

    #[test]
    fn test_names_chain() {
        let asm = assembly();
        let widget = TypeBuilder::class(&asm, "Demo", "Widget").alias("gadget").build();
        let context = ExportContext::new(
            ConverterSettings::default().with_names(["Gadget"]),
            Box::new(MockLoader::default()),
            &asm,
            vec![widget.clone()],
        )
        .unwrap();

        assert_eq!(context.mapped_name(NameTarget::Type(&widget), "Widget"), "Gadget");
    }
}
