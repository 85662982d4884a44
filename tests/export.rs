//! End-to-end tests laying out a small assembly.
//!
//! The assembly under test declares a dual interface with properties, an `IUnknown`-derived
//! interface, a collection, two classes, a struct and an enumeration. `Widget` gets a class
//! interface, `Gadget` opts out of one:
//!
//! ```text
//! interface IShape      { int Width; int Height; int Depth; }
//! interface IEngine     { void Start(); void Stop(); void Reset(IShape shape); }
//! interface ICatalog    { int Count; IEnumerator GetEnumerator(); string Describe(); }
//! class Widget : IShape, IEngine, ICatalog
//! [ClassInterface(None)] class Gadget : IEngine, IShape
//! struct Point          { int X; double Y; }
//! enum Tint             { Red = 0, Green = 1, Blue = 2 }
//! ```

use tlbscope::{
    prelude::*,
    typelib::dispatch::{DISPATCH_BASE, DISPID_NEWENUM, VTABLE_BASE},
};

fn stdole() -> TypeLibraryRc {
    let entries = [
        ("GUID", Md5IdentityHasher.type_guid("stdole", "GUID"), TypeKind::Record),
        ("IEnumVARIANT", WELL_KNOWN::IID_IENUMVARIANT, TypeKind::Interface),
        ("IDispatch", WELL_KNOWN::IID_IDISPATCH, TypeKind::Interface),
        ("IUnknown", WELL_KNOWN::IID_IUNKNOWN, TypeKind::Interface),
    ];

    entries
        .into_iter()
        .fold(TypeLibrary::new(TypeLibraryIdentity::stdole()), |library, (name, guid, kind)| {
            library.with_type(TypeInfo::new(guid, name, kind).into_rc())
        })
        .into_rc()
}

/// Serves `stdole` as a registered library and nothing else.
struct Registry {
    stdole: TypeLibraryRc,
}

impl LibraryLoader for Registry {
    fn load_for_assembly(&mut self, _assembly: &AssemblyInfo) -> Option<TypeLibraryRc> {
        None
    }

    fn load_registered(
        &mut self,
        guid: uguid::Guid,
        major: u16,
        minor: u16,
        lcid: u32,
    ) -> Option<TypeLibraryRc> {
        self.stdole
            .identity
            .matches(guid, major, minor, lcid)
            .then(|| self.stdole.clone())
    }
}

fn well_known(flavor: TypeFlavor) -> ManagedTypeRc {
    TypeBuilder::well_known(flavor)
        .map(TypeBuilder::build)
        .expect("flavor has a well-known name")
}

fn demo_types(assembly: &AssemblyInfoRc) -> Vec<ManagedTypeRc> {
    let int = well_known(TypeFlavor::I4);
    let double = well_known(TypeFlavor::R8);
    let string = well_known(TypeFlavor::String);
    let enumerator = well_known(TypeFlavor::Enumerator);

    let shape = TypeBuilder::interface(assembly, "Demo", "IShape").build();
    for name in ["Width", "Height", "Depth"] {
        shape.add_property(PropertyDef::new(name, &int, true, Vec::new()));
    }

    let engine = TypeBuilder::interface(assembly, "Demo", "IEngine")
        .interface_kind(ComInterfaceType::IUnknown)
        .build();
    engine.add_method(MethodDef::new("Start", None));
    engine.add_method(MethodDef::new("Stop", None));
    engine.add_method(MethodDef::new("Reset", None).param(ParamDef::new("shape", &shape)));

    let catalog = TypeBuilder::interface(assembly, "Demo", "ICatalog").build();
    catalog.add_property(PropertyDef::new("Count", &int, false, Vec::new()));
    catalog.add_method(MethodDef::new("GetEnumerator", Some(&enumerator)));
    catalog.add_method(MethodDef::new("Describe", Some(&string)));

    let widget = TypeBuilder::class(assembly, "Demo", "Widget").build();
    widget.add_interface(&shape);
    widget.add_interface(&engine);
    widget.add_interface(&catalog);

    let gadget = TypeBuilder::class(assembly, "Demo", "Gadget")
        .class_interface(ClassInterfaceType::None)
        .build();
    gadget.add_interface(&engine);
    gadget.add_interface(&shape);

    let point = TypeBuilder::value_type(assembly, "Demo", "Point").build();
    point.add_field(FieldDef::new("X", &int));
    point.add_field(FieldDef::new("Y", &double));

    let tint = TypeBuilder::enumeration(assembly, "Demo", "Tint").build();
    for (value, name) in ["Red", "Green", "Blue"].iter().enumerate() {
        tint.add_field(FieldDef::constant(*name, &int, value as i64));
    }

    vec![shape, engine, catalog, widget, gadget, point, tint]
}

fn export() -> Result<(LibraryLayout, ExportContext)> {
    let assembly = AssemblyInfo::new("Demo", Version::new(1, 0, 0, 0)).into_rc();
    let loader = Registry { stdole: stdole() };
    let mut context = ExportContext::new(
        ConverterSettings::default(),
        Box::new(loader),
        &assembly,
        demo_types(&assembly),
    )?;

    let layout = LibraryLayout::build(&mut context)?;
    Ok((layout, context))
}

fn interface<'a>(layout: &'a LibraryLayout, name: &str) -> &'a InterfaceLayout {
    layout
        .interfaces
        .iter()
        .find(|interface| interface.name == name)
        .unwrap_or_else(|| panic!("interface {name} missing"))
}

fn coclass<'a>(layout: &'a LibraryLayout, name: &str) -> &'a CoClassLayout {
    layout
        .coclasses
        .iter()
        .find(|coclass| coclass.name == name)
        .unwrap_or_else(|| panic!("coclass {name} missing"))
}

#[test]
fn test_layout_counts() -> Result<()> {
    let (layout, context) = export()?;

    assert_eq!(layout.identity.name, "Demo");
    assert_eq!(layout.identity.major, 1);
    assert_eq!(layout.interfaces.len(), 3);
    assert_eq!(layout.class_interfaces.len(), 1);
    assert_eq!(layout.coclasses.len(), 2);
    assert_eq!(layout.records.len(), 1);
    assert_eq!(layout.enums.len(), 1);
    assert!(!context.diagnostics.has_errors());

    Ok(())
}

#[test]
fn test_property_ids_step_by_two() -> Result<()> {
    let (layout, _) = export()?;
    let shape = interface(&layout, "IShape");

    assert_eq!(shape.functions.len(), 6);
    assert_eq!(shape.function("Width").unwrap().dispatch_id, DISPATCH_BASE);
    assert_eq!(shape.function("Height").unwrap().dispatch_id, DISPATCH_BASE + 2);
    assert_eq!(shape.function("Depth").unwrap().dispatch_id, DISPATCH_BASE + 4);
    assert!(shape.base.as_ref().is_some_and(|base| base.name == "IDispatch"));

    Ok(())
}

#[test]
fn test_iunknown_methods_are_sequential() -> Result<()> {
    let (layout, _) = export()?;
    let engine = interface(&layout, "IEngine");

    let ids: Vec<_> = engine.functions.iter().map(|f| f.dispatch_id).collect();
    assert_eq!(ids, vec![VTABLE_BASE, VTABLE_BASE + 1, VTABLE_BASE + 2]);
    assert!(engine.base.as_ref().is_some_and(|base| base.name == "IUnknown"));

    let reset = engine.function("Reset").unwrap();
    assert_eq!(reset.params.len(), 1);
    assert_eq!(
        reset.params[0].descriptor.to_string(),
        "VT_PTR(VT_USERDEFINED(IShape))"
    );

    Ok(())
}

#[test]
fn test_enumerator_gets_newenum() -> Result<()> {
    let (layout, _) = export()?;
    let catalog = interface(&layout, "ICatalog");

    assert_eq!(
        catalog.function("GetEnumerator").unwrap().dispatch_id,
        DISPID_NEWENUM
    );
    assert_eq!(catalog.function("Count").unwrap().dispatch_id, DISPATCH_BASE);
    assert_eq!(catalog.function("Describe").unwrap().dispatch_id, DISPATCH_BASE + 2);

    Ok(())
}

#[test]
fn test_default_interface_is_first_listed() -> Result<()> {
    let (layout, _) = export()?;

    let widget = coclass(&layout, "Widget").to_type_info();
    let default = TypeInfoResolver::resolve_default_interface(&widget).unwrap();
    assert_eq!(default.name, "_Widget");
    let listed: Vec<_> = widget.implemented.iter().map(|entry| entry.target.name.as_str()).collect();
    assert_eq!(listed, vec!["_Widget", "IShape", "IEngine", "ICatalog"]);

    let gadget = coclass(&layout, "Gadget").to_type_info();
    let default = TypeInfoResolver::resolve_default_interface(&gadget).unwrap();
    assert_eq!(default.name, "IEngine");

    Ok(())
}

#[test]
fn test_class_interface_registered() -> Result<()> {
    let (layout, mut context) = export()?;

    let class_interface = &layout.class_interfaces[0];
    assert_eq!(class_interface.name, "_Widget");
    assert!(class_interface.functions.is_empty());

    let widget = context.find_type("Demo.Widget").cloned().expect("Widget is exported");
    let own = widget.guid(context.resolver.hasher())?;
    let expected = Md5IdentityHasher.class_interface_guid("Demo", "Widget", own);
    assert_eq!(class_interface.guid, expected);

    let resolved = context.resolver.resolve_type(&widget)?.expect("class interface resolves");
    assert_eq!(resolved.name, "_Widget");
    assert_eq!(resolved.guid, expected);

    Ok(())
}

#[test]
fn test_records_and_enums() -> Result<()> {
    let (layout, _) = export()?;

    let point = &layout.records[0];
    let fields: Vec<_> = point
        .fields
        .iter()
        .map(|field| (field.name.as_str(), field.descriptor.to_string()))
        .collect();
    assert_eq!(
        fields,
        vec![("X", "VT_I4".to_string()), ("Y", "VT_R8".to_string())]
    );

    let tint = &layout.enums[0];
    let constants: Vec<_> = tint
        .constants
        .iter()
        .map(|constant| (constant.name.as_str(), constant.value))
        .collect();
    assert_eq!(
        constants,
        vec![("Tint_Red", 0), ("Tint_Green", 1), ("Tint_Blue", 2)]
    );

    Ok(())
}

#[test]
fn test_add_library_is_idempotent() {
    let mut resolver = TypeInfoResolver::new(Box::new(NoLibraries), &ConverterSettings::default());
    let library = stdole();

    assert!(resolver.add_library(library.clone()));
    let types = resolver.type_count();
    assert!(!resolver.add_library(library));

    assert_eq!(resolver.library_count(), 1);
    assert_eq!(resolver.type_count(), types);
    assert!(resolver.resolve_guid(WELL_KNOWN::IID_IDISPATCH).is_some());
}
