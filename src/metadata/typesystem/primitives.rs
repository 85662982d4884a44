//! Well-known managed type names.
//!
//! Maps between the fixed scalar and bridge [`TypeFlavor`]s and the full names they carry in
//! the runtime library, so that graphs built from reflected metadata classify the same way
//! as graphs built synthetically.

use crate::metadata::typesystem::TypeFlavor;

const WELL_KNOWN_TYPES: &[(&str, &str, TypeFlavor)] = &[
    ("System", "Void", TypeFlavor::Void),
    ("System", "Boolean", TypeFlavor::Boolean),
    ("System", "Char", TypeFlavor::Char),
    ("System", "SByte", TypeFlavor::I1),
    ("System", "Byte", TypeFlavor::U1),
    ("System", "Int16", TypeFlavor::I2),
    ("System", "UInt16", TypeFlavor::U2),
    ("System", "Int32", TypeFlavor::I4),
    ("System", "UInt32", TypeFlavor::U4),
    ("System", "Int64", TypeFlavor::I8),
    ("System", "UInt64", TypeFlavor::U8),
    ("System", "Single", TypeFlavor::R4),
    ("System", "Double", TypeFlavor::R8),
    ("System", "IntPtr", TypeFlavor::IntPtr),
    ("System", "UIntPtr", TypeFlavor::UIntPtr),
    ("System", "Decimal", TypeFlavor::Decimal),
    ("System", "DateTime", TypeFlavor::DateTime),
    ("System", "String", TypeFlavor::String),
    ("System", "Object", TypeFlavor::Object),
    ("System.Collections", "IEnumerator", TypeFlavor::Enumerator),
    ("System.Drawing", "Color", TypeFlavor::Color),
    ("System", "Guid", TypeFlavor::Guid),
    (
        "System.Runtime.InteropServices.ComTypes",
        "IDispatch",
        TypeFlavor::ComIDispatch,
    ),
    (
        "System.Runtime.InteropServices.ComTypes",
        "IUnknown",
        TypeFlavor::ComIUnknown,
    ),
    ("System", "Delegate", TypeFlavor::DelegateBase),
];

/// Classifies a well-known full name such as `System.Int32`.
///
/// Returns `None` for names that are not one of the fixed scalars or bridge shapes; those
/// are classified structurally by whoever builds the graph.
#[must_use]
pub fn flavor_for_fullname(full_name: &str) -> Option<TypeFlavor> {
    WELL_KNOWN_TYPES
        .iter()
        .find(|(namespace, name, _)| {
            full_name.len() == namespace.len() + name.len() + 1
                && full_name.starts_with(namespace)
                && full_name[namespace.len()..].starts_with('.')
                && full_name.ends_with(name)
        })
        .map(|(_, _, flavor)| *flavor)
}

/// Returns the `(namespace, name)` of a well-known flavor.
#[must_use]
pub fn well_known_name(flavor: TypeFlavor) -> Option<(&'static str, &'static str)> {
    WELL_KNOWN_TYPES
        .iter()
        .find(|(_, _, candidate)| *candidate == flavor)
        .map(|(namespace, name, _)| (*namespace, *name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavor_for_fullname() {
        let cases = vec![
            ("System.Int32", Some(TypeFlavor::I4)),
            ("System.Byte", Some(TypeFlavor::U1)),
            ("System.Collections.IEnumerator", Some(TypeFlavor::Enumerator)),
            ("System.Drawing.Color", Some(TypeFlavor::Color)),
            ("System.Delegate", Some(TypeFlavor::DelegateBase)),
            ("System.Int32x", None),
            ("SystemXInt32", None),
            ("Demo.Widget", None),
        ];

        for (name, expected) in cases {
            assert_eq!(flavor_for_fullname(name), expected, "{name}");
        }
    }

    #[test]
    fn test_well_known_name_roundtrip() {
        for (namespace, name, flavor) in WELL_KNOWN_TYPES {
            assert_eq!(well_known_name(*flavor), Some((*namespace, *name)));
            assert_eq!(
                flavor_for_fullname(&format!("{namespace}.{name}")),
                Some(*flavor)
            );
        }

        assert_eq!(well_known_name(TypeFlavor::Interface), None);
    }
}
