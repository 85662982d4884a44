//! Type and library identities.
//!
//! Every entry of a COM type library is keyed by a GUID, and every library by the tuple
//! `(name, major, minor, GUID, LCID)`. Managed types either declare their GUID or have one
//! derived deterministically from their name; the class interface generated for a class and
//! the library generated for an assembly get content-derived GUIDs as well.
//!
//! Derivation goes through the [`IdentityHasher`] trait so that tests can substitute a
//! trivial digest. The default [`Md5IdentityHasher`] uses MD5 over the same byte layouts as
//! existing exporters, so derived library GUIDs match the ones they produce.
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::metadata::identity::{IdentityHasher, Md5IdentityHasher};
//! use uguid::guid;
//!
//! let hasher = Md5IdentityHasher;
//! let seed = guid!("6b7f8c4e-1f7a-4f4e-9a52-0c3f4d0b1a11");
//!
//! let first = hasher.class_interface_guid("Demo", "Widget", seed);
//! let second = hasher.class_interface_guid("Demo", "Widget", seed);
//! assert_eq!(first, second);
//! assert_ne!(first, hasher.class_interface_guid("Demo", "Gadget", seed));
//! ```

use std::fmt;

use md5::{Digest, Md5};
use uguid::Guid;

use crate::metadata::typesystem::AssemblyInfo;

/// Locale identifier for language-neutral libraries.
pub const LCID_NEUTRAL: u32 = 0;

/// Identity of a single type info: its GUID.
pub type TypeIdentity = Guid;

/// Well-known interface, type and library GUIDs.
#[allow(non_snake_case)]
pub mod WELL_KNOWN {
    use uguid::{guid, Guid};

    /// `IUnknown`
    pub const IID_IUNKNOWN: Guid = guid!("00000000-0000-0000-c000-000000000046");
    /// `IDispatch`
    pub const IID_IDISPATCH: Guid = guid!("00020400-0000-0000-c000-000000000046");
    /// `IEnumVARIANT`
    pub const IID_IENUMVARIANT: Guid = guid!("00020404-0000-0000-c000-000000000046");
    /// `OLE_COLOR` alias in the OLE automation library
    pub const TDID_OLECOLOR: Guid = guid!("66504301-be0f-101a-8bbb-00aa00300cab");
    /// The OLE automation library (`stdole`)
    pub const TLBID_OLE: Guid = guid!("00020430-0000-0000-c000-000000000046");
    /// Major version of the OLE automation library
    pub const TLBID_OLE_MAJOR: u16 = 2;
    /// Minor version of the OLE automation library
    pub const TLBID_OLE_MINOR: u16 = 0;
    /// Seed mixed into library GUIDs derived for assemblies
    pub const RUNTIME_SEED: Guid = guid!("69f9cbc9-da05-11d1-9408-0000f8083460");
}

/// Identity of a type library.
///
/// Two identities are equal only when all five components are equal. Use
/// [`crate::typelib::resolver::TypeInfoResolver::find_library`] to look a library up
/// ignoring its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeLibraryIdentity {
    /// Library name
    pub name: String,
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Library GUID
    pub guid: Guid,
    /// Locale identifier
    pub lcid: u32,
}

impl TypeLibraryIdentity {
    /// Creates a language-neutral library identity.
    pub fn new(name: impl Into<String>, guid: Guid, major: u16, minor: u16) -> Self {
        TypeLibraryIdentity {
            name: name.into(),
            major,
            minor,
            guid,
            lcid: LCID_NEUTRAL,
        }
    }

    /// Returns the identity of the OLE automation library.
    #[must_use]
    pub fn stdole() -> Self {
        TypeLibraryIdentity::new(
            "stdole",
            WELL_KNOWN::TLBID_OLE,
            WELL_KNOWN::TLBID_OLE_MAJOR,
            WELL_KNOWN::TLBID_OLE_MINOR,
        )
    }

    /// Returns the identity of the library generated for `assembly`.
    ///
    /// The GUID is the one declared on the assembly, or derived via `hasher`.
    pub fn for_assembly(assembly: &AssemblyInfo, hasher: &dyn IdentityHasher) -> Self {
        let guid = assembly
            .guid
            .unwrap_or_else(|| hasher.library_guid(assembly));
        TypeLibraryIdentity::new(
            assembly.name.clone(),
            guid,
            assembly.version.major,
            assembly.version.minor,
        )
    }

    /// Returns true if GUID, version and LCID match, regardless of the library name.
    #[must_use]
    pub fn matches(&self, guid: Guid, major: u16, minor: u16, lcid: u32) -> bool {
        self.guid == guid && self.major == major && self.minor == minor && self.lcid == lcid
    }
}

impl fmt::Display for TypeLibraryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {{{}}} {}.{} lcid {}",
            self.name, self.guid, self.major, self.minor, self.lcid
        )
    }
}

/// Digest used to derive identities from names.
///
/// Implementors only provide [`IdentityHasher::digest`]; the derivations are shared.
pub trait IdentityHasher {
    /// Hashes the concatenation of `chunks` into 16 bytes.
    fn digest(&self, chunks: &[&[u8]]) -> [u8; 16];

    /// GUID of the class interface generated for class `namespace.name`.
    ///
    /// `seed` is the class's own identity, so two classes with the same name in different
    /// assemblies produce different class interfaces.
    fn class_interface_guid(&self, namespace: &str, name: &str, seed: Guid) -> Guid {
        let label = format!("{namespace}._{name}");
        Guid::from_bytes(self.digest(&[label.as_bytes(), &seed.to_bytes()]))
    }

    /// GUID of a type that declares none.
    fn type_guid(&self, assembly: &str, full_name: &str) -> Guid {
        Guid::from_bytes(self.digest(&[assembly.as_bytes(), &[0u8], full_name.as_bytes()]))
    }

    /// GUID of the library generated for an assembly that declares none.
    ///
    /// The hashed version record repeats the major version in its minor field; a non-zero
    /// minor version follows the record on its own.
    fn library_guid(&self, assembly: &AssemblyInfo) -> Guid {
        let version = &assembly.version;
        let mut version_bytes = Vec::with_capacity(10);
        for part in [version.major, version.major, version.build, version.revision] {
            version_bytes.extend_from_slice(&part.to_le_bytes());
        }
        if version.minor != 0 {
            version_bytes.extend_from_slice(&version.minor.to_le_bytes());
        }

        let public_key = assembly.public_key.as_deref().unwrap_or(&[]);
        Guid::from_bytes(self.digest(&[
            WELL_KNOWN::RUNTIME_SEED.to_bytes().as_slice(),
            assembly.name.as_bytes(),
            b"Typelib",
            &version_bytes,
            public_key,
        ]))
    }
}

/// [`IdentityHasher`] backed by MD5.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5IdentityHasher;

impl IdentityHasher for Md5IdentityHasher {
    fn digest(&self, chunks: &[&[u8]]) -> [u8; 16] {
        let mut hasher = Md5::new();
        for chunk in chunks {
            hasher.update(*chunk);
        }

        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{AssemblyInfo, Version};
    use uguid::guid;

    #[test]
    fn test_md5_digest_known_value() {
        // MD5("abc") = 900150983cd24fb0d6963f7d28e17f72
        let digest = Md5IdentityHasher.digest(&[b"a", b"bc"]);
        assert_eq!(
            digest,
            [
                0x90, 0x01, 0x50, 0x98, 0x3c, 0xd2, 0x4f, 0xb0, 0xd6, 0x96, 0x3f, 0x7d, 0x28,
                0xe1, 0x7f, 0x72
            ]
        );
    }

    #[test]
    fn test_class_interface_guid_depends_on_seed() {
        let hasher = Md5IdentityHasher;
        let a = hasher.class_interface_guid("Demo", "Widget", guid!("00000001-0000-0000-0000-000000000000"));
        let b = hasher.class_interface_guid("Demo", "Widget", guid!("00000002-0000-0000-0000-000000000000"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_library_guid_prefers_declared() {
        let declared = guid!("11111111-2222-3333-4444-555555555555");
        let mut assembly = AssemblyInfo::new("Demo", Version::new(1, 2, 0, 0));

        let derived = TypeLibraryIdentity::for_assembly(&assembly, &Md5IdentityHasher);
        assert_ne!(derived.guid, declared);
        assert_eq!(derived.major, 1);
        assert_eq!(derived.minor, 2);
        assert_eq!(derived.lcid, LCID_NEUTRAL);

        assembly.guid = Some(declared);
        let identity = TypeLibraryIdentity::for_assembly(&assembly, &Md5IdentityHasher);
        assert_eq!(identity.guid, declared);
        assert_eq!(identity.name, "Demo");
    }

    #[test]
    fn test_library_guid_depends_on_version() {
        let v1 = AssemblyInfo::new("Demo", Version::new(1, 0, 0, 0));
        let v2 = AssemblyInfo::new("Demo", Version::new(2, 0, 0, 0));
        assert_ne!(
            Md5IdentityHasher.library_guid(&v1),
            Md5IdentityHasher.library_guid(&v2)
        );
    }

    #[test]
    fn test_library_guid_known_values() {
        let cases = [
            (Version::new(1, 2, 3, 4), guid!("f2e65f93-6bc9-39b4-935a-021a714fdddb")),
            (Version::new(1, 0, 0, 0), guid!("7b47254f-5d31-dd21-c7de-63041b2a81a5")),
            (Version::new(2, 0, 1, 0), guid!("62d1d0b6-dbee-1da4-e357-6d70534e800b")),
        ];

        for (version, expected) in cases {
            let assembly = AssemblyInfo::new("Demo", version);
            assert_eq!(Md5IdentityHasher.library_guid(&assembly), expected, "{version:?}");
        }
    }

    #[test]
    fn test_identity_equality_covers_all_components() {
        let a = TypeLibraryIdentity::new("Lib", guid!("11111111-2222-3333-4444-555555555555"), 1, 0);
        let mut renamed = a.clone();
        renamed.name = "Other".to_string();

        assert_ne!(a, renamed);
        assert!(renamed.matches(a.guid, 1, 0, LCID_NEUTRAL));
        assert!(!renamed.matches(a.guid, 1, 1, LCID_NEUTRAL));
    }
}
