//! Name resolution for exported identifiers.
//!
//! Type libraries are case-insensitive, and the first casing a library sees for an identifier
//! wins for the whole library. Callers therefore supply preferred casings up front. On top of
//! that, types and members may carry an alias annotation that replaces their name outright.
//!
//! # Key Components
//!
//! - [`NameResolver`] - Trait consulted by every layout for every exported name
//! - [`SimpleNameResolver`] - Preferred casings from a list or names files
//! - [`AliasNameResolver`] - Names from alias annotations of the type graph
//! - [`NameTarget`] - What a name is being computed for
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::typelib::names::SimpleNameResolver;
//!
//! let names = SimpleNameResolver::new(["GetHTML", "gethtml", "URL"]);
//! assert_eq!(names.get_mapped_name("GETHTML"), "GetHTML");
//! assert_eq!(names.get_mapped_name("url"), "URL");
//! assert_eq!(names.get_mapped_name("Other"), "Other");
//! ```

use std::{collections::HashMap, fs, path::Path};

use crate::{
    metadata::typesystem::{ManagedType, ManagedTypeRc, MemberDef},
    Error, Result,
};

/// The element an exported name is computed for.
#[derive(Debug, Clone, Copy)]
pub enum NameTarget<'a> {
    /// A type
    Type(&'a ManagedType),
    /// A method or property of `declaring`
    Member {
        /// Declaring type
        declaring: &'a ManagedType,
        /// Declared member name
        member: &'a str,
    },
    /// A parameter of a method of `declaring`
    Parameter {
        /// Declaring type
        declaring: &'a ManagedType,
        /// Declared method name
        method: &'a str,
        /// Declared parameter name
        parameter: &'a str,
    },
    /// A constant of an enumeration
    EnumConstant {
        /// The enumeration
        declaring: &'a ManagedType,
        /// Declared constant name
        field: &'a str,
    },
    /// A free-standing identifier
    Plain(&'a str),
}

impl NameTarget<'_> {
    /// Returns the declared name of the target.
    #[must_use]
    pub fn source_name(&self) -> &str {
        match self {
            NameTarget::Type(ty) => &ty.name,
            NameTarget::Member { member, .. } => member,
            NameTarget::Parameter { parameter, .. } => parameter,
            NameTarget::EnumConstant { field, .. } => field,
            NameTarget::Plain(name) => name,
        }
    }
}

/// Maps exported identifiers to their final spelling.
pub trait NameResolver {
    /// Returns the name to export for `target`, given the computed `default`.
    ///
    /// `default` may differ from the target's declared name, for example when an overload
    /// has been renamed to `Name_2` or an enum constant prefixed with its type name.
    fn mapped_name(&self, target: NameTarget<'_>, default: &str) -> String;
}

/// Preferred casings: first case-insensitive occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct SimpleNameResolver {
    names: HashMap<String, String>,
}

impl SimpleNameResolver {
    /// Builds the resolver from a list of preferred casings.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolver = SimpleNameResolver::default();
        resolver.extend(names);
        resolver
    }

    /// Builds the resolver from a list and any number of names files.
    ///
    /// Names files hold one name per line; blank lines and surrounding whitespace are
    /// ignored. List entries take precedence over file entries.
    ///
    /// # Errors
    /// Returns [`crate::Error::NamesFile`] if a file cannot be read.
    pub fn from_sources<P: AsRef<Path>>(names: &[String], files: &[P]) -> Result<Self> {
        let mut resolver = SimpleNameResolver::new(names);

        for path in files {
            let path = path.as_ref();
            let content = fs::read_to_string(path).map_err(|source| Error::NamesFile {
                path: path.to_path_buf(),
                source,
            })?;

            resolver.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty()),
            );
        }

        Ok(resolver)
    }

    fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            self.names
                .entry(name.to_lowercase())
                .or_insert_with(|| name.to_string());
        }
    }

    /// Returns the preferred casing of `candidate`, or `candidate` unchanged.
    #[must_use]
    pub fn get_mapped_name(&self, candidate: &str) -> String {
        self.names
            .get(&candidate.to_lowercase())
            .cloned()
            .unwrap_or_else(|| candidate.to_string())
    }

    /// Returns the number of known names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no names are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameResolver for SimpleNameResolver {
    fn mapped_name(&self, _target: NameTarget<'_>, default: &str) -> String {
        self.get_mapped_name(default)
    }
}

/// Names taken from alias annotations of the type graph.
///
/// Explicitly invisible types contribute nothing. Enum constants whose computed name is
/// `{Enum}_{Field}` are re-prefixed with the enum's alias.
#[derive(Debug, Clone, Default)]
pub struct AliasNameResolver {
    types: HashMap<String, String>,
    members: HashMap<(String, String), String>,
    parameters: HashMap<(String, String, String), String>,
    constants: HashMap<(String, String), String>,
}

impl AliasNameResolver {
    /// Collects the aliases of `types` and their members.
    #[must_use]
    pub fn new(types: &[ManagedTypeRc]) -> Self {
        let mut resolver = AliasNameResolver::default();

        for ty in types.iter().filter(|ty| ty.annotations.com_visible != Some(false)) {
            let type_key = ty.full_name();
            if let Some(alias) = &ty.annotations.alias {
                resolver.types.insert(type_key.clone(), alias.clone());
            }

            for (_, member) in ty.members.iter() {
                if let Some(alias) = &member.annotations().alias {
                    resolver
                        .members
                        .entry((type_key.clone(), member.name().to_string()))
                        .or_insert_with(|| alias.clone());
                }

                let methods = match member {
                    MemberDef::Method(method) => vec![method],
                    MemberDef::Property(property) => {
                        property.getter.iter().chain(property.setter.iter()).collect()
                    }
                };
                for method in methods {
                    for param in &method.params {
                        if let Some(alias) = &param.annotations.alias {
                            resolver
                                .parameters
                                .entry((type_key.clone(), method.name.clone(), param.name.clone()))
                                .or_insert_with(|| alias.clone());
                        }
                    }
                }
            }

            for (_, field) in ty.fields.iter() {
                if let Some(alias) = &field.annotations.alias {
                    resolver
                        .constants
                        .entry((type_key.clone(), field.name.clone()))
                        .or_insert_with(|| alias.clone());
                }
            }
        }

        resolver
    }
}

impl NameResolver for AliasNameResolver {
    fn mapped_name(&self, target: NameTarget<'_>, default: &str) -> String {
        let mapped = match target {
            NameTarget::Type(ty) => self.types.get(&ty.full_name()).cloned(),
            NameTarget::Member { declaring, member } => self
                .members
                .get(&(declaring.full_name(), member.to_string()))
                .cloned(),
            NameTarget::Parameter {
                declaring,
                method,
                parameter,
            } => self
                .parameters
                .get(&(declaring.full_name(), method.to_string(), parameter.to_string()))
                .cloned(),
            NameTarget::EnumConstant { declaring, field } => {
                if let Some(alias) = self.constants.get(&(declaring.full_name(), field.to_string())) {
                    Some(alias.clone())
                } else {
                    let prefix = format!("{}_", declaring.name);
                    match (self.types.get(&declaring.full_name()), default.strip_prefix(&prefix)) {
                        (Some(alias), Some(rest)) => Some(format!("{alias}_{rest}")),
                        _ => None,
                    }
                }
            }
            NameTarget::Plain(_) => None,
        };

        mapped.unwrap_or_else(|| default.to_string())
    }
}

/// Applies aliases first, then preferred casings.
pub struct ChainedNameResolver<A: NameResolver, B: NameResolver> {
    first: A,
    second: B,
}

impl<A: NameResolver, B: NameResolver> ChainedNameResolver<A, B> {
    /// Runs `first`, then feeds its result to `second`.
    pub fn new(first: A, second: B) -> Self {
        ChainedNameResolver { first, second }
    }
}

impl<A: NameResolver, B: NameResolver> NameResolver for ChainedNameResolver<A, B> {
    fn mapped_name(&self, target: NameTarget<'_>, default: &str) -> String {
        let aliased = self.first.mapped_name(target, default);
        self.second.mapped_name(target, &aliased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::typesystem::{FieldDef, MethodDef, ParamDef, TypeBuilder, TypeFlavor},
        test::{
            fixtures::{assembly, scalar},
            scratch_dir,
        },
    };

    #[test]
    fn test_first_occurrence_wins() {
        let names = SimpleNameResolver::new(["Count", "COUNT", "count"]);
        assert_eq!(names.len(), 1);
        assert_eq!(names.get_mapped_name("cOuNt"), "Count");
    }

    #[test]
    fn test_miss_returns_candidate() {
        let names = SimpleNameResolver::new(Vec::<String>::new());
        assert!(names.is_empty());
        assert_eq!(names.get_mapped_name("Whatever"), "Whatever");
        assert_eq!(names.mapped_name(NameTarget::Plain("x"), "Value_2"), "Value_2");
    }

    #[test]
    fn test_names_files() {
        let dir = scratch_dir("names");
        let path = dir.join("names.txt");
        fs::write(&path, "  Url \n\nHTML\nhtml\n").unwrap();

        let names = SimpleNameResolver::from_sources(&["URL".to_string()], &[&path]).unwrap();
        assert_eq!(names.get_mapped_name("url"), "URL");
        assert_eq!(names.get_mapped_name("Html"), "HTML");

        let missing = SimpleNameResolver::from_sources(&[], &[dir.join("missing.txt")]);
        assert!(matches!(missing, Err(Error::NamesFile { .. })));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_alias_resolver() {
        let asm = assembly();
        let int32 = scalar(TypeFlavor::I4);

        let widget = TypeBuilder::interface(&asm, "Demo", "IWidget")
            .alias("IGizmo")
            .build();
        widget.add_method(
            MethodDef::new("Spin", None)
                .alias("Rotate")
                .param(ParamDef::new("turns", &int32).alias("count")),
        );

        let color = TypeBuilder::enumeration(&asm, "Demo", "Shade").alias("Tint").build();
        color.add_field(FieldDef::constant("Dark", &int32, 1));
        color.add_field(FieldDef::constant("Light", &int32, 2).alias("Bright"));

        let hidden = TypeBuilder::interface(&asm, "Demo", "IHidden")
            .alias("ISeen")
            .com_visible(false)
            .build();

        let names = AliasNameResolver::new(&[widget.clone(), color.clone(), hidden.clone()]);

        assert_eq!(names.mapped_name(NameTarget::Type(&widget), "IWidget"), "IGizmo");
        assert_eq!(names.mapped_name(NameTarget::Type(&hidden), "IHidden"), "IHidden");
        assert_eq!(
            names.mapped_name(
                NameTarget::Member { declaring: &widget, member: "Spin" },
                "Spin"
            ),
            "Rotate"
        );
        assert_eq!(
            names.mapped_name(
                NameTarget::Parameter { declaring: &widget, method: "Spin", parameter: "turns" },
                "turns"
            ),
            "count"
        );
        assert_eq!(
            names.mapped_name(
                NameTarget::EnumConstant { declaring: &color, field: "Dark" },
                "Shade_Dark"
            ),
            "Tint_Dark"
        );
        assert_eq!(
            names.mapped_name(
                NameTarget::EnumConstant { declaring: &color, field: "Light" },
                "Shade_Light"
            ),
            "Bright"
        );
    }

    #[test]
    fn test_chained_resolver() {
        let asm = assembly();
        let widget = TypeBuilder::interface(&asm, "Demo", "IWidget")
            .alias("igizmo")
            .build();

        let names = ChainedNameResolver::new(
            AliasNameResolver::new(&[widget.clone()]),
            SimpleNameResolver::new(["IGizmo"]),
        );
        assert_eq!(names.mapped_name(NameTarget::Type(&widget), "IWidget"), "IGizmo");
    }
}
