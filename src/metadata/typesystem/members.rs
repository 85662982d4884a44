use crate::metadata::{
    marshalling::MarshalHint,
    typesystem::{ManagedTypeRc, TypeFlavor},
};

/// Annotations attached to a method, property or field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberAnnotations {
    /// Explicit visibility; `None` inherits the declaring type's visibility
    pub com_visible: Option<bool>,
    /// Explicit dispatch ID
    pub dispatch_id: Option<i32>,
    /// Name to use in the type library instead of the member name
    pub alias: Option<String>,
    /// Keep the native signature instead of transforming the return value into an HRESULT
    pub preserve_sig: bool,
    /// Help string
    pub description: Option<String>,
    /// Marshalling hint for the return value, property value or field
    pub marshal: Option<MarshalHint>,
}

impl MemberAnnotations {
    /// Returns false only if the member explicitly opts out of COM visibility.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.com_visible != Some(false)
    }
}

/// Annotations attached to a method parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterAnnotations {
    /// Marshalling hint
    pub marshal: Option<MarshalHint>,
    /// Declared `[In]`
    pub is_in: bool,
    /// Declared `[Out]` or `out`
    pub is_out: bool,
    /// Declared as the return value
    pub is_retval: bool,
    /// Declared `[Optional]`
    pub is_optional: bool,
    /// Carries a default value
    pub has_default: bool,
    /// Name to use in the type library instead of the parameter name
    pub alias: Option<String>,
}

/// A method parameter.
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// Parameter name
    pub name: String,
    /// Declared type, a [`TypeFlavor::ByRef`] wrapper for `ref`/`out` parameters
    pub ty: ManagedTypeRc,
    /// Declarative annotations
    pub annotations: ParameterAnnotations,
}

impl ParamDef {
    /// Creates a parameter without annotations.
    pub fn new(name: impl Into<String>, ty: &ManagedTypeRc) -> Self {
        ParamDef {
            name: name.into(),
            ty: ty.clone(),
            annotations: ParameterAnnotations::default(),
        }
    }

    /// Attaches a marshalling hint.
    #[must_use]
    pub fn marshal(mut self, hint: MarshalHint) -> Self {
        self.annotations.marshal = Some(hint);
        self
    }

    /// Marks the parameter `[In]`.
    #[must_use]
    pub fn input(mut self) -> Self {
        self.annotations.is_in = true;
        self
    }

    /// Marks the parameter `[Out]`.
    #[must_use]
    pub fn output(mut self) -> Self {
        self.annotations.is_out = true;
        self
    }

    /// Marks the parameter optional, with or without a default value.
    #[must_use]
    pub fn optional(mut self, has_default: bool) -> Self {
        self.annotations.is_optional = true;
        self.annotations.has_default = has_default;
        self
    }

    /// Sets the exported name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.annotations.alias = Some(alias.into());
        self
    }

    /// Returns true if the parameter is passed by reference.
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        self.ty.flavor == TypeFlavor::ByRef
    }
}

/// A method, or a property accessor.
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Method name, `get_X`/`set_X` for accessors
    pub name: String,
    /// Return type, `None` for void
    pub returns: Option<ManagedTypeRc>,
    /// Parameters in declaration order
    pub params: Vec<ParamDef>,
    /// Declares its own generic parameters
    pub is_generic: bool,
    /// Declarative annotations
    pub annotations: MemberAnnotations,
}

impl MethodDef {
    /// Creates a method returning `returns`.
    pub fn new(name: impl Into<String>, returns: Option<&ManagedTypeRc>) -> Self {
        MethodDef {
            name: name.into(),
            returns: returns.cloned(),
            params: Vec::new(),
            is_generic: false,
            annotations: MemberAnnotations::default(),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    /// Sets an explicit dispatch ID.
    #[must_use]
    pub fn dispatch_id(mut self, id: i32) -> Self {
        self.annotations.dispatch_id = Some(id);
        self
    }

    /// Sets explicit visibility.
    #[must_use]
    pub fn com_visible(mut self, visible: bool) -> Self {
        self.annotations.com_visible = Some(visible);
        self
    }

    /// Keeps the native signature.
    #[must_use]
    pub fn preserve_sig(mut self) -> Self {
        self.annotations.preserve_sig = true;
        self
    }

    /// Attaches a marshalling hint to the return value.
    #[must_use]
    pub fn marshal_return(mut self, hint: MarshalHint) -> Self {
        self.annotations.marshal = Some(hint);
        self
    }

    /// Marks the method as generic.
    #[must_use]
    pub fn generic(mut self) -> Self {
        self.is_generic = true;
        self
    }

    /// Sets the exported name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.annotations.alias = Some(alias.into());
        self
    }

    /// Sets the help string.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.annotations.description = Some(description.into());
        self
    }
}

/// A property with its accessors.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Property type
    pub ty: ManagedTypeRc,
    /// `get_` accessor
    pub getter: Option<MethodDef>,
    /// `set_` accessor
    pub setter: Option<MethodDef>,
    /// Declarative annotations
    pub annotations: MemberAnnotations,
}

impl PropertyDef {
    /// Creates a property with a getter and, if `writable`, a setter.
    ///
    /// `index` lists the indexer parameters, shared by both accessors.
    pub fn new(
        name: impl Into<String>,
        ty: &ManagedTypeRc,
        writable: bool,
        index: Vec<ParamDef>,
    ) -> Self {
        let name = name.into();

        let mut getter = MethodDef::new(format!("get_{name}"), Some(ty));
        getter.params = index.clone();

        let setter = writable.then(|| {
            let mut setter = MethodDef::new(format!("set_{name}"), None);
            setter.params = index;
            setter.params.push(ParamDef::new("value", ty));
            setter
        });

        PropertyDef {
            name,
            ty: ty.clone(),
            getter: Some(getter),
            setter,
            annotations: MemberAnnotations::default(),
        }
    }

    /// Attaches a marshalling hint to the property value, on both accessors.
    #[must_use]
    pub fn marshal(mut self, hint: MarshalHint) -> Self {
        self.annotations.marshal = Some(hint);
        if let Some(getter) = self.getter.as_mut() {
            getter.annotations.marshal = Some(hint);
        }
        if let Some(value) = self
            .setter
            .as_mut()
            .and_then(|setter| setter.params.last_mut())
        {
            value.annotations.marshal = Some(hint);
        }
        self
    }

    /// Sets an explicit dispatch ID.
    #[must_use]
    pub fn dispatch_id(mut self, id: i32) -> Self {
        self.annotations.dispatch_id = Some(id);
        self
    }

    /// Sets explicit visibility.
    #[must_use]
    pub fn com_visible(mut self, visible: bool) -> Self {
        self.annotations.com_visible = Some(visible);
        self
    }

    /// Sets the exported name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.annotations.alias = Some(alias.into());
        self
    }
}

/// A field of a struct or an enum constant.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: ManagedTypeRc,
    /// Literal value for enum constants
    pub constant: Option<i64>,
    /// Static field, not part of the instance layout
    pub is_static: bool,
    /// Declarative annotations
    pub annotations: MemberAnnotations,
}

impl FieldDef {
    /// Creates an instance field.
    pub fn new(name: impl Into<String>, ty: &ManagedTypeRc) -> Self {
        FieldDef {
            name: name.into(),
            ty: ty.clone(),
            constant: None,
            is_static: false,
            annotations: MemberAnnotations::default(),
        }
    }

    /// Creates a literal enum constant.
    pub fn constant(name: impl Into<String>, ty: &ManagedTypeRc, value: i64) -> Self {
        FieldDef {
            constant: Some(value),
            is_static: true,
            ..FieldDef::new(name, ty)
        }
    }

    /// Attaches a marshalling hint.
    #[must_use]
    pub fn marshal(mut self, hint: MarshalHint) -> Self {
        self.annotations.marshal = Some(hint);
        self
    }

    /// Sets the exported name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.annotations.alias = Some(alias.into());
        self
    }
}

/// A member of an interface-like type, in declaration order.
#[derive(Debug, Clone)]
pub enum MemberDef {
    /// A plain method
    Method(MethodDef),
    /// A property, expanded into its accessors on export
    Property(PropertyDef),
}

impl MemberDef {
    /// Returns the declared member name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            MemberDef::Method(method) => &method.name,
            MemberDef::Property(property) => &property.name,
        }
    }

    /// Returns the member annotations.
    #[must_use]
    pub fn annotations(&self) -> &MemberAnnotations {
        match self {
            MemberDef::Method(method) => &method.annotations,
            MemberDef::Property(property) => &property.annotations,
        }
    }
}
