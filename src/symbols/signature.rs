//! Canonical symbol keys for types, methods and fields.
//!
//! The frontend describes every symbol structurally. Two descriptions of the same symbol
//! compare equal and hash identically, independent of where they were produced, which is
//! what makes token assignment idempotent.

use std::fmt;

use crate::{Error, Result};

/// Namespace, name and generic arity of a type definition.
///
/// The arity is part of the identity: `List` and ``List`1`` are different definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    /// Type namespace (can be empty for global types)
    pub namespace: String,
    /// Type name, including a possible generic arity marker (e.g. ``List`1``)
    pub name: String,
    /// Number of generic parameters of the definition
    pub arity: u16,
}

impl TypeName {
    /// Create a non-generic type name
    pub fn new(namespace: &str, name: &str) -> Self {
        TypeName {
            namespace: namespace.to_string(),
            name: name.to_string(),
            arity: 0,
        }
    }

    /// Create the name of a generic definition with `arity` parameters
    pub fn generic(namespace: &str, name: &str, arity: u16) -> Self {
        TypeName {
            namespace: namespace.to_string(),
            name: name.to_string(),
            arity,
        }
    }

    /// Returns the full name (Namespace.Name) of the type
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }

    /// Returns true if `namespace` equals `prefix`, or starts with it when `include_sub` is set
    #[must_use]
    pub fn in_namespace(&self, prefix: &str, include_sub: bool) -> bool {
        if include_sub {
            self.namespace.starts_with(prefix)
        } else {
            self.namespace == prefix
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fullname())
    }
}

/// Structural description of a type as it is referenced from code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    /// No type, used as return type of procedures
    Void,
    /// A non-generic type, or an open generic definition when `arity > 0`
    Named(TypeName),
    /// A closed generic instantiation
    Generic {
        /// The generic definition being instantiated
        definition: TypeName,
        /// The type arguments, one per generic parameter
        args: Vec<TypeSig>,
    },
    /// Single dimensional array of the element type
    Array(Box<TypeSig>),
    /// Managed reference to the element type
    ByRef(Box<TypeSig>),
    /// Generic parameter of the declaring type (`!n`)
    TypeParam(u16),
    /// Generic parameter of the method (`!!n`)
    MethodParam(u16),
}

impl TypeSig {
    /// Shortcut for a non-generic named type
    pub fn named(namespace: &str, name: &str) -> Self {
        TypeSig::Named(TypeName::new(namespace, name))
    }

    /// Shortcut for an open generic definition
    pub fn definition(namespace: &str, name: &str, arity: u16) -> Self {
        TypeSig::Named(TypeName::generic(namespace, name, arity))
    }

    /// Instantiate the open generic definition `definition` with `args`.
    ///
    /// # Errors
    /// Returns [`Error::TypeConstruction`] if `definition` is not an open generic definition,
    /// if the number of arguments does not match its arity, or if one of the arguments is
    /// itself an open definition.
    pub fn make_generic(definition: &TypeSig, args: Vec<TypeSig>) -> Result<TypeSig> {
        let TypeSig::Named(name) = definition else {
            return Err(Error::TypeConstruction(format!(
                "{definition} is not a generic type definition"
            )));
        };

        if name.arity == 0 {
            return Err(Error::TypeConstruction(format!(
                "{name} is not a generic type definition"
            )));
        }

        if usize::from(name.arity) != args.len() {
            return Err(Error::TypeConstruction(format!(
                "{name} expects {} type arguments, got {}",
                name.arity,
                args.len()
            )));
        }

        if let Some(open) = args.iter().find(|arg| arg.is_open_definition()) {
            return Err(Error::TypeConstruction(format!(
                "{open} cannot be used as a type argument of {name}"
            )));
        }

        Ok(TypeSig::Generic {
            definition: name.clone(),
            args,
        })
    }

    /// The definition name of a named or generic type
    #[must_use]
    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            TypeSig::Named(name) => Some(name),
            TypeSig::Generic { definition, .. } => Some(definition),
            _ => None,
        }
    }

    /// The open definition of a closed generic, or the type itself for everything else
    #[must_use]
    pub fn generic_definition(&self) -> TypeSig {
        match self {
            TypeSig::Generic { definition, .. } => TypeSig::Named(definition.clone()),
            other => other.clone(),
        }
    }

    /// Type arguments of a closed generic, empty otherwise
    #[must_use]
    pub fn type_args(&self) -> &[TypeSig] {
        match self {
            TypeSig::Generic { args, .. } => args,
            _ => &[],
        }
    }

    /// Returns true for open generic definitions such as `List<>`
    #[must_use]
    pub fn is_open_definition(&self) -> bool {
        matches!(self, TypeSig::Named(name) if name.arity > 0)
    }

    /// Returns true for closed generic instantiations such as `List<int>`
    #[must_use]
    pub fn is_generic_instance(&self) -> bool {
        matches!(self, TypeSig::Generic { .. })
    }

    /// Returns true for any generic type, open or closed
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.is_open_definition() || self.is_generic_instance()
    }

    /// Returns true if the definition of this type is `namespace.name`
    #[must_use]
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.type_name()
            .is_some_and(|n| n.namespace == namespace && n.name == name)
    }

    /// Replace generic parameters by the given arguments.
    ///
    /// Parameters without a matching argument are kept as they are.
    #[must_use]
    pub fn substitute(&self, type_args: &[TypeSig], method_args: &[TypeSig]) -> TypeSig {
        match self {
            TypeSig::TypeParam(index) => type_args
                .get(usize::from(*index))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeSig::MethodParam(index) => method_args
                .get(usize::from(*index))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeSig::Generic { definition, args } => TypeSig::Generic {
                definition: definition.clone(),
                args: args
                    .iter()
                    .map(|arg| arg.substitute(type_args, method_args))
                    .collect(),
            },
            TypeSig::Array(elem) => {
                TypeSig::Array(Box::new(elem.substitute(type_args, method_args)))
            }
            TypeSig::ByRef(elem) => {
                TypeSig::ByRef(Box::new(elem.substitute(type_args, method_args)))
            }
            TypeSig::Void | TypeSig::Named(_) => self.clone(),
        }
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Void => write!(f, "void"),
            TypeSig::Named(name) => write!(f, "{name}"),
            TypeSig::Generic { definition, args } => {
                write!(f, "{definition}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            TypeSig::Array(elem) => write!(f, "{elem}[]"),
            TypeSig::ByRef(elem) => write!(f, "{elem}&"),
            TypeSig::TypeParam(index) => write!(f, "!{index}"),
            TypeSig::MethodParam(index) => write!(f, "!!{index}"),
        }
    }
}

/// Canonical identity of a method: declaring type, name, parameter types and generic arity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSig {
    /// The type declaring this method (closed when called on a generic instance)
    pub declaring: TypeSig,
    /// Method name, `.ctor` / `.cctor` for constructors
    pub name: String,
    /// Parameter types, without the implicit `this`
    pub params: Vec<TypeSig>,
    /// Return type
    pub ret: TypeSig,
    /// Number of generic method parameters
    pub generic_arity: u16,
    /// Generic method arguments for a constructed generic method, empty otherwise
    pub generic_args: Vec<TypeSig>,
}

impl MethodSig {
    /// Create a non-generic method signature
    pub fn new(declaring: TypeSig, name: &str, params: Vec<TypeSig>, ret: TypeSig) -> Self {
        MethodSig {
            declaring,
            name: name.to_string(),
            params,
            ret,
            generic_arity: 0,
            generic_args: Vec::new(),
        }
    }

    /// Set the generic arity, turning this into a generic method definition
    #[must_use]
    pub fn with_generic_arity(mut self, arity: u16) -> Self {
        self.generic_arity = arity;
        self
    }

    /// Returns true if this is a constructor
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }

    /// Returns true for generic method definitions (`M<>`)
    #[must_use]
    pub fn is_generic_definition(&self) -> bool {
        self.generic_arity > 0 && self.generic_args.is_empty()
    }

    /// Returns true for constructed generic methods (`M<int>`)
    #[must_use]
    pub fn is_constructed_generic(&self) -> bool {
        !self.generic_args.is_empty()
    }

    /// Instantiate the generic method definition with `args`
    #[must_use]
    pub fn make_generic(&self, args: &[TypeSig]) -> MethodSig {
        MethodSig {
            declaring: self.declaring.clone(),
            name: self.name.clone(),
            params: self.params.iter().map(|p| p.substitute(&[], args)).collect(),
            ret: self.ret.substitute(&[], args),
            generic_arity: self.generic_arity,
            generic_args: args.to_vec(),
        }
    }

    /// Re-home this method onto `declaring`, substituting the type parameters of an open
    /// declaring type with the arguments of the new one
    #[must_use]
    pub fn on_type(&self, declaring: &TypeSig) -> MethodSig {
        let type_args = declaring.type_args();
        MethodSig {
            declaring: declaring.clone(),
            name: self.name.clone(),
            params: self
                .params
                .iter()
                .map(|p| p.substitute(type_args, &[]))
                .collect(),
            ret: self.ret.substitute(type_args, &[]),
            generic_arity: self.generic_arity,
            generic_args: self.generic_args.clone(),
        }
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}::{}", self.ret, self.declaring, self.name)?;
        if !self.generic_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.generic_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        } else if self.generic_arity > 0 {
            write!(f, "`{}", self.generic_arity)?;
        }
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}

/// Canonical identity of a field: declaring type and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSig {
    /// The type declaring this field
    pub declaring: TypeSig,
    /// Field name
    pub name: String,
}

impl FieldSig {
    /// Create a field signature
    pub fn new(declaring: TypeSig, name: &str) -> Self {
        FieldSig {
            declaring,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for FieldSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring, self.name)
    }
}
