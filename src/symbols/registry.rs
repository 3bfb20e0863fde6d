//! Metadata registry describing the type universe of a build.
//!
//! The frontend decodes the program and the standard library and feeds one
//! [`TypeDescriptor`] per type into the [`MetadataRegistry`] before linking starts. The
//! replacement resolver consults the registry for everything it would otherwise learn by
//! reflection: base type chains, declared and inherited methods, and fields by name.
//!
//! # Thread Safety
//!
//! The registry is backed by a `DashMap`, so a frontend may populate it from several
//! decoding threads at once. Once linking starts it is treated as read-only input and
//! shared between forked build sessions.
//!
//! # Examples
//!
//! ```rust
//! use mculink::symbols::{MetadataRegistry, MethodAttributes, TypeDescriptor, TypeName, TypeSig};
//!
//! let registry = MetadataRegistry::new();
//! registry.insert(
//!     TypeDescriptor::new(TypeName::new("System", "Math"))
//!         .with_base(TypeSig::named("System", "Object"))
//!         .with_method(
//!             "Sqrt",
//!             vec![TypeSig::named("System", "Double")],
//!             TypeSig::named("System", "Double"),
//!             MethodAttributes::PUBLIC | MethodAttributes::STATIC,
//!         ),
//! );
//!
//! assert!(registry.get(&TypeName::new("System", "Math")).is_some());
//! ```

use std::sync::Arc;

use bitflags::bitflags;
use dashmap::DashMap;

use crate::symbols::{MethodSig, TypeName, TypeSig};

/// Maximum length of a base type chain that is followed before giving up
const MAX_INHERITANCE_DEPTH: usize = 64;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Attributes of a method as seen by the linker
    pub struct MethodAttributes: u32 {
        /// Accessible by anyone
        const PUBLIC = 0x0001;
        /// Accessible only by the declaring type
        const PRIVATE = 0x0002;
        /// Static method, no `this`
        const STATIC = 0x0010;
        /// Virtual method
        const VIRTUAL = 0x0040;
        /// Abstract method without body
        const ABSTRACT = 0x0400;
        /// Special name (operators, accessors, constructors)
        const SPECIAL_NAME = 0x0800;
        /// Instance or type constructor
        const CONSTRUCTOR = 0x1000;
        /// Replacement matches on name and declaring replacement class only,
        /// ignoring generic type arguments
        const IGNORE_GENERIC_TYPES = 0x0001_0000;
    }
}

/// A method declared by a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Signature, declared on the open definition of the owning type
    pub sig: MethodSig,
    /// Visibility and kind
    pub attributes: MethodAttributes,
}

impl MethodDescriptor {
    /// Returns true for instance and type constructors
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.attributes.contains(MethodAttributes::CONSTRUCTOR) || self.sig.is_constructor()
    }

    /// Returns true if declared private
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.attributes.contains(MethodAttributes::PRIVATE)
    }

    /// Returns true for static methods
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.attributes.contains(MethodAttributes::STATIC)
    }

    /// Returns true for public methods
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.attributes.contains(MethodAttributes::PUBLIC)
    }
}

/// A field declared by a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: TypeSig,
    /// Static field
    pub is_static: bool,
}

/// Everything the linker needs to know about one type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// The definition name
    pub name: TypeName,
    /// Base type, `None` for `System.Object` and interfaces
    pub base: Option<TypeSig>,
    /// Implemented interfaces
    pub interfaces: Vec<TypeSig>,
    /// Declared methods, including constructors
    pub methods: Vec<MethodDescriptor>,
    /// Declared fields
    pub fields: Vec<FieldDescriptor>,
    /// Value type (struct or enum)
    pub is_value_type: bool,
}

impl TypeDescriptor {
    /// Create an empty descriptor for `name`
    pub fn new(name: TypeName) -> Self {
        TypeDescriptor {
            name,
            base: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            is_value_type: false,
        }
    }

    /// The type as seen from code: open for generic definitions
    #[must_use]
    pub fn type_sig(&self) -> TypeSig {
        TypeSig::Named(self.name.clone())
    }

    /// Set the base type
    #[must_use]
    pub fn with_base(mut self, base: TypeSig) -> Self {
        self.base = Some(base);
        self
    }

    /// Add an implemented interface
    #[must_use]
    pub fn with_interface(mut self, interface: TypeSig) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Declare a method on this type
    #[must_use]
    pub fn with_method(
        self,
        name: &str,
        params: Vec<TypeSig>,
        ret: TypeSig,
        attributes: MethodAttributes,
    ) -> Self {
        let sig = MethodSig::new(self.type_sig(), name, params, ret);
        self.with_method_sig(sig, attributes)
    }

    /// Declare a generic method definition on this type
    #[must_use]
    pub fn with_generic_method(
        self,
        name: &str,
        arity: u16,
        params: Vec<TypeSig>,
        ret: TypeSig,
        attributes: MethodAttributes,
    ) -> Self {
        let sig = MethodSig::new(self.type_sig(), name, params, ret).with_generic_arity(arity);
        self.with_method_sig(sig, attributes)
    }

    /// Declare a public instance constructor
    #[must_use]
    pub fn with_constructor(self, params: Vec<TypeSig>, attributes: MethodAttributes) -> Self {
        let sig = MethodSig::new(self.type_sig(), ".ctor", params, TypeSig::Void);
        self.with_method_sig(sig, attributes | MethodAttributes::CONSTRUCTOR)
    }

    /// Declare a method from a prepared signature
    #[must_use]
    pub fn with_method_sig(mut self, sig: MethodSig, attributes: MethodAttributes) -> Self {
        self.methods.push(MethodDescriptor { sig, attributes });
        self
    }

    /// Declare a field
    #[must_use]
    pub fn with_field(mut self, name: &str, field_type: TypeSig, is_static: bool) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            field_type,
            is_static,
        });
        self
    }

    /// Mark as value type
    #[must_use]
    pub fn value_type(mut self) -> Self {
        self.is_value_type = true;
        self
    }

    /// Find a declared field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Registry of every type known to a build, keyed by definition name.
///
/// Cloning copies the table; descriptors are immutable and shared between the copies.
#[derive(Debug, Default, Clone)]
pub struct MetadataRegistry {
    types: DashMap<TypeName, Arc<TypeDescriptor>>,
}

impl MetadataRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        MetadataRegistry {
            types: DashMap::new(),
        }
    }

    /// Register (or overwrite) a type descriptor
    pub fn insert(&self, descriptor: TypeDescriptor) {
        self.types
            .insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    /// Look up the descriptor of a definition
    #[must_use]
    pub fn get(&self, name: &TypeName) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).map(|entry| entry.value().clone())
    }

    /// Look up the descriptor of the definition behind `ty`
    #[must_use]
    pub fn get_sig(&self, ty: &TypeSig) -> Option<Arc<TypeDescriptor>> {
        ty.type_name().and_then(|name| self.get(name))
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns true if `ty` derives (directly or indirectly) from `base`.
    ///
    /// A type is not a subclass of itself. Chains through types missing from the registry
    /// end the walk.
    #[must_use]
    pub fn is_subclass_of(&self, ty: &TypeName, base: &TypeName) -> bool {
        let mut current = self.get(ty);
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let Some(descriptor) = current else {
                return false;
            };

            let Some(parent) = descriptor.base.as_ref().and_then(TypeSig::type_name) else {
                return false;
            };

            if parent == base {
                return true;
            }

            current = self.get(parent);
        }

        false
    }

    /// Methods of `ty`: declared ones, followed by inherited ones when `include_inherited`.
    ///
    /// Inherited methods keep their original declaring type. Constructors are never inherited.
    #[must_use]
    pub fn methods(&self, ty: &TypeName, include_inherited: bool) -> Vec<MethodDescriptor> {
        let mut result = Vec::new();
        let mut current = self.get(ty);
        let mut depth = 0;

        while let Some(descriptor) = current {
            if depth == 0 {
                result.extend(descriptor.methods.iter().cloned());
            } else {
                result.extend(
                    descriptor
                        .methods
                        .iter()
                        .filter(|m| !m.is_constructor() && !m.is_private())
                        .cloned(),
                );
            }

            depth += 1;
            if !include_inherited || depth >= MAX_INHERITANCE_DEPTH {
                break;
            }

            current = descriptor
                .base
                .as_ref()
                .and_then(TypeSig::type_name)
                .and_then(|base| self.get(base));
        }

        result
    }

    /// All registered type names within `prefix` (and its sub-namespaces when `include_sub`)
    #[must_use]
    pub fn types_in_namespace(&self, prefix: &str, include_sub: bool) -> Vec<TypeName> {
        let mut names: Vec<TypeName> = self
            .types
            .iter()
            .filter(|entry| entry.key().in_namespace(prefix, include_sub))
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}
