//! Declared replacement and suppression rules of a build.
//!
//! The [`ReplacementPolicy`] is what the frontend asked for, nothing derived. It is cloned
//! with the build session and can be finalized once the kernel snapshot is taken, after which
//! every registration fails with [`Error::PolicyFinalized`].

use std::collections::HashSet;

use crate::{
    symbols::{MethodSig, TypeName, TypeSig},
    Error, Result,
};

/// A class-level replacement rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassReplacement {
    /// The type to replace (open definition for generic types)
    pub original: TypeSig,
    /// The type providing the substitute implementation
    pub replacement: TypeSig,
    /// Apply the rule to every subclass of `original` as well
    pub include_subclasses: bool,
    /// Private methods of `original` need a replacement too
    pub include_privates: bool,
}

/// Explicit replacement of a single method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodReplacement {
    /// The method to replace
    pub original: MethodSig,
    /// The substitute, `None` if the method is known to be unavailable
    pub replacement: Option<MethodSig>,
}

/// Declared replacement and suppression rules.
#[derive(Debug, Clone, Default)]
pub struct ReplacementPolicy {
    classes: Vec<ClassReplacement>,
    methods: Vec<MethodReplacement>,
    suppressed_types: HashSet<TypeName>,
    suppressed_namespaces: Vec<(String, bool)>,
    finalized: bool,
}

impl ReplacementPolicy {
    /// Create an empty, open policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finalized {
            return Err(Error::PolicyFinalized);
        }
        Ok(())
    }

    /// Declare a class replacement.
    ///
    /// Returns false if the identical rule was declared before.
    ///
    /// # Errors
    /// Returns [`Error::PolicyFinalized`] after [`ReplacementPolicy::finalize`].
    pub fn add_class(&mut self, rule: ClassReplacement) -> Result<bool> {
        self.ensure_open()?;
        if self.classes.contains(&rule) {
            return Ok(false);
        }

        self.classes.push(rule);
        Ok(true)
    }

    /// Declare a single method replacement.
    ///
    /// # Errors
    /// Returns [`Error::PolicyFinalized`] after [`ReplacementPolicy::finalize`].
    pub fn add_method(
        &mut self,
        original: MethodSig,
        replacement: Option<MethodSig>,
    ) -> Result<()> {
        self.ensure_open()?;
        self.methods.push(MethodReplacement {
            original,
            replacement,
        });
        Ok(())
    }

    /// Exclude a type (all instantiations of its definition) from the build.
    ///
    /// # Errors
    /// Returns [`Error::PolicyFinalized`] after [`ReplacementPolicy::finalize`], or
    /// [`Error::UnknownType`] for types without a definition name.
    pub fn suppress_type(&mut self, ty: &TypeSig) -> Result<()> {
        self.ensure_open()?;
        let Some(name) = ty.type_name() else {
            return Err(Error::UnknownType(ty.to_string()));
        };

        self.suppressed_types.insert(name.clone());
        Ok(())
    }

    /// Exclude every type in `prefix` (and its sub-namespaces when `include_sub`).
    ///
    /// # Errors
    /// Returns [`Error::PolicyFinalized`] after [`ReplacementPolicy::finalize`].
    pub fn suppress_namespace(&mut self, prefix: &str, include_sub: bool) -> Result<()> {
        self.ensure_open()?;
        self.suppressed_namespaces.push((prefix.to_string(), include_sub));
        Ok(())
    }

    /// Returns true if `ty`, or the element type of an array or reference, is suppressed
    #[must_use]
    pub fn is_suppressed(&self, ty: &TypeSig) -> bool {
        let name = match ty {
            TypeSig::Array(elem) | TypeSig::ByRef(elem) => return self.is_suppressed(elem),
            other => other.type_name(),
        };

        name.is_some_and(|name| {
            self.suppressed_types.contains(name)
                || self
                    .suppressed_namespaces
                    .iter()
                    .any(|(prefix, include_sub)| name.in_namespace(prefix, *include_sub))
        })
    }

    /// Declared class replacements, in declaration order
    #[must_use]
    pub fn classes(&self) -> &[ClassReplacement] {
        &self.classes
    }

    /// Declared method replacements, in declaration order
    #[must_use]
    pub fn methods(&self) -> &[MethodReplacement] {
        &self.methods
    }

    /// Reject all further registrations
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Returns true once finalized
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> ClassReplacement {
        ClassReplacement {
            original: TypeSig::named("System", "String"),
            replacement: TypeSig::named("Embedded.Runtime", "MiniString"),
            include_subclasses: false,
            include_privates: false,
        }
    }

    #[test]
    fn test_duplicate_class_rule() {
        let mut policy = ReplacementPolicy::new();
        assert!(policy.add_class(rule()).unwrap());
        assert!(!policy.add_class(rule()).unwrap());
        assert_eq!(policy.classes().len(), 1);
    }

    #[test]
    fn test_finalized_rejects() {
        let mut policy = ReplacementPolicy::new();
        policy.finalize();
        assert!(matches!(policy.add_class(rule()), Err(Error::PolicyFinalized)));
        assert!(matches!(
            policy.suppress_namespace("System.IO", true),
            Err(Error::PolicyFinalized)
        ));
    }

    #[test]
    fn test_suppression() {
        let mut policy = ReplacementPolicy::new();
        policy
            .suppress_type(&TypeSig::definition("System.Collections.Generic", "HashSet`1", 1))
            .unwrap();
        policy.suppress_namespace("System.Net", false).unwrap();

        let hashset_int = TypeSig::Generic {
            definition: TypeName::generic("System.Collections.Generic", "HashSet`1", 1),
            args: vec![TypeSig::named("System", "Int32")],
        };
        assert!(policy.is_suppressed(&hashset_int));
        let dns_array = TypeSig::Array(Box::new(TypeSig::named("System.Net", "Dns")));
        assert!(policy.is_suppressed(&dns_array));
        assert!(!policy.is_suppressed(&TypeSig::named("System.Net.Sockets", "Socket")));
        assert!(!policy.is_suppressed(&TypeSig::named("System", "Int32")));
    }
}
