//! Resolution of original symbols to their embedded substitutes.
//!
//! The [`ReplacementResolver`] holds the active class rules (declared ones and those derived
//! for subclasses on first encounter) and the per-method mappings computed from them.
//!
//! # Resolution Order
//!
//! For a method `m` called from `caller`:
//!
//! 1. A mapping registered for `m` itself. Mappings are found by name first, then compared on
//!    the instantiated signature. A mapping flagged with
//!    [`MethodAttributes::IGNORE_GENERIC_TYPES`] only needs the same declaring definition.
//!    A mapping without substitute ("known missing") is fatal unless the replacement class
//!    offers the sentinel, in which case resolution continues below.
//! 2. If the declaring type of `m` is replaced, the replacement type is searched for a
//!    structural or operator match. Generic method definitions are instantiated with the
//!    generic arguments of `m` before comparing.
//! 3. The public static `NotSupportedException` sentinel of the replacement type.
//! 4. [`Error::MissingReplacement`].
//!
//! A method whose declaring type is not replaced and that has no mapping resolves to `None`.

use std::{collections::HashMap, sync::Arc};

use crate::{
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    replacement::{
        matching::{same_operator, same_signature, ClassPairs},
        ClassReplacement,
    },
    symbols::{MetadataRegistry, MethodAttributes, MethodSig, TypeName, TypeSig},
    token::TypeRedirect,
    Error, Result,
};

/// Name of the sentinel method a replacement class may provide for unsupported members
pub const NOT_SUPPORTED_SENTINEL: &str = "NotSupportedException";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveClass {
    original: TypeName,
    replacement: TypeName,
    include_subclasses: bool,
    include_privates: bool,
    derived: bool,
}

/// Original method and its substitute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMapping {
    /// The method to replace
    pub original: MethodSig,
    /// Its substitute, `None` if the replacement class does not implement it
    pub replacement: Option<MethodSig>,
    /// Match on name and declaring definition only
    pub ignore_generic_types: bool,
}

/// The replacement type standing in for `like`, carrying over its generic arguments
fn rebase(replacement: &TypeName, like: &TypeSig) -> TypeSig {
    match like {
        TypeSig::Generic { args, .. } if usize::from(replacement.arity) == args.len() => {
            TypeSig::Generic {
                definition: replacement.clone(),
                args: args.clone(),
            }
        }
        _ => TypeSig::Named(replacement.clone()),
    }
}

fn instantiate(template: &MethodSig, declaring: &TypeSig, generic_args: &[TypeSig]) -> MethodSig {
    let method = template.on_type(declaring);
    if template.is_generic_definition() && usize::from(template.generic_arity) == generic_args.len()
    {
        method.make_generic(generic_args)
    } else {
        method
    }
}

fn missing(method: &MethodSig, caller: Option<&MethodSig>) -> Error {
    Error::MissingReplacement {
        method: method.to_string(),
        caller: caller.map_or_else(|| "<none>".to_string(), ToString::to_string),
    }
}

/// Derived replacement state of a build session.
#[derive(Debug, Clone)]
pub struct ReplacementResolver {
    registry: Arc<MetadataRegistry>,
    diagnostics: Arc<Diagnostics>,
    classes: Vec<ActiveClass>,
    by_original: HashMap<TypeName, usize>,
    by_replacement: HashMap<TypeName, usize>,
    methods: HashMap<String, Vec<MethodMapping>>,
}

impl ReplacementResolver {
    /// Create a resolver without any rules
    #[must_use]
    pub fn new(registry: Arc<MetadataRegistry>, diagnostics: Arc<Diagnostics>) -> Self {
        ReplacementResolver {
            registry,
            diagnostics,
            classes: Vec::new(),
            by_original: HashMap::new(),
            by_replacement: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    /// Read type metadata from `registry` from now on
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<MetadataRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Report into `diagnostics` from now on
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Activate a class rule and map the methods of the original onto the replacement.
    ///
    /// # Errors
    /// Returns [`Error::UnknownType`] if either type is missing from the registry.
    pub fn add_class(&mut self, rule: &ClassReplacement) -> Result<()> {
        let original = rule
            .original
            .type_name()
            .ok_or_else(|| Error::UnknownType(rule.original.to_string()))?;
        let replacement = rule
            .replacement
            .type_name()
            .ok_or_else(|| Error::UnknownType(rule.replacement.to_string()))?;

        self.activate(ActiveClass {
            original: original.clone(),
            replacement: replacement.clone(),
            include_subclasses: rule.include_subclasses,
            include_privates: rule.include_privates,
            derived: false,
        })
    }

    fn activate(&mut self, active: ActiveClass) -> Result<()> {
        if self.classes.contains(&active) {
            return Ok(());
        }

        for name in [&active.original, &active.replacement] {
            if self.registry.get(name).is_none() {
                return Err(Error::UnknownType(name.to_string()));
            }
        }

        let index = self.classes.len();
        self.by_original
            .entry(active.original.clone())
            .or_insert(index);
        if !active.derived {
            self.by_replacement
                .entry(active.replacement.clone())
                .or_insert(index);
        }
        self.classes.push(active.clone());

        self.map_methods(&active);
        Ok(())
    }

    fn map_methods(&mut self, active: &ActiveClass) {
        let original_type = TypeSig::Named(active.original.clone());
        let replacement_methods = self.registry.methods(&active.replacement, false);

        let mut pending: Vec<MethodSig> = self
            .registry
            .methods(&active.original, active.include_subclasses)
            .into_iter()
            .filter(|m| !m.is_constructor() && (active.include_privates || !m.is_private()))
            .map(|m| {
                if m.sig.declaring == original_type {
                    m.sig
                } else {
                    m.sig.on_type(&original_type)
                }
            })
            .collect();

        let mut mappings = Vec::new();
        for candidate in replacement_methods.iter().filter(|m| !m.is_constructor()) {
            if candidate.sig.name == NOT_SUPPORTED_SENTINEL {
                continue;
            }

            let position = pending.iter().position(|original| {
                same_signature(&candidate.sig, original, &*self)
                    || same_operator(&candidate.sig, original, &*self)
            });

            if let Some(position) = position {
                mappings.push(MethodMapping {
                    original: pending.remove(position),
                    replacement: Some(candidate.sig.clone()),
                    ignore_generic_types: candidate
                        .attributes
                        .contains(MethodAttributes::IGNORE_GENERIC_TYPES),
                });
            } else {
                log::warn!("Method {} has nothing to replace", candidate.sig);
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::Replacement,
                        format!("Replacement method has no counterpart in {}", active.original),
                    )
                    .with_symbol(&candidate.sig),
                );
            }
        }

        let mut pending_ctors: Vec<MethodSig> = self
            .registry
            .methods(&active.original, false)
            .into_iter()
            .filter(|m| m.sig.name == ".ctor" && m.is_public() && !m.is_static())
            .map(|m| m.sig)
            .collect();

        for candidate in replacement_methods.iter().filter(|m| m.sig.name == ".ctor") {
            if let Some(position) = pending_ctors
                .iter()
                .position(|original| same_signature(&candidate.sig, original, &*self))
            {
                mappings.push(MethodMapping {
                    original: pending_ctors.remove(position),
                    replacement: Some(candidate.sig.clone()),
                    ignore_generic_types: false,
                });
            }
        }

        let known_missing = pending.len() + pending_ctors.len();
        mappings.extend(pending.into_iter().chain(pending_ctors).map(|original| MethodMapping {
            original,
            replacement: None,
            ignore_generic_types: false,
        }));

        log::debug!(
            "{} replaces {}: {} methods mapped, {} not implemented",
            active.replacement,
            active.original,
            mappings.len() - known_missing,
            known_missing
        );

        for mapping in mappings {
            self.insert_mapping(mapping);
        }
    }

    fn insert_mapping(&mut self, mapping: MethodMapping) {
        // Virtual resolution may point back at the original itself
        if mapping.replacement.as_ref() == Some(&mapping.original) {
            return;
        }

        self.methods
            .entry(mapping.original.name.clone())
            .or_default()
            .push(mapping);
    }

    /// Map a single method explicitly. A `None` replacement marks it as known missing.
    pub fn add_method(&mut self, original: MethodSig, replacement: Option<MethodSig>) {
        self.insert_mapping(MethodMapping {
            original,
            replacement,
            ignore_generic_types: false,
        });
    }

    fn matches_mapping(mapping: &MethodMapping, method: &MethodSig) -> bool {
        let declaring = &mapping.original.declaring;
        if declaring.generic_definition() != method.declaring.generic_definition() {
            return false;
        }

        if mapping.ignore_generic_types {
            return true;
        }

        if declaring.is_generic_instance() && *declaring != method.declaring {
            return false;
        }

        instantiate(&mapping.original, &method.declaring, &method.generic_args) == *method
    }

    /// The mapping registered for `method`, if any
    #[must_use]
    pub fn mapping(&self, method: &MethodSig) -> Option<&MethodMapping> {
        self.methods
            .get(&method.name)?
            .iter()
            .find(|mapping| Self::matches_mapping(mapping, method))
    }

    /// Returns true if a class rule names `ty` (or its definition) as original.
    ///
    /// Subclass rules not derived yet are not considered.
    #[must_use]
    pub fn is_replaced(&self, ty: &TypeSig) -> bool {
        ty.type_name()
            .is_some_and(|name| self.by_original.contains_key(name))
    }

    /// The type replacing `ty`, deriving a subclass rule on first encounter.
    ///
    /// # Errors
    /// Returns [`Error::UnknownType`] if a derived rule refers to an unregistered type.
    pub fn class_replacement(&mut self, ty: &TypeSig) -> Result<Option<TypeSig>> {
        let Some(name) = ty.type_name() else {
            return Ok(None);
        };

        if let Some(&index) = self.by_original.get(name) {
            return Ok(Some(rebase(&self.classes[index].replacement, ty)));
        }

        if self.by_replacement.contains_key(name) {
            return Ok(None);
        }

        let Some(base) = self
            .classes
            .iter()
            .find(|c| c.include_subclasses && self.registry.is_subclass_of(name, &c.original))
            .cloned()
        else {
            return Ok(None);
        };

        log::debug!("{name} inherits the replacement of {}", base.original);
        self.activate(ActiveClass {
            original: name.clone(),
            replacement: base.replacement.clone(),
            include_subclasses: true,
            include_privates: false,
            derived: true,
        })?;

        Ok(Some(rebase(&base.replacement, ty)))
    }

    /// The original type that `ty` replaces, if `ty` is a replacement class
    #[must_use]
    pub fn replaced_original(&self, ty: &TypeSig) -> Option<TypeSig> {
        let name = ty.type_name()?;
        let &index = self.by_replacement.get(name)?;
        Some(rebase(&self.classes[index].original, ty))
    }

    /// The `NotSupportedException` sentinel of `replacement`, if it declares one
    #[must_use]
    pub fn sentinel(&self, replacement: &TypeSig) -> Option<MethodSig> {
        let name = replacement.type_name()?;
        self.registry
            .get(name)?
            .methods
            .iter()
            .find(|m| m.sig.name == NOT_SUPPORTED_SENTINEL && m.is_public() && m.is_static())
            .map(|m| m.sig.on_type(replacement))
    }

    fn search_class(&self, method: &MethodSig, replacement: &TypeSig) -> Option<MethodSig> {
        let name = replacement.type_name()?;

        for candidate in self.registry.methods(name, false) {
            let sig = candidate.sig.on_type(replacement);
            if !sig.is_generic_definition()
                && (same_signature(&sig, method, self) || same_operator(&sig, method, self))
            {
                return Some(sig);
            }

            if sig.name == method.name
                && sig.params.len() == method.params.len()
                && method.is_constructed_generic()
                && sig.is_generic_definition()
                && usize::from(sig.generic_arity) == method.generic_args.len()
            {
                let instance = sig.make_generic(&method.generic_args);
                if same_signature(&instance, method, self) || same_operator(&instance, method, self)
                {
                    return Some(instance);
                }
            }
        }

        None
    }

    /// Resolve `method` to its substitute.
    ///
    /// Returns `Ok(None)` when `method` is used as is.
    ///
    /// # Errors
    /// Returns [`Error::MissingReplacement`] if the declaring type of `method` is replaced but
    /// neither a substitute nor the sentinel exists.
    pub fn resolve(
        &mut self,
        method: &MethodSig,
        caller: Option<&MethodSig>,
    ) -> Result<Option<MethodSig>> {
        if let Some(mapping) = self.mapping(method).cloned() {
            match mapping.replacement {
                Some(replacement) => {
                    let declaring = match replacement.declaring.type_name() {
                        Some(name) => rebase(name, &method.declaring),
                        None => replacement.declaring.clone(),
                    };
                    let resolved = instantiate(&replacement, &declaring, &method.generic_args);
                    return Ok((resolved != *method).then_some(resolved));
                }
                None => {
                    let has_sentinel = self
                        .class_replacement(&mapping.original.declaring)?
                        .and_then(|replacement| self.sentinel(&replacement))
                        .is_some();
                    if !has_sentinel {
                        return Err(missing(method, caller));
                    }
                }
            }
        }

        let Some(replacement) = self.class_replacement(&method.declaring)? else {
            return Ok(None);
        };

        if let Some(found) = self.search_class(method, &replacement) {
            return Ok(Some(found));
        }

        if let Some(sentinel) = self.sentinel(&replacement) {
            log::debug!("{method} is not supported, using {sentinel}");
            return Ok(Some(sentinel));
        }

        Err(missing(method, caller))
    }
}

impl ClassPairs for ReplacementResolver {
    fn are_paired(&self, a: &TypeName, b: &TypeName) -> bool {
        self.classes.iter().any(|c| {
            (c.original == *a && c.replacement == *b) || (c.original == *b && c.replacement == *a)
        })
    }
}

impl TypeRedirect for ReplacementResolver {
    fn redirect(&mut self, ty: &TypeSig) -> Result<Option<TypeSig>> {
        self.class_replacement(ty)
    }

    fn replaced_original(&self, ty: &TypeSig) -> Option<TypeSig> {
        ReplacementResolver::replaced_original(self, ty)
    }
}
