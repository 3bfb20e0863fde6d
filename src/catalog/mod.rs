//! The symbol catalog of a build session.
//!
//! A [`Catalog`] owns everything a build accumulates: the token allocator, the replacement
//! policy with its resolver, and the class and method declarations selected for upload. The
//! frontend drives it with a sequence of "ensure this symbol has a token" and "add this
//! declaration" calls; the loader then reads the finished catalog.
//!
//! # Architecture
//!
//! Token requests flow through replacement resolution before they reach the allocator, so the
//! token of a replaced method is the token of its substitute. Declarations are validated
//! against the same rules: adding a symbol that should have been replaced is a build error,
//! raised long before any device I/O.
//!
//! # Key Components
//!
//! - [`Catalog`] - The build session
//! - [`ClassDeclaration`], [`MethodDeclaration`] - Declarations as uploaded to the device
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use mculink::prelude::*;
//!
//! let registry = MetadataRegistry::new();
//! registry.insert(TypeDescriptor::new(TypeName::new("App", "Program")));
//!
//! let mut catalog = Catalog::new(LinkerSettings::ram_only(), Arc::new(registry));
//! let program = TypeSig::named("App", "Program");
//! let token = catalog.type_token(&program)?;
//! assert!(catalog.register_class(ClassDeclaration::new(program, token))?);
//! # Ok::<(), mculink::Error>(())
//! ```

mod declarations;

use std::{collections::HashMap, sync::Arc};

use crate::{
    config::LinkerSettings,
    diagnostics::{DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    replacement::{ClassReplacement, ReplacementPolicy, ReplacementResolver},
    snapshot::Snapshot,
    symbols::{FieldSig, MetadataRegistry, MethodSig, Symbol, TypeSig},
    token::{Token, TokenAllocator},
    Error, Result,
};

pub use declarations::{
    ClassDeclaration, ClassMember, MemberKind, MethodDeclaration, MethodFlags,
};

/// Size of the method table of the execution engine
pub const MAX_METHODS: usize = (1 << 14) - 1;

/// Largest number of local variable slots of a method
pub const MAX_LOCALS: u16 = 255;

/// Largest evaluation stack depth of a method
pub const MAX_STACK: u16 = 255;

/// Maximum length of a chain of method replacements
const MAX_REPLACEMENT_DEPTH: usize = 16;

/// The state of one build session.
///
/// Cloning is not supported directly, use [`Catalog::fork`] to branch a session.
#[derive(Debug)]
pub struct Catalog {
    settings: LinkerSettings,
    registry: Arc<MetadataRegistry>,
    diagnostics: Arc<Diagnostics>,
    allocator: TokenAllocator,
    policy: ReplacementPolicy,
    resolver: ReplacementResolver,
    classes: Vec<ClassDeclaration>,
    class_index: HashMap<TypeSig, usize>,
    methods: Vec<MethodDeclaration>,
    method_index: HashMap<MethodSig, usize>,
    array_implementations: HashMap<TypeSig, MethodSig>,
    entry_point: Option<MethodSig>,
    startup_token: Option<Token>,
    kernel_snapshot: Option<Snapshot>,
}

impl Catalog {
    /// Start a build session over the types of `registry`
    #[must_use]
    pub fn new(settings: LinkerSettings, registry: Arc<MetadataRegistry>) -> Self {
        let diagnostics = Arc::new(Diagnostics::new());
        Catalog {
            settings,
            resolver: ReplacementResolver::new(registry.clone(), diagnostics.clone()),
            registry,
            diagnostics,
            allocator: TokenAllocator::new(),
            policy: ReplacementPolicy::new(),
            classes: Vec::new(),
            class_index: HashMap::new(),
            methods: Vec::new(),
            method_index: HashMap::new(),
            array_implementations: HashMap::new(),
            entry_point: None,
            startup_token: None,
            kernel_snapshot: None,
        }
    }

    /// Branch this session into an independent copy.
    ///
    /// Every table is deep-copied, the metadata registry included. The fork collects its own
    /// diagnostics.
    ///
    /// # Errors
    /// Returns [`Error::SettingsMismatch`] if `settings` differ from the settings of this
    /// session.
    pub fn fork(&self, settings: LinkerSettings) -> Result<Catalog> {
        if settings != self.settings {
            return Err(Error::SettingsMismatch);
        }

        let diagnostics = Arc::new(Diagnostics::new());
        let registry = Arc::new(self.registry.as_ref().clone());
        Ok(Catalog {
            settings,
            resolver: self
                .resolver
                .clone()
                .with_registry(registry.clone())
                .with_diagnostics(diagnostics.clone()),
            registry,
            diagnostics,
            allocator: self.allocator.clone(),
            policy: self.policy.clone(),
            classes: self.classes.clone(),
            class_index: self.class_index.clone(),
            methods: self.methods.clone(),
            method_index: self.method_index.clone(),
            array_implementations: self.array_implementations.clone(),
            entry_point: self.entry_point.clone(),
            startup_token: self.startup_token,
            kernel_snapshot: self.kernel_snapshot.clone(),
        })
    }

    /// Settings of this session
    #[must_use]
    pub fn settings(&self) -> &LinkerSettings {
        &self.settings
    }

    /// The metadata registry
    #[must_use]
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Non-fatal findings collected so far
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The token tables
    #[must_use]
    pub fn tokens(&self) -> &TokenAllocator {
        &self.allocator
    }

    /// The declared replacement rules
    #[must_use]
    pub fn policy(&self) -> &ReplacementPolicy {
        &self.policy
    }

    /// Declare that `original` is replaced by `replacement` on the device.
    ///
    /// Returns false if the identical rule was declared before.
    ///
    /// # Errors
    /// Returns [`Error::PolicyFinalized`] once the kernel snapshot was taken, or
    /// [`Error::UnknownType`] if either type is missing from the registry.
    pub fn register_class_replacement(
        &mut self,
        original: TypeSig,
        replacement: TypeSig,
        include_subclasses: bool,
        include_privates: bool,
    ) -> Result<bool> {
        if self.policy.is_finalized() {
            return Err(Error::PolicyFinalized);
        }

        let rule = ClassReplacement {
            original,
            replacement,
            include_subclasses,
            include_privates,
        };
        self.resolver.add_class(&rule)?;
        self.policy.add_class(rule)
    }

    /// Replace a single method. A `None` replacement marks `original` as unavailable.
    ///
    /// # Errors
    /// Returns [`Error::PolicyFinalized`] once the kernel snapshot was taken.
    pub fn register_method_replacement(
        &mut self,
        original: MethodSig,
        replacement: Option<MethodSig>,
    ) -> Result<()> {
        self.policy.add_method(original.clone(), replacement.clone())?;
        self.resolver.add_method(original, replacement);
        Ok(())
    }

    /// Exclude a type from the build.
    ///
    /// # Errors
    /// See [`ReplacementPolicy::suppress_type`].
    pub fn suppress_type(&mut self, ty: &TypeSig) -> Result<()> {
        self.policy.suppress_type(ty)?;
        log::debug!("Suppressing {ty}");
        Ok(())
    }

    /// Exclude every type of a namespace from the build.
    ///
    /// Returns the number of registered types the rule currently covers.
    ///
    /// # Errors
    /// Returns [`Error::PolicyFinalized`] once the kernel snapshot was taken.
    pub fn suppress_namespace(&mut self, prefix: &str, include_sub: bool) -> Result<usize> {
        self.policy.suppress_namespace(prefix, include_sub)?;
        let count = self.registry.types_in_namespace(prefix, include_sub).len();
        log::debug!("Suppressing namespace {prefix}: {count} types");
        if count == 0 {
            self.diagnostics.report(
                DiagnosticSeverity::Info,
                DiagnosticCategory::Catalog,
                format!("Suppressed namespace {prefix} contains no registered type"),
            );
        }
        Ok(count)
    }

    /// Returns true if `ty` is excluded from the build
    #[must_use]
    pub fn is_suppressed(&self, ty: &TypeSig) -> bool {
        self.policy.is_suppressed(ty)
    }

    /// Return the token of `ty`, redirected to its replacement where one applies.
    ///
    /// # Errors
    /// See [`TokenAllocator::type_token`].
    pub fn type_token(&mut self, ty: &TypeSig) -> Result<Token> {
        self.allocator.type_token(ty, &mut self.resolver)
    }

    /// Return the token of `method`, following replacements first.
    ///
    /// `caller` is only used to report a missing replacement.
    ///
    /// # Errors
    /// Returns [`Error::MissingReplacement`] if `method` needs a replacement that does not
    /// exist, or [`Error::RecursionLimit`] for cyclic replacement chains.
    pub fn method_token(
        &mut self,
        method: &MethodSig,
        caller: Option<&MethodSig>,
    ) -> Result<Token> {
        self.method_token_at(method, caller, 0)
    }

    fn method_token_at(
        &mut self,
        method: &MethodSig,
        caller: Option<&MethodSig>,
        depth: usize,
    ) -> Result<Token> {
        if depth >= MAX_REPLACEMENT_DEPTH {
            return Err(Error::RecursionLimit(MAX_REPLACEMENT_DEPTH));
        }

        match self.resolver.resolve(method, caller)? {
            Some(replacement) => self.method_token_at(&replacement, caller, depth + 1),
            None => self.allocator.method_token(method),
        }
    }

    /// The field whose token stands for `field` on the device.
    ///
    /// A field of a replacement class aliases the same-named field of the original type.
    fn canonical_field(&self, field: &FieldSig) -> FieldSig {
        let Some(original) = self.resolver.replaced_original(&field.declaring) else {
            return field.clone();
        };

        let declares = self
            .registry
            .get_sig(&original)
            .is_some_and(|descriptor| descriptor.field(&field.name).is_some());
        if declares {
            FieldSig::new(original, &field.name)
        } else {
            field.clone()
        }
    }

    /// Return the token of `field`, assigning one on first use.
    ///
    /// # Errors
    /// See [`TokenAllocator::field_token`].
    pub fn register_field_token(&mut self, field: &FieldSig) -> Result<Token> {
        let field = self.canonical_field(field);
        self.allocator.field_token(&field)
    }

    /// Return the token of `field` and attach its initializer bytes.
    ///
    /// Fields of suppressed types get a token but never carry data onto the device.
    ///
    /// # Errors
    /// See [`TokenAllocator::field_token_with_data`].
    pub fn register_field_token_with_data(
        &mut self,
        field: &FieldSig,
        data: Vec<u8>,
    ) -> Result<Token> {
        let field = self.canonical_field(field);
        if self.is_suppressed(&field.declaring) {
            log::debug!("Dropping initializer of {field}, its type is suppressed");
            return self.allocator.field_token(&field);
        }

        self.allocator.field_token_with_data(&field, data)
    }

    /// Return the token of a string constant.
    ///
    /// # Errors
    /// Returns [`Error::StringTooLong`] for strings longer than 65535 bytes.
    pub fn register_string(&mut self, text: &str) -> Result<Token> {
        self.allocator.string_token(text)
    }

    /// Add a class declaration.
    ///
    /// Returns false if the class is suppressed or already declared.
    ///
    /// # Errors
    /// Returns [`Error::ReplacedSymbolRegistered`] if the class has a replacement.
    pub fn register_class(&mut self, class: ClassDeclaration) -> Result<bool> {
        if self.is_suppressed(&class.ty) || self.class_index.contains_key(&class.ty) {
            return Ok(false);
        }

        if self.resolver.class_replacement(&class.ty)?.is_some() {
            return Err(Error::ReplacedSymbolRegistered(class.ty.to_string()));
        }

        log::debug!("Adding class {class}");
        self.class_index.insert(class.ty.clone(), self.classes.len());
        self.classes.push(class);
        Ok(true)
    }

    /// Add a method declaration, assigning its index in the method table.
    ///
    /// Returns false if the declaring type is suppressed or the method is already declared.
    ///
    /// # Errors
    /// - [`Error::TooManyMethods`], [`Error::TooManyLocals`], [`Error::StackTooDeep`] when the
    ///   declaration exceeds the capacity of the execution engine
    /// - [`Error::ReplacedSymbolRegistered`] if the method has a replacement
    /// - [`Error::ReplacementNotImplemented`] if the method is known to be unavailable
    /// - [`Error::IdentityCollision`] if its token already names another symbol
    pub fn register_method(&mut self, mut method: MethodDeclaration) -> Result<bool> {
        if self.methods.len() >= MAX_METHODS {
            return Err(Error::TooManyMethods(MAX_METHODS));
        }

        if method.max_locals > MAX_LOCALS {
            return Err(Error::TooManyLocals {
                method: method.method.to_string(),
                count: method.max_locals,
            });
        }

        if method.max_stack > MAX_STACK {
            return Err(Error::StackTooDeep {
                method: method.method.to_string(),
                depth: method.max_stack,
            });
        }

        if self.is_suppressed(&method.method.declaring)
            || self.method_index.contains_key(&method.method)
        {
            return Ok(false);
        }

        if let Some(mapping) = self.resolver.mapping(&method.method) {
            return Err(match mapping.replacement {
                Some(_) => Error::ReplacedSymbolRegistered(method.method.to_string()),
                None => Error::ReplacementNotImplemented(method.method.to_string()),
            });
        }

        // Members the registry did not list when the rule was added have no mapping
        if self.resolver.class_replacement(&method.method.declaring)?.is_some() {
            return Err(Error::ReplacedSymbolRegistered(method.method.to_string()));
        }

        match self.allocator.resolve(method.token, &self.diagnostics) {
            None => {}
            Some(Symbol::Method(ref existing)) if *existing == method.method => {}
            Some(existing) => {
                return Err(Error::IdentityCollision {
                    token: method.token,
                    existing: existing.to_string(),
                    incoming: method.method.to_string(),
                });
            }
        }

        // Bounded by MAX_METHODS
        #[allow(clippy::cast_possible_truncation)]
        let index = self.methods.len() as u16;
        method.index = index;

        if method.is_special() {
            log::debug!("Adding special method {method} at {index}");
        } else {
            log::debug!("Adding method {method} at {index}, {} bytes", method.code_len());
        }

        self.method_index.insert(method.method.clone(), self.methods.len());
        self.methods.push(method);
        Ok(true)
    }

    /// Returns true if `ty` is declared or suppressed
    #[must_use]
    pub fn has_definition(&self, ty: &TypeSig) -> bool {
        self.is_suppressed(ty) || self.class_index.contains_key(ty)
    }

    /// Returns true if `method`, or the substitute it resolves to, is declared.
    ///
    /// Methods of suppressed types count as present.
    ///
    /// # Errors
    /// Propagates resolution failures, see [`Catalog::method_token`].
    pub fn has_method(&mut self, method: &MethodSig, caller: Option<&MethodSig>) -> Result<bool> {
        if self.is_suppressed(&method.declaring) {
            return Ok(true);
        }

        let target = self
            .resolver
            .resolve(method, caller)?
            .unwrap_or_else(|| method.clone());
        Ok(self.method_index.contains_key(&target))
    }

    /// The declaration of `method`
    #[must_use]
    pub fn method(&self, method: &MethodSig) -> Option<&MethodDeclaration> {
        self.method_index.get(method).map(|&i| &self.methods[i])
    }

    /// The declaration of `ty`
    #[must_use]
    pub fn class(&self, ty: &TypeSig) -> Option<&ClassDeclaration> {
        self.class_index.get(ty).map(|&i| &self.classes[i])
    }

    /// Declared classes, in registration order
    #[must_use]
    pub fn classes(&self) -> &[ClassDeclaration] {
        &self.classes
    }

    /// Declared methods, ordered by their table index
    #[must_use]
    pub fn methods(&self) -> &[MethodDeclaration] {
        &self.methods
    }

    /// Record the `GetEnumerator` that serves `IList<T>` for the array type `array`.
    ///
    /// Arrays implement the generic list interfaces without declaring the methods, so the
    /// frontend names the implementation explicitly. A later call for the same array type
    /// replaces the earlier one.
    pub fn add_array_implementation(&mut self, array: TypeSig, get_enumerator: MethodSig) {
        log::debug!("{array} enumerates through {get_enumerator}");
        self.array_implementations.insert(array, get_enumerator);
    }

    /// The `GetEnumerator` registered for `array`
    #[must_use]
    pub fn array_implementation(&self, array: &TypeSig) -> Option<&MethodSig> {
        self.array_implementations.get(array)
    }

    /// The symbol behind `token`, see [`TokenAllocator::resolve`]
    #[must_use]
    pub fn resolve_token(&self, token: Token) -> Option<Symbol> {
        self.allocator.resolve(token, &self.diagnostics)
    }

    /// Set the method started after the upload
    pub fn set_entry_point(&mut self, method: MethodSig) {
        self.entry_point = Some(method);
    }

    /// The method started after the upload
    #[must_use]
    pub fn entry_point(&self) -> Option<&MethodSig> {
        self.entry_point.as_ref()
    }

    /// Set the token of the startup sequence written into the flash header
    pub fn set_startup_token(&mut self, token: Token) {
        self.startup_token = Some(token);
    }

    /// Token of the startup sequence, if set
    #[must_use]
    pub fn startup_token(&self) -> Option<Token> {
        self.startup_token
    }

    /// Snapshot of everything assigned so far
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let methods: Vec<Token> = self.methods.iter().map(|m| m.token).collect();
        let fields: Vec<Token> = self
            .allocator
            .constants()
            .filter(|f| !self.is_suppressed(&f.field.declaring))
            .map(|f| f.token)
            .collect();
        let types = self.allocator.type_tokens();

        let last = types.last().or_else(|| fields.last()).or_else(|| methods.last());
        let origin = last
            .and_then(|&token| self.resolve_token(token))
            .map(|symbol| symbol.identity());

        Snapshot::new(
            types,
            methods,
            fields,
            self.allocator.strings().tokens(),
            self.allocator.special_types().tokens(),
            origin,
        )
    }

    /// Record the current state as the kernel and close the replacement policy.
    ///
    /// Later programs are uploaded as a difference to this snapshot.
    pub fn create_kernel_snapshot(&mut self) -> Snapshot {
        self.policy.finalize();
        let snapshot = self.snapshot();
        log::info!(
            "Kernel snapshot: {} types, {} methods, {} strings",
            snapshot.types().len(),
            snapshot.methods().len(),
            snapshot.strings().len()
        );
        self.kernel_snapshot = Some(snapshot.clone());
        snapshot
    }

    /// The kernel snapshot, if one was taken
    #[must_use]
    pub fn kernel_snapshot(&self) -> Option<&Snapshot> {
        self.kernel_snapshot.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        symbols::{TypeDescriptor, TypeName},
        test::{
            double, exception, int32, math, mini_exception, mini_math, mini_string,
            runtime_registry, standard_rules, string,
        },
    };

    fn program() -> TypeSig {
        TypeSig::named("App", "Program")
    }

    fn main_method() -> MethodSig {
        MethodSig::new(program(), "Main", vec![], TypeSig::Void)
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new(LinkerSettings::ram_only(), Arc::new(runtime_registry()));
        for rule in standard_rules() {
            catalog
                .register_class_replacement(
                    rule.original,
                    rule.replacement,
                    rule.include_subclasses,
                    rule.include_privates,
                )
                .unwrap();
        }
        catalog
    }

    fn array_enumerator(name: &str) -> MethodSig {
        MethodSig::new(
            TypeSig::named("Embedded.Runtime", "MiniArray"),
            name,
            vec![],
            TypeSig::named("System.Collections", "IEnumerator"),
        )
    }

    fn declare(catalog: &mut Catalog, method: &MethodSig) -> MethodDeclaration {
        let token = catalog.method_token(method, None).unwrap();
        MethodDeclaration::new(method.clone(), token)
    }

    #[test]
    fn test_register_class() {
        let mut catalog = catalog();
        let token = catalog.type_token(&program()).unwrap();

        assert!(catalog.register_class(ClassDeclaration::new(program(), token)).unwrap());
        assert!(!catalog.register_class(ClassDeclaration::new(program(), token)).unwrap());
        assert!(catalog.has_definition(&program()));
        assert_eq!(catalog.classes().len(), 1);
    }

    #[test]
    fn test_register_replaced_class() {
        let mut catalog = catalog();
        let token = catalog.type_token(&string()).unwrap();
        assert_eq!(token, catalog.type_token(&mini_string()).unwrap());

        let result = catalog.register_class(ClassDeclaration::new(string(), token));
        assert!(matches!(result, Err(Error::ReplacedSymbolRegistered(_))));

        assert!(catalog
            .register_class(ClassDeclaration::new(mini_string(), token))
            .unwrap());
    }

    #[test]
    fn test_suppressed_class_is_skipped() {
        let mut catalog = catalog();
        assert_eq!(catalog.suppress_namespace("App", false).unwrap(), 1);

        let token = catalog.type_token(&program()).unwrap();
        assert!(!catalog.register_class(ClassDeclaration::new(program(), token)).unwrap());
        assert!(catalog.has_definition(&program()));

        let main = declare(&mut catalog, &main_method());
        assert!(!catalog.register_method(main).unwrap());
        assert!(catalog.has_method(&main_method(), None).unwrap());
        assert!(catalog.classes().is_empty());
        assert!(catalog.methods().is_empty());
        assert!(catalog.diagnostics().in_category(DiagnosticCategory::Catalog).is_empty());
    }

    #[test]
    fn test_suppressed_field_data_stays_off_device() {
        let mut catalog = catalog();
        let table = FieldSig::new(program(), "Table");
        catalog
            .register_field_token_with_data(&table, vec![7; 4])
            .unwrap();
        catalog.suppress_type(&program()).unwrap();

        // Attached before the suppression, filtered from the snapshot
        assert_eq!(catalog.tokens().constants().count(), 1);
        assert!(catalog.snapshot().fields().is_empty());

        // Attached after the suppression, never recorded
        let crc = FieldSig::new(program(), "Crc");
        let token = catalog
            .register_field_token_with_data(&crc, vec![1, 2, 3, 4])
            .unwrap();
        assert_eq!(token, catalog.register_field_token(&crc).unwrap());
        assert_eq!(catalog.tokens().constants().count(), 1);

        let diff = Snapshot::empty().diff_to(&catalog.snapshot());
        assert!(diff.fields.is_empty());
    }

    #[test]
    fn test_empty_namespace_is_reported() {
        let mut catalog = catalog();
        assert_eq!(catalog.suppress_namespace("App.Unused", true).unwrap(), 0);

        let reported = catalog.diagnostics().in_category(DiagnosticCategory::Catalog);
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].severity, DiagnosticSeverity::Info);
        assert!(reported[0].message.contains("App.Unused"));
    }

    #[test]
    fn test_method_capacity() {
        let mut catalog = catalog();
        let declaration = declare(&mut catalog, &main_method());

        let result = catalog.register_method(declaration.clone().with_frame(0, 256, 8));
        assert!(matches!(result, Err(Error::TooManyLocals { count: 256, .. })));

        let result = catalog.register_method(declaration.with_frame(0, 4, 300));
        assert!(matches!(result, Err(Error::StackTooDeep { depth: 300, .. })));
    }

    #[test]
    fn test_method_table_is_full() {
        let mut catalog = catalog();
        for i in 0..MAX_METHODS {
            let method = MethodSig::new(program(), &format!("M{i}"), vec![], TypeSig::Void);
            let declaration = declare(&mut catalog, &method);
            assert!(catalog.register_method(declaration).unwrap());
        }

        let declaration = declare(&mut catalog, &main_method());
        assert!(matches!(
            catalog.register_method(declaration),
            Err(Error::TooManyMethods(MAX_METHODS))
        ));
    }

    #[test]
    fn test_method_indices() {
        let mut catalog = catalog();
        let helper = MethodSig::new(program(), "Helper", vec![int32()], int32());

        let main = declare(&mut catalog, &main_method());
        let helper_decl = declare(&mut catalog, &helper);
        assert!(catalog.register_method(main.clone()).unwrap());
        assert!(catalog.register_method(helper_decl).unwrap());
        assert!(!catalog.register_method(main).unwrap());

        assert_eq!(catalog.method(&main_method()).unwrap().index, 0);
        assert_eq!(catalog.method(&helper).unwrap().index, 1);
        assert!(catalog.has_method(&helper, None).unwrap());
    }

    #[test]
    fn test_replaced_method_token() {
        let mut catalog = catalog();
        let concat = MethodSig::new(string(), "Concat", vec![string(), string()], string());
        let mini_concat =
            MethodSig::new(mini_string(), "Concat", vec![string(), string()], string());

        let token = catalog.method_token(&concat, None).unwrap();
        assert_eq!(token, catalog.method_token(&mini_concat, None).unwrap());

        let result = catalog.register_method(MethodDeclaration::new(concat.clone(), token));
        assert!(matches!(result, Err(Error::ReplacedSymbolRegistered(_))));

        assert!(catalog
            .register_method(MethodDeclaration::new(mini_concat, token))
            .unwrap());
        assert!(catalog.has_method(&concat, None).unwrap());
    }

    #[test]
    fn test_unlisted_member_of_replaced_class() {
        let mut catalog = catalog();
        let pad = MethodSig::new(string(), "PadLeft", vec![int32()], string());
        assert!(catalog.resolver.mapping(&pad).is_none());

        let result = catalog.register_method(MethodDeclaration::new(pad, Token(100)));
        assert!(matches!(result, Err(Error::ReplacedSymbolRegistered(_))));
        assert!(catalog.methods().is_empty());
    }

    #[test]
    fn test_known_missing_method() {
        let mut catalog = catalog();
        let trim = MethodSig::new(string(), "Trim", vec![], string());

        assert!(matches!(
            catalog.method_token(&trim, Some(&main_method())),
            Err(Error::MissingReplacement { .. })
        ));
        assert!(matches!(
            catalog.register_method(MethodDeclaration::new(trim, Token(100))),
            Err(Error::ReplacementNotImplemented(_))
        ));
    }

    #[test]
    fn test_sentinel_token() {
        let mut catalog = catalog();
        let abs = MethodSig::new(math(), "Abs", vec![int32()], int32());
        let sentinel = MethodSig::new(mini_math(), "NotSupportedException", vec![], TypeSig::Void);

        let token = catalog.method_token(&abs, None).unwrap();
        assert_eq!(token, catalog.method_token(&sentinel, None).unwrap());

        let sqrt = MethodSig::new(math(), "Sqrt", vec![double()], double());
        assert_ne!(token, catalog.method_token(&sqrt, None).unwrap());
    }

    #[test]
    fn test_identity_collision() {
        let mut catalog = catalog();
        let helper = MethodSig::new(program(), "Helper", vec![int32()], int32());
        let main = declare(&mut catalog, &main_method());

        let result = catalog.register_method(MethodDeclaration::new(helper, main.token));
        assert!(matches!(result, Err(Error::IdentityCollision { .. })));
    }

    #[test]
    fn test_replacement_cycle() {
        let mut catalog = Catalog::new(LinkerSettings::ram_only(), Arc::new(runtime_registry()));
        let a = MethodSig::new(TypeSig::named("App", "A"), "Run", vec![], TypeSig::Void);
        let b = MethodSig::new(TypeSig::named("App", "B"), "Run", vec![], TypeSig::Void);
        catalog.register_method_replacement(a.clone(), Some(b.clone())).unwrap();
        catalog.register_method_replacement(b, Some(a.clone())).unwrap();

        assert!(matches!(
            catalog.method_token(&a, None),
            Err(Error::RecursionLimit(_))
        ));
    }

    #[test]
    fn test_replacement_field_alias() {
        let mut catalog = catalog();
        let original = FieldSig::new(string(), "_stringLength");
        let replacement = FieldSig::new(mini_string(), "_stringLength");
        let own = FieldSig::new(mini_string(), "_data");

        let token = catalog.register_field_token(&replacement).unwrap();
        assert_eq!(token, catalog.register_field_token(&original).unwrap());
        assert_ne!(token, catalog.register_field_token(&own).unwrap());

        let data = catalog
            .register_field_token_with_data(&replacement, vec![0, 1])
            .unwrap();
        assert_eq!(token, data);
        assert_eq!(catalog.tokens().constants().count(), 1);
    }

    #[test]
    fn test_fork() {
        let mut catalog = catalog();
        catalog.type_token(&program()).unwrap();

        assert!(matches!(
            catalog.fork(LinkerSettings::flash_program()),
            Err(Error::SettingsMismatch)
        ));

        let mut fork = catalog.fork(LinkerSettings::ram_only()).unwrap();
        let main = declare(&mut fork, &main_method());
        assert!(fork.register_method(main).unwrap());

        assert_eq!(fork.methods().len(), 1);
        assert!(catalog.methods().is_empty());
        assert!(catalog.tokens().method_token_of(&main_method()).is_none());
    }

    #[test]
    fn test_fork_copies_registry() {
        let catalog = catalog();
        let mut fork = catalog.fork(LinkerSettings::ram_only()).unwrap();
        let failure = TypeSig::named("App", "UploadFailure");
        fork.registry().insert(
            TypeDescriptor::new(TypeName::new("App", "UploadFailure")).with_base(exception()),
        );

        assert!(fork.registry().get_sig(&failure).is_some());
        assert!(catalog.registry().get_sig(&failure).is_none());

        // Subclass rules of the fork see its own registry
        assert_eq!(
            fork.type_token(&failure).unwrap(),
            fork.type_token(&mini_exception()).unwrap()
        );
    }

    #[test]
    fn test_array_implementation() {
        let mut catalog = catalog();
        let ints = TypeSig::Array(Box::new(int32()));
        let ints_enumerator = array_enumerator("GetEnumerator");
        let any_enumerator = array_enumerator("GetGenericEnumerator");

        assert!(catalog.array_implementation(&ints).is_none());
        catalog.add_array_implementation(ints.clone(), ints_enumerator.clone());
        assert_eq!(catalog.array_implementation(&ints), Some(&ints_enumerator));

        let mut fork = catalog.fork(LinkerSettings::ram_only()).unwrap();
        fork.add_array_implementation(ints.clone(), any_enumerator.clone());
        assert_eq!(fork.array_implementation(&ints), Some(&any_enumerator));
        assert_eq!(catalog.array_implementation(&ints), Some(&ints_enumerator));
        assert!(fork
            .array_implementation(&TypeSig::Array(Box::new(double())))
            .is_none());
    }

    #[test]
    fn test_kernel_snapshot_finalizes_policy() {
        let mut catalog = catalog();
        catalog.type_token(&program()).unwrap();
        let kernel = catalog.create_kernel_snapshot();

        assert_eq!(catalog.kernel_snapshot(), Some(&kernel));
        assert!(matches!(
            catalog.register_class_replacement(program(), mini_string(), false, false),
            Err(Error::PolicyFinalized)
        ));
        assert!(matches!(
            catalog.suppress_type(&program()),
            Err(Error::PolicyFinalized)
        ));
    }

    #[test]
    fn test_snapshot_scenario() {
        let mut catalog = Catalog::new(LinkerSettings::ram_only(), Arc::new(runtime_registry()));
        let helper = MethodSig::new(program(), "Helper", vec![int32()], int32());

        let token = catalog.type_token(&program()).unwrap();
        catalog
            .register_class(ClassDeclaration::new(program(), token))
            .unwrap();
        let main = declare(&mut catalog, &main_method());
        let helper_decl = declare(&mut catalog, &helper);
        catalog.register_method(main.clone()).unwrap();
        catalog.register_method(helper_decl.clone()).unwrap();
        catalog.register_string("Hi").unwrap();

        let diff = Snapshot::empty().diff_to(&catalog.snapshot());
        assert_eq!(diff.types, vec![token]);
        assert_eq!(diff.methods, vec![main.token, helper_decl.token]);
        assert!(diff.fields.is_empty());
        assert_eq!(diff.strings.len(), 1);
        assert_eq!(diff.string_payload_size(), 10);
    }

    #[test]
    fn test_snapshot_origin() {
        let mut catalog = Catalog::new(LinkerSettings::ram_only(), Arc::new(runtime_registry()));
        let token = catalog.type_token(&program()).unwrap();
        let snapshot = catalog.snapshot();

        let expected = 1 ^ token.value() ^ Symbol::Type(program()).identity();
        assert_eq!(snapshot.fingerprint(), expected);
    }

    #[test]
    fn test_special_method_flag() {
        let mut catalog = catalog();
        let declaration = declare(&mut catalog, &main_method())
            .with_flags(MethodFlags::SPECIAL_METHOD | MethodFlags::STATIC);
        assert!(catalog.register_method(declaration).unwrap());
        assert!(catalog.method(&main_method()).unwrap().is_special());
    }
}
