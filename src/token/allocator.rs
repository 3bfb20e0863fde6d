//! Token allocation for types, methods, fields and strings.
//!
//! The [`TokenAllocator`] hands out every token of a build session and owns the generic
//! token algebra. All lookups are idempotent: asking twice for a structurally identical
//! symbol yields the same token.
//!
//! # Type Token Algebra
//!
//! Type tokens are assigned in this order of precedence:
//!
//! 1. Built-in types get their reserved token (see [`KnownType`]).
//! 2. Types covered by a class-level replacement get the token of the replacement.
//!    A replacement class of a built-in type inherits the reserved token.
//! 3. `Nullable<>` is the nullable bit; `Nullable<T>` is `token(T) + NULLABLE_TOKEN`.
//! 4. Open generic definitions (`Foo<>`) take the next value of a counter stepping by
//!    [`GENERIC_TOKEN_STEP`], starting at [`FIRST_GENERIC_TOKEN`].
//! 5. `Foo<T>` with a single non-generic argument is `token(Foo<>) + token(T)`.
//! 6. All other instantiations get a special token (`0xFF` high byte) and a group in the
//!    [`SpecialTypeList`], whose argument tokens are allocated recursively by this same
//!    procedure.
//! 7. Everything else takes the next value of the ordinary counter, which it shares with
//!    methods, fields and special tokens.
//!
//! # Reverse Lookup
//!
//! [`TokenAllocator::resolve`] maps a token back to its symbol. Tokens that were never
//! assigned but decompose into a known single-parameter definition plus a known argument are
//! answered with the constructed type, mirroring `MakeGenericType` on the device. A
//! decomposition that does not form a valid type yields `None` and records a diagnostic.

use std::collections::{hash_map::Entry, HashMap, HashSet};

use crate::{
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    symbols::{
        is_nullable, FieldSig, KnownType, MethodSig, Symbol, TypeSig, LARGEST_KNOWN_TYPE_TOKEN,
    },
    token::{
        SpecialTypeGroup, SpecialTypeList, StringTable, Token, TypeToken, FIRST_GENERIC_TOKEN,
        GENERIC_TOKEN_STEP, NULLABLE_TOKEN, SPECIAL_TOKEN_MARKER,
    },
    Error, Result,
};

/// Class-level replacement lookups needed while assigning type tokens.
///
/// Implemented by the replacement resolver. Redirecting may record derived replacements
/// (subclasses of a replaced base), hence `&mut self`.
pub trait TypeRedirect {
    /// The type that stands in for `ty` on the device, if `ty` is replaced
    ///
    /// # Errors
    /// Propagates failures of registering a derived replacement.
    fn redirect(&mut self, ty: &TypeSig) -> Result<Option<TypeSig>>;

    /// The original type that `ty` replaces, if `ty` is a replacement class
    fn replaced_original(&self, ty: &TypeSig) -> Option<TypeSig>;
}

/// A [`TypeRedirect`] without any replacements.
pub struct NoRedirect;

impl TypeRedirect for NoRedirect {
    fn redirect(&mut self, _ty: &TypeSig) -> Result<Option<TypeSig>> {
        Ok(None)
    }

    fn replaced_original(&self, _ty: &TypeSig) -> Option<TypeSig> {
        None
    }
}

/// A field with its token and optional initializer data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    /// The field
    pub field: FieldSig,
    /// Its token
    pub token: Token,
    /// Initializer bytes (static array data), attached possibly after the token exists
    pub data: Option<Vec<u8>>,
}

/// Assigns and remembers the tokens of one build session.
///
/// Cloning deep-copies every table, a clone can continue allocating independently.
#[derive(Debug, Clone)]
pub struct TokenAllocator {
    next_token: u32,
    next_generic: u32,
    types: Vec<(TypeSig, TypeToken)>,
    type_index: HashMap<TypeSig, usize>,
    inverse_types: HashMap<Token, TypeSig>,
    methods: HashMap<MethodSig, Token>,
    inverse_methods: HashMap<Token, MethodSig>,
    fields: Vec<FieldEntry>,
    field_index: HashMap<FieldSig, usize>,
    inverse_fields: HashMap<Token, usize>,
    special: SpecialTypeList,
    strings: StringTable,
}

impl TokenAllocator {
    /// Create an allocator with empty tables
    #[must_use]
    pub fn new() -> Self {
        TokenAllocator {
            next_token: LARGEST_KNOWN_TYPE_TOKEN + 1,
            next_generic: FIRST_GENERIC_TOKEN,
            types: Vec::new(),
            type_index: HashMap::new(),
            inverse_types: HashMap::new(),
            methods: HashMap::new(),
            inverse_methods: HashMap::new(),
            fields: Vec::new(),
            field_index: HashMap::new(),
            inverse_fields: HashMap::new(),
            special: SpecialTypeList::new(),
            strings: StringTable::new(),
        }
    }

    fn next_ordinary(&mut self) -> Result<Token> {
        if self.next_token >= NULLABLE_TOKEN {
            return Err(Error::TokenSpaceExhausted("symbols"));
        }

        let token = Token(self.next_token);
        self.next_token += 1;
        Ok(token)
    }

    fn next_generic_definition(&mut self) -> Result<Token> {
        if self.next_generic >= SPECIAL_TOKEN_MARKER {
            return Err(Error::TokenSpaceExhausted("generic definitions"));
        }

        let token = Token(self.next_generic);
        self.next_generic += GENERIC_TOKEN_STEP;
        Ok(token)
    }

    fn next_special(&mut self) -> Result<Token> {
        Ok(Token(SPECIAL_TOKEN_MARKER | self.next_ordinary()?.value()))
    }

    /// The token already assigned to `ty`, without allocating
    #[must_use]
    pub fn type_token_of(&self, ty: &TypeSig) -> Option<Token> {
        self.type_index.get(ty).map(|&i| self.types[i].1.wire())
    }

    /// The shape of the token assigned to `ty`
    #[must_use]
    pub fn type_shape(&self, ty: &TypeSig) -> Option<&TypeToken> {
        self.type_index.get(ty).map(|&i| &self.types[i].1)
    }

    /// Return the token of `ty`, assigning it (and the tokens of its generic components) on
    /// first use.
    ///
    /// # Errors
    /// Returns [`Error::TokenSpaceExhausted`] if a counter runs out, or propagates failures
    /// of `redirect`.
    pub fn type_token(&mut self, ty: &TypeSig, redirect: &mut dyn TypeRedirect) -> Result<Token> {
        if let Some(token) = self.type_token_of(ty) {
            return Ok(token);
        }

        let shape = if let Some(known) = KnownType::of(ty) {
            TypeToken::Simple(known.token())
        } else if let Some(replacement) = redirect.redirect(ty)? {
            let token = self.type_token(&replacement, redirect)?;
            TypeToken::Simple(token)
        } else if let Some(known) = redirect
            .replaced_original(ty)
            .and_then(|original| KnownType::of(&original))
        {
            TypeToken::Simple(known.token())
        } else if is_nullable(ty) && ty.is_open_definition() {
            TypeToken::Simple(Token(NULLABLE_TOKEN))
        } else if is_nullable(ty) && ty.type_args().len() == 1 {
            let argument = self.type_token(&ty.type_args()[0], redirect)?;
            TypeToken::summed(Token(NULLABLE_TOKEN), argument)
        } else if ty.is_open_definition() {
            TypeToken::Simple(self.next_generic_definition()?)
        } else if let TypeSig::Generic { definition, args } = ty {
            self.generic_instance_token(ty, &TypeSig::Named(definition.clone()), args, redirect)?
        } else {
            TypeToken::Simple(self.next_ordinary()?)
        };

        let is_replacement = redirect.replaced_original(ty).is_some();
        Ok(self.record_type(ty, shape, is_replacement))
    }

    fn generic_instance_token(
        &mut self,
        ty: &TypeSig,
        definition: &TypeSig,
        args: &[TypeSig],
        redirect: &mut dyn TypeRedirect,
    ) -> Result<TypeToken> {
        let definition_token = self.type_token(definition, redirect)?;
        let Some(first) = args.first() else {
            return Ok(TypeToken::Simple(definition_token));
        };
        let first_token = self.type_token(first, redirect)?;

        if args.len() == 1 && !first.is_generic() {
            return Ok(TypeToken::summed(definition_token, first_token));
        }

        let special = self.next_special()?;
        let mut arguments = Vec::with_capacity(args.len());
        arguments.push(first_token);
        for arg in &args[1..] {
            arguments.push(self.type_token(arg, redirect)?);
        }

        self.special.push(SpecialTypeGroup {
            token: special,
            owner: ty.clone(),
            definition: definition_token,
            arguments: arguments.clone(),
        });

        Ok(TypeToken::Composed {
            definition: definition_token,
            arguments,
            special: Some(special),
        })
    }

    fn record_type(&mut self, ty: &TypeSig, shape: TypeToken, is_replacement: bool) -> Token {
        let wire = shape.wire();
        self.type_index.insert(ty.clone(), self.types.len());
        self.types.push((ty.clone(), shape));

        match self.inverse_types.entry(wire) {
            Entry::Vacant(entry) => {
                entry.insert(ty.clone());
            }
            Entry::Occupied(mut entry) => {
                // Several types share a token only through replacement; report the original
                if !is_replacement {
                    entry.insert(ty.clone());
                }
            }
        }

        log::trace!("type {ty} has token {wire}");
        wire
    }

    /// The token already assigned to `method`
    #[must_use]
    pub fn method_token_of(&self, method: &MethodSig) -> Option<Token> {
        self.methods.get(method).copied()
    }

    /// Return the token of `method`, assigning the next ordinary token on first use.
    ///
    /// Replacement resolution happens before this call; the allocator takes `method` as is.
    ///
    /// # Errors
    /// Returns [`Error::TokenSpaceExhausted`] if the ordinary counter runs out.
    pub fn method_token(&mut self, method: &MethodSig) -> Result<Token> {
        if let Some(token) = self.method_token_of(method) {
            return Ok(token);
        }

        let token = self.next_ordinary()?;
        self.methods.insert(method.clone(), token);
        self.inverse_methods.insert(token, method.clone());
        Ok(token)
    }

    /// The method owning `token`
    #[must_use]
    pub fn method_by_token(&self, token: Token) -> Option<&MethodSig> {
        self.inverse_methods.get(&token)
    }

    /// The entry of `field`, if it has a token
    #[must_use]
    pub fn field(&self, field: &FieldSig) -> Option<&FieldEntry> {
        self.field_index.get(field).map(|&i| &self.fields[i])
    }

    /// The field entry owning `token`
    #[must_use]
    pub fn field_by_token(&self, token: Token) -> Option<&FieldEntry> {
        self.inverse_fields.get(&token).map(|&i| &self.fields[i])
    }

    /// Return the token of `field`, assigning one on first use.
    ///
    /// # Errors
    /// Returns [`Error::TokenSpaceExhausted`] if the ordinary counter runs out.
    pub fn field_token(&mut self, field: &FieldSig) -> Result<Token> {
        if let Some(entry) = self.field(field) {
            return Ok(entry.token);
        }

        self.add_field(field, None)
    }

    /// Return the token of `field` and attach `data` as its initializer.
    ///
    /// An existing token keeps its value; the data replaces whatever was attached before.
    ///
    /// # Errors
    /// Returns [`Error::TokenSpaceExhausted`] if the ordinary counter runs out.
    pub fn field_token_with_data(&mut self, field: &FieldSig, data: Vec<u8>) -> Result<Token> {
        if let Some(&i) = self.field_index.get(field) {
            let entry = &mut self.fields[i];
            entry.data = Some(data);
            return Ok(entry.token);
        }

        self.add_field(field, Some(data))
    }

    fn add_field(&mut self, field: &FieldSig, data: Option<Vec<u8>>) -> Result<Token> {
        let token = self.next_ordinary()?;
        let index = self.fields.len();
        self.fields.push(FieldEntry {
            field: field.clone(),
            token,
            data,
        });
        self.field_index.insert(field.clone(), index);
        self.inverse_fields.insert(token, index);
        Ok(token)
    }

    /// All fields in allocation order
    #[must_use]
    pub fn fields(&self) -> &[FieldEntry] {
        &self.fields
    }

    /// Fields carrying initializer data, in allocation order
    pub fn constants(&self) -> impl Iterator<Item = &FieldEntry> {
        self.fields.iter().filter(|entry| entry.data.is_some())
    }

    /// Return the token of a string constant, registering it on first use
    ///
    /// # Errors
    /// See [`StringTable::get_or_add`].
    pub fn string_token(&mut self, text: &str) -> Result<Token> {
        self.strings.get_or_add(text)
    }

    /// The string table
    #[must_use]
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// The special type list
    #[must_use]
    pub fn special_types(&self) -> &SpecialTypeList {
        &self.special
    }

    /// All assigned types with their token shapes, in allocation order
    #[must_use]
    pub fn types(&self) -> &[(TypeSig, TypeToken)] {
        &self.types
    }

    /// Distinct wire tokens of all assigned types, in allocation order
    #[must_use]
    pub fn type_tokens(&self) -> Vec<Token> {
        let mut seen = HashSet::new();
        self.types
            .iter()
            .map(|(_, shape)| shape.wire())
            .filter(|token| seen.insert(*token))
            .collect()
    }

    /// Resolve `token` back to its symbol.
    ///
    /// Method, field and type tokens are looked up directly. Otherwise the token is split into
    /// a definition part (high byte) and an argument part (low 24 bits); if both are known and
    /// the definition is open, the constructed type is returned. A decomposition that cannot be
    /// constructed returns `None` and is recorded in `diagnostics`.
    #[must_use]
    pub fn resolve(&self, token: Token, diagnostics: &Diagnostics) -> Option<Symbol> {
        if let Some(method) = self.inverse_methods.get(&token) {
            return Some(Symbol::Method(method.clone()));
        }

        if let Some(entry) = self.field_by_token(token) {
            return Some(Symbol::Field(entry.field.clone()));
        }

        if let Some(ty) = self.inverse_types.get(&token) {
            return Some(Symbol::Type(ty.clone()));
        }

        let definition = self.inverse_types.get(&token.definition_part())?;
        if !definition.is_open_definition() {
            return None;
        }

        let argument = self.inverse_types.get(&Token(token.index()))?;
        match TypeSig::make_generic(definition, vec![argument.clone()]) {
            Ok(ty) => Some(Symbol::Type(ty)),
            Err(error) => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::Token,
                        format!("does not decompose into a valid type: {error}"),
                    )
                    .with_token(token)
                    .with_symbol(definition),
                );
                None
            }
        }
    }
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self::new()
    }
}
