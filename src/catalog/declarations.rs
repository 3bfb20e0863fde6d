//! Class and method declarations as they are uploaded to the device.

use std::fmt;

use bitflags::bitflags;

use crate::{
    symbols::{MethodSig, TypeSig},
    token::Token,
};

/// Kind of a class member slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Instance field
    Field,
    /// Static field
    StaticField,
    /// Virtual or interface method slot
    Method,
    /// Constructor
    Constructor,
}

/// A member of a class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMember {
    /// Member name (debug only)
    pub name: String,
    /// Field or method token
    pub token: Token,
    /// Slot kind
    pub kind: MemberKind,
    /// Size of a field slot in bytes, 0 for methods
    pub size: usize,
}

impl ClassMember {
    /// Create a member slot
    pub fn new(name: &str, token: Token, kind: MemberKind, size: usize) -> Self {
        ClassMember {
            name: name.to_string(),
            token,
            kind,
            size,
        }
    }
}

/// A class selected for the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    /// The declared type
    pub ty: TypeSig,
    /// Its type token
    pub token: Token,
    /// Size of an instance in bytes
    pub dynamic_size: usize,
    /// Size of the static section in bytes
    pub static_size: usize,
    /// Fields and method slots
    pub members: Vec<ClassMember>,
    /// Base type and implemented interfaces
    pub dependencies: Vec<TypeSig>,
}

impl ClassDeclaration {
    /// Create a declaration without members
    pub fn new(ty: TypeSig, token: Token) -> Self {
        ClassDeclaration {
            ty,
            token,
            dynamic_size: 0,
            static_size: 0,
            members: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Set instance and static sizes
    #[must_use]
    pub fn with_sizes(mut self, dynamic_size: usize, static_size: usize) -> Self {
        self.dynamic_size = dynamic_size;
        self.static_size = static_size;
        self
    }

    /// Add a member slot
    #[must_use]
    pub fn with_member(mut self, member: ClassMember) -> Self {
        self.members.push(member);
        self
    }

    /// Add a base type or interface
    #[must_use]
    pub fn with_dependency(mut self, ty: TypeSig) -> Self {
        self.dependencies.push(ty);
        self
    }
}

impl fmt::Display for ClassDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ty, self.token)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Method properties transmitted with the declaration
    pub struct MethodFlags: u16 {
        /// Static method
        const STATIC = 0x0001;
        /// Virtual method
        const VIRTUAL = 0x0002;
        /// Implemented natively by the execution engine
        const SPECIAL_METHOD = 0x0004;
        /// Returns nothing
        const VOID = 0x0008;
        /// Constructor
        const CTOR = 0x0010;
        /// Abstract method, no body
        const ABSTRACT = 0x0020;
        /// Body is empty
        const EMPTY = 0x0040;
    }
}

/// A method selected for the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDeclaration {
    /// Canonical identity
    pub method: MethodSig,
    /// Method token
    pub token: Token,
    /// Position in the method table, assigned when the declaration is added
    pub index: u16,
    /// Number of arguments including `this`
    pub argument_count: u16,
    /// Number of local variable slots
    pub max_locals: u16,
    /// Maximum evaluation stack depth
    pub max_stack: u16,
    /// Encoded instruction stream, `None` for native or abstract methods
    pub code: Option<Vec<u8>>,
    /// Method properties
    pub flags: MethodFlags,
}

impl MethodDeclaration {
    /// Create a declaration of a method without body
    pub fn new(method: MethodSig, token: Token) -> Self {
        MethodDeclaration {
            method,
            token,
            index: 0,
            argument_count: 0,
            max_locals: 0,
            max_stack: 0,
            code: None,
            flags: MethodFlags::empty(),
        }
    }

    /// Set argument count, local slots and stack depth
    #[must_use]
    pub fn with_frame(mut self, argument_count: u16, max_locals: u16, max_stack: u16) -> Self {
        self.argument_count = argument_count;
        self.max_locals = max_locals;
        self.max_stack = max_stack;
        self
    }

    /// Attach the encoded body
    #[must_use]
    pub fn with_code(mut self, code: Vec<u8>) -> Self {
        self.code = Some(code);
        self
    }

    /// Set flags
    #[must_use]
    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Length of the encoded body in bytes
    #[must_use]
    pub fn code_len(&self) -> usize {
        self.code.as_ref().map_or(0, Vec::len)
    }

    /// Returns true for methods implemented by the execution engine
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.flags.contains(MethodFlags::SPECIAL_METHOD)
    }
}

impl fmt::Display for MethodDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.method, self.token)
    }
}
