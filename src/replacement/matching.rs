//! Structural comparison of methods across an original type and its replacement.
//!
//! A replacement method matches an original when name, generic arity, parameter types and
//! return type agree. Two types agree when they are identical, or when one is the registered
//! replacement of the other, applied recursively through generic arguments, arrays and
//! references.
//!
//! Operator methods follow a looser rule: the `op_` naming convention identifies the
//! operator, checked variants fold onto their unchecked counterpart, and the declaring types
//! of both methods are interchangeable wherever they appear in the signature.

use strum::{Display, EnumCount, EnumIter, EnumString};

use crate::symbols::{MethodSig, TypeName, TypeSig};

/// Answers whether two type definitions form an original/replacement pair.
pub(crate) trait ClassPairs {
    /// Returns true if `a` replaces `b` or `b` replaces `a`
    fn are_paired(&self, a: &TypeName, b: &TypeName) -> bool;
}

/// Overloadable operators, identified by their `op_` method name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter, EnumCount,
)]
pub enum OperatorKind {
    /// `op_Addition`
    Addition,
    /// `op_Subtraction`
    Subtraction,
    /// `op_Multiply`
    Multiply,
    /// `op_Division`
    Division,
    /// `op_Modulus`
    Modulus,
    /// `op_UnaryNegation`
    UnaryNegation,
    /// `op_UnaryPlus`
    UnaryPlus,
    /// `op_Increment`
    Increment,
    /// `op_Decrement`
    Decrement,
    /// `op_Equality`
    Equality,
    /// `op_Inequality`
    Inequality,
    /// `op_LessThan`
    LessThan,
    /// `op_GreaterThan`
    GreaterThan,
    /// `op_LessThanOrEqual`
    LessThanOrEqual,
    /// `op_GreaterThanOrEqual`
    GreaterThanOrEqual,
    /// `op_BitwiseAnd`
    BitwiseAnd,
    /// `op_BitwiseOr`
    BitwiseOr,
    /// `op_ExclusiveOr`
    ExclusiveOr,
    /// `op_OnesComplement`
    OnesComplement,
    /// `op_LogicalNot`
    LogicalNot,
    /// `op_LeftShift`
    LeftShift,
    /// `op_RightShift`
    RightShift,
    /// `op_UnsignedRightShift`
    UnsignedRightShift,
    /// `op_Implicit`
    Implicit,
    /// `op_Explicit`
    Explicit,
    /// `op_True`
    True,
    /// `op_False`
    False,
}

impl OperatorKind {
    /// The operator implemented by a method called `name`.
    ///
    /// `op_CheckedAddition` and `op_Addition` both yield [`OperatorKind::Addition`].
    #[must_use]
    pub fn of(name: &str) -> Option<OperatorKind> {
        let operator = name.strip_prefix("op_")?;
        let operator = operator.strip_prefix("Checked").unwrap_or(operator);
        operator.parse().ok()
    }
}

pub(crate) fn same_type(a: &TypeSig, b: &TypeSig, pairs: &impl ClassPairs) -> bool {
    if a == b {
        return true;
    }

    match (a, b) {
        (TypeSig::Named(x), TypeSig::Named(y)) => pairs.are_paired(x, y),
        (
            TypeSig::Generic {
                definition: def_a,
                args: args_a,
            },
            TypeSig::Generic {
                definition: def_b,
                args: args_b,
            },
        ) => {
            (def_a == def_b || pairs.are_paired(def_a, def_b))
                && args_a.len() == args_b.len()
                && args_a
                    .iter()
                    .zip(args_b)
                    .all(|(x, y)| same_type(x, y, pairs))
        }
        (TypeSig::Array(x), TypeSig::Array(y)) | (TypeSig::ByRef(x), TypeSig::ByRef(y)) => {
            same_type(x, y, pairs)
        }
        _ => false,
    }
}

/// Returns true if `a` and `b` have the same name, generic arity and equivalent signatures.
///
/// The declaring types are not compared.
pub(crate) fn same_signature(a: &MethodSig, b: &MethodSig, pairs: &impl ClassPairs) -> bool {
    a.name == b.name
        && a.generic_arity == b.generic_arity
        && a.generic_args.len() == b.generic_args.len()
        && a.params.len() == b.params.len()
        && a.params
            .iter()
            .zip(&b.params)
            .all(|(x, y)| same_type(x, y, pairs))
        && same_type(&a.ret, &b.ret, pairs)
        && a.generic_args
            .iter()
            .zip(&b.generic_args)
            .all(|(x, y)| same_type(x, y, pairs))
}

/// Returns true if `a` and `b` implement the same operator on their respective declaring types.
pub(crate) fn same_operator(a: &MethodSig, b: &MethodSig, pairs: &impl ClassPairs) -> bool {
    let (Some(kind_a), Some(kind_b)) = (OperatorKind::of(&a.name), OperatorKind::of(&b.name)) else {
        return false;
    };

    if kind_a != kind_b || a.params.len() != b.params.len() {
        return false;
    }

    let own = |x: &TypeSig, y: &TypeSig| {
        x.type_name() == a.declaring.type_name() && y.type_name() == b.declaring.type_name()
    };
    let equivalent = |x: &TypeSig, y: &TypeSig| own(x, y) || same_type(x, y, pairs);

    a.params
        .iter()
        .zip(&b.params)
        .all(|(x, y)| equivalent(x, y))
        && equivalent(&a.ret, &b.ret)
}
