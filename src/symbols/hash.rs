//! Stable symbol identity hashing.
//!
//! This module provides the `SymbolHash` for computing a stable identity value of a symbol,
//! independent of the process it was computed in. Snapshots fold this value into their
//! fingerprint so that two kernels with the same token sets but different contents are
//! still told apart.
//!
//! # Hash Design
//!
//! The hash uses FNV-1a inspired sequential mixing with a fixed, process-independent
//! byte feed. `std::hash::DefaultHasher` is not used, its output is not guaranteed to
//! be stable across Rust releases and the value ends up on the device.
//!
//! # Example Usage
//!
//! ```rust
//! use mculink::symbols::{SymbolHash, TypeSig};
//!
//! let string = TypeSig::named("System", "String");
//! let hash = SymbolHash::new().add_type(&string).finalize();
//! assert_eq!(hash, SymbolHash::new().add_type(&string).finalize());
//! ```

use crate::symbols::{FieldSig, MethodSig, TypeSig};

/// Builder for the stable identity of a type, method or field (64-bit FNV-1a).
pub struct SymbolHash {
    state: u64,
}

impl SymbolHash {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    /// Start an empty identity
    #[must_use]
    pub fn new() -> Self {
        SymbolHash {
            state: Self::OFFSET_BASIS,
        }
    }

    fn mix(&mut self, value: u8) {
        self.state ^= u64::from(value);
        self.state = self.state.wrapping_mul(Self::PRIME);
    }

    fn mix_u32(&mut self, value: u32) {
        for byte in value.to_le_bytes() {
            self.mix(byte);
        }
    }

    fn mix_str(&mut self, value: &str) {
        self.mix_u32(value.len() as u32);
        for byte in value.bytes() {
            self.mix(byte);
        }
    }

    fn mix_type(&mut self, ty: &TypeSig) {
        match ty {
            TypeSig::Void => self.mix(0),
            TypeSig::Named(name) => {
                self.mix(1);
                self.mix_str(&name.namespace);
                self.mix_str(&name.name);
                self.mix_u32(u32::from(name.arity));
            }
            TypeSig::Generic { definition, args } => {
                self.mix(2);
                self.mix_str(&definition.namespace);
                self.mix_str(&definition.name);
                self.mix_u32(args.len() as u32);
                for arg in args {
                    self.mix_type(arg);
                }
            }
            TypeSig::Array(elem) => {
                self.mix(3);
                self.mix_type(elem);
            }
            TypeSig::ByRef(elem) => {
                self.mix(4);
                self.mix_type(elem);
            }
            TypeSig::TypeParam(index) => {
                self.mix(5);
                self.mix_u32(u32::from(*index));
            }
            TypeSig::MethodParam(index) => {
                self.mix(6);
                self.mix_u32(u32::from(*index));
            }
        }
    }

    /// Add a type to the identity
    #[must_use]
    pub fn add_type(mut self, ty: &TypeSig) -> Self {
        self.mix_type(ty);
        self
    }

    /// Add a method to the identity
    #[must_use]
    pub fn add_method(mut self, method: &MethodSig) -> Self {
        self.mix(0x10);
        self.mix_type(&method.declaring);
        self.mix_str(&method.name);
        self.mix_u32(method.params.len() as u32);
        for param in &method.params {
            self.mix_type(param);
        }
        self.mix_type(&method.ret);
        self.mix_u32(u32::from(method.generic_arity));
        for arg in &method.generic_args {
            self.mix_type(arg);
        }
        self
    }

    /// Add a field to the identity
    #[must_use]
    pub fn add_field(mut self, field: &FieldSig) -> Self {
        self.mix(0x20);
        self.mix_type(&field.declaring);
        self.mix_str(&field.name);
        self
    }

    /// The full 64-bit identity
    #[must_use]
    pub fn finalize(self) -> u64 {
        self.state
    }

    /// The identity folded to the 32 bits a snapshot fingerprint holds
    #[must_use]
    pub fn finalize_u32(self) -> u32 {
        (self.state ^ (self.state >> 32)) as u32
    }
}

impl Default for SymbolHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_stable() {
        // The value ends up in flash headers, it must not change between builds
        let hash = SymbolHash::new().add_type(&TypeSig::Void).finalize();
        assert_eq!(hash, SymbolHash::OFFSET_BASIS.wrapping_mul(SymbolHash::PRIME));

        let list = TypeSig::definition("System.Collections.Generic", "List`1", 1);
        assert_eq!(
            SymbolHash::new().add_type(&list).finalize_u32(),
            SymbolHash::new().add_type(&list).finalize_u32()
        );
    }

    #[test]
    fn test_hash_distinguishes_kinds() {
        let ty = TypeSig::named("System", "String");
        let field = FieldSig::new(ty.clone(), "Empty");
        let method = MethodSig::new(ty.clone(), "Empty", vec![], TypeSig::Void);

        let type_hash = SymbolHash::new().add_type(&ty).finalize();
        let field_hash = SymbolHash::new().add_field(&field).finalize();
        let method_hash = SymbolHash::new().add_method(&method).finalize();

        assert_ne!(type_hash, field_hash);
        assert_ne!(field_hash, method_hash);
    }

    #[test]
    fn test_name_boundaries() {
        let names = vec![
            ("System", "String"),
            ("System", "Object"),
            ("System.Collections", "String"),
            ("System", "StringBuilder"),
            ("SystemString", ""),
        ];

        let hashes: Vec<u64> = names
            .into_iter()
            .map(|(ns, name)| SymbolHash::new().add_type(&TypeSig::named(ns, name)).finalize())
            .collect();

        for i in 0..hashes.len() {
            for j in (i + 1)..hashes.len() {
                assert_ne!(hashes[i], hashes[j]);
            }
        }
    }
}
