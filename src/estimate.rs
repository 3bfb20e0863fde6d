//! Static estimate of the device memory a build occupies.
//!
//! The estimate sums a fixed bookkeeping model per class and method plus the raw payload of
//! code, field initializers and strings. It is a planning aid for fitting a program onto a
//! target and never gates a build.

use std::{collections::HashMap, fmt};

use crate::{
    catalog::Catalog,
    symbols::{MethodSig, TypeSig},
};

/// Fixed overhead of every class declaration
pub const CLASS_OVERHEAD: usize = 40;

/// Minimum size of a method, excluding its frame and code
pub const METHOD_BODY_MIN_SIZE: usize = 40;

/// Size of one member slot of a class, assuming a 32-bit target
pub const MEMBER_SLOT_SIZE: usize = 8;

/// Size of one argument or local variable slot
pub const FRAME_SLOT_SIZE: usize = 4;

/// Memory usage attributed to one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassStatistics {
    /// The class
    pub ty: TypeSig,
    /// Bytes for the declaration, static section, member slots and field initializers
    pub class_bytes: usize,
    /// Bytes for all methods declared by the class
    pub method_bytes: usize,
    /// Sum of class and method bytes
    pub total_bytes: usize,
    /// Per-method sizes, in table order
    pub methods: Vec<(MethodSig, usize)>,
}

impl ClassStatistics {
    fn new(ty: TypeSig, class_bytes: usize) -> Self {
        ClassStatistics {
            ty,
            class_bytes,
            method_bytes: 0,
            total_bytes: 0,
            methods: Vec::new(),
        }
    }
}

impl fmt::Display for ClassStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Class {} uses {} bytes for code and {} bytes for fields and metadata, total {}",
            self.ty, self.method_bytes, self.class_bytes, self.total_bytes
        )
    }
}

/// Estimated memory footprint of a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEstimate {
    /// Estimated total in bytes, strings included
    pub total_bytes: usize,
    /// Bytes of string constants
    pub string_bytes: usize,
    /// Per-class breakdown, largest first
    pub classes: Vec<ClassStatistics>,
}

impl MemoryEstimate {
    /// Estimate the memory used by every declaration of `catalog`.
    ///
    /// Methods whose declaring class is not declared are attributed to a synthetic entry
    /// without class bytes.
    #[must_use]
    pub fn of(catalog: &Catalog) -> Self {
        let tokens = catalog.tokens();
        let mut classes: Vec<ClassStatistics> = Vec::with_capacity(catalog.classes().len());
        let mut index: HashMap<TypeSig, usize> = HashMap::new();
        let mut total_bytes = 0;

        for class in catalog.classes() {
            let initializers: usize = class
                .members
                .iter()
                .filter_map(|member| tokens.field_by_token(member.token))
                .filter_map(|entry| entry.data.as_ref())
                .map(Vec::len)
                .sum();

            let class_bytes = CLASS_OVERHEAD
                + class.static_size
                + class.members.len() * MEMBER_SLOT_SIZE
                + initializers;

            total_bytes += class_bytes;
            index.insert(class.ty.clone(), classes.len());
            classes.push(ClassStatistics::new(class.ty.clone(), class_bytes));
        }

        for method in catalog.methods() {
            let method_bytes = METHOD_BODY_MIN_SIZE
                + usize::from(method.argument_count) * FRAME_SLOT_SIZE
                + usize::from(method.max_locals) * FRAME_SLOT_SIZE
                + method.code_len();

            let declaring = &method.method.declaring;
            let position = *index.entry(declaring.clone()).or_insert_with(|| {
                classes.push(ClassStatistics::new(declaring.clone(), 0));
                classes.len() - 1
            });

            let stats = &mut classes[position];
            stats.method_bytes += method_bytes;
            stats.methods.push((method.method.clone(), method_bytes));
            total_bytes += method_bytes;
        }

        for stats in &mut classes {
            stats.total_bytes = stats.class_bytes + stats.method_bytes;
        }
        classes.sort_by(|a, b| b.total_bytes.cmp(&a.total_bytes));

        let string_bytes: usize = tokens
            .strings()
            .entries()
            .iter()
            .map(|entry| entry.encoded.len() + 4)
            .sum();

        MemoryEstimate {
            total_bytes: total_bytes + string_bytes,
            string_bytes,
            classes,
        }
    }
}

impl fmt::Display for MemoryEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Estimated memory usage: {} bytes in {} classes, {} bytes of strings",
            self.total_bytes,
            self.classes.len(),
            self.string_bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        catalog::{ClassDeclaration, ClassMember, MemberKind, MethodDeclaration},
        config::LinkerSettings,
        symbols::FieldSig,
        test::{int32, runtime_registry},
    };

    fn program() -> TypeSig {
        TypeSig::named("App", "Program")
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::new(LinkerSettings::ram_only(), Arc::new(runtime_registry()));
        let estimate = MemoryEstimate::of(&catalog);
        assert_eq!(estimate.total_bytes, 0);
        assert!(estimate.classes.is_empty());
    }

    #[test]
    fn test_estimate() {
        let mut catalog = Catalog::new(LinkerSettings::ram_only(), Arc::new(runtime_registry()));

        let ty = catalog.type_token(&program()).unwrap();
        let table = catalog
            .register_field_token_with_data(&FieldSig::new(program(), "Table"), vec![0; 16])
            .unwrap();
        let class = ClassDeclaration::new(program(), ty)
            .with_sizes(0, 4)
            .with_member(ClassMember::new("Table", table, MemberKind::StaticField, 4));
        catalog.register_class(class).unwrap();

        let main = MethodSig::new(program(), "Main", vec![], TypeSig::Void);
        let token = catalog.method_token(&main, None).unwrap();
        catalog
            .register_method(
                MethodDeclaration::new(main, token)
                    .with_frame(1, 2, 4)
                    .with_code(vec![0; 10]),
            )
            .unwrap();

        // A method of a class that was never declared
        let helper = MethodSig::new(
            TypeSig::named("App", "Util"),
            "Max",
            vec![int32(), int32()],
            int32(),
        );
        let token = catalog.method_token(&helper, None).unwrap();
        catalog
            .register_method(MethodDeclaration::new(helper, token).with_frame(2, 0, 2))
            .unwrap();

        catalog.register_string("Hi").unwrap();

        let estimate = MemoryEstimate::of(&catalog);
        let program_class = 40 + 4 + 8 + 16;
        let main_bytes = 40 + 4 + 8 + 10;
        let helper_bytes = 40 + 8;

        assert_eq!(estimate.string_bytes, 6);
        assert_eq!(
            estimate.total_bytes,
            program_class + main_bytes + helper_bytes + 6
        );

        assert_eq!(estimate.classes.len(), 2);
        assert_eq!(estimate.classes[0].ty, program());
        assert_eq!(estimate.classes[0].total_bytes, program_class + main_bytes);
        assert_eq!(estimate.classes[1].class_bytes, 0);
        assert_eq!(estimate.classes[1].method_bytes, helper_bytes);

        let line = estimate.classes[0].to_string();
        assert!(line.starts_with("Class App.Program uses 62 bytes for code"));
    }
}
