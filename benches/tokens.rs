//! Benchmarks for token allocation and snapshot differences.
//!
//! Covers the hot paths of a build session:
//! - Type tokens for plain, composed and special generic instantiations
//! - Method token resolution through a class replacement
//! - String deduplication
//! - Differences between a kernel and a program snapshot

extern crate mculink;

use criterion::{criterion_group, criterion_main, Criterion};
use mculink::prelude::*;
use std::{hint::black_box, sync::Arc};

fn sys(name: &str) -> TypeSig {
    TypeSig::named("System", name)
}

fn list_of(arg: TypeSig) -> TypeSig {
    TypeSig::Generic {
        definition: TypeName::generic("System.Collections.Generic", "List`1", 1),
        args: vec![arg],
    }
}

fn registry() -> Arc<MetadataRegistry> {
    let public_static = MethodAttributes::PUBLIC | MethodAttributes::STATIC;
    let registry = MetadataRegistry::new();
    registry.insert(TypeDescriptor::new(TypeName::new("System", "Object")));
    registry.insert(
        TypeDescriptor::new(TypeName::new("System", "Math"))
            .with_method("Abs", vec![sys("Int32")], sys("Int32"), public_static)
            .with_method("Abs", vec![sys("Double")], sys("Double"), public_static),
    );
    registry.insert(
        TypeDescriptor::new(TypeName::new("Embedded", "MiniMath"))
            .with_method("Abs", vec![sys("Int32")], sys("Int32"), public_static)
            .with_method("Abs", vec![sys("Double")], sys("Double"), public_static),
    );
    Arc::new(registry)
}

/// Catalog with `count` declared classes, each with one method and one string.
fn populated(count: usize) -> Catalog {
    let mut catalog = Catalog::new(LinkerSettings::ram_only(), registry());
    for i in 0..count {
        let ty = TypeSig::named("App", &format!("Class{i}"));
        let token = catalog.type_token(&ty).unwrap();
        catalog.register_class(ClassDeclaration::new(ty.clone(), token)).unwrap();

        let method = MethodSig::new(ty, "Run", vec![], TypeSig::Void);
        let token = catalog.method_token(&method, None).unwrap();
        catalog.register_method(MethodDeclaration::new(method, token)).unwrap();
        catalog.register_string(&format!("Message {i}")).unwrap();
    }
    catalog
}

/// Benchmark first-time allocation of plain type tokens.
fn bench_type_tokens_plain(c: &mut Criterion) {
    let types: Vec<TypeSig> = (0..256)
        .map(|i| TypeSig::named("App", &format!("Type{i}")))
        .collect();

    c.bench_function("tokens_type_plain_256", |b| {
        b.iter(|| {
            let mut catalog = Catalog::new(LinkerSettings::ram_only(), registry());
            for ty in &types {
                black_box(catalog.type_token(black_box(ty)).unwrap());
            }
        });
    });
}

/// Benchmark `List<int>`, composed by adding two tokens.
fn bench_type_token_composed(c: &mut Criterion) {
    let ty = list_of(sys("Int32"));

    c.bench_function("tokens_type_composed", |b| {
        b.iter(|| {
            let mut catalog = Catalog::new(LinkerSettings::ram_only(), registry());
            black_box(catalog.type_token(black_box(&ty)).unwrap())
        });
    });
}

/// Benchmark `Dictionary<string, List<int>>`, which needs a special type group.
fn bench_type_token_special(c: &mut Criterion) {
    let ty = TypeSig::Generic {
        definition: TypeName::generic("System.Collections.Generic", "Dictionary`2", 2),
        args: vec![sys("String"), list_of(sys("Int32"))],
    };

    c.bench_function("tokens_type_special", |b| {
        b.iter(|| {
            let mut catalog = Catalog::new(LinkerSettings::ram_only(), registry());
            black_box(catalog.type_token(black_box(&ty)).unwrap())
        });
    });
}

/// Benchmark resolving `Math.Abs(double)` to its replacement.
fn bench_method_token_replaced(c: &mut Criterion) {
    let mut catalog = Catalog::new(LinkerSettings::ram_only(), registry());
    catalog
        .register_class_replacement(
            sys("Math"),
            TypeSig::named("Embedded", "MiniMath"),
            false,
            false,
        )
        .unwrap();
    let method = MethodSig::new(sys("Math"), "Abs", vec![sys("Double")], sys("Double"));

    c.bench_function("tokens_method_replaced", |b| {
        b.iter(|| black_box(catalog.method_token(black_box(&method), None).unwrap()));
    });
}

/// Benchmark looking up an already registered string.
fn bench_string_dedup(c: &mut Criterion) {
    let mut catalog = populated(512);

    c.bench_function("tokens_string_dedup", |b| {
        b.iter(|| black_box(catalog.register_string(black_box("Message 256")).unwrap()));
    });
}

/// Benchmark snapshot creation plus diff of a program on top of a kernel.
fn bench_snapshot_diff(c: &mut Criterion) {
    let mut kernel = populated(1024);
    let baseline = kernel.create_kernel_snapshot();

    let mut program = kernel.fork(LinkerSettings::ram_only()).unwrap();
    for i in 0..64 {
        program.register_string(&format!("Program {i}")).unwrap();
    }

    c.bench_function("snapshot_diff_1024", |b| {
        b.iter(|| {
            let snapshot = program.snapshot();
            let diff = baseline.diff_to(black_box(&snapshot));
            black_box(diff.string_payload_size())
        });
    });
}

criterion_group!(
    benches,
    bench_type_tokens_plain,
    bench_type_token_composed,
    bench_type_token_special,
    bench_method_token_replaced,
    bench_string_dedup,
    bench_snapshot_diff
);
criterion_main!(benches);
