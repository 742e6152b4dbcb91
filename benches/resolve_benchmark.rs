//! Performance benchmarks for resolution and join.
//!
//! Run with: cargo bench --bench resolve_benchmark

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sbom_join::model::{Identifier, PackageWithDependencyRefs, RawPackage};
use sbom_join::{join_sboms, resolve, Sbom};
use std::hint::black_box;

/// Generate a document with `count` packages, each depending on up to four
/// later packages by document reference, plus one dangling reference.
fn generate_records(prefix: &str, count: usize) -> Vec<PackageWithDependencyRefs> {
    (0..count)
        .map(|i| {
            let name = format!("{prefix}-component-{i}");
            let version = format!("1.{}.{}", i % 10, i % 100);
            let raw = RawPackage::new(&name, format!("pkg:npm/{name}@{version}"))
                .with_version(version)
                .with_identifier(Identifier::bom_ref(&name))
                .with_identifier(Identifier::new("sha-256", format!("{i:064x}")));

            let mut record = PackageWithDependencyRefs::new(raw);
            for step in [1, 7, 31, 127] {
                let target = i + step;
                if target < count {
                    record = record.depends_on(vec![Identifier::bom_ref(format!(
                        "{prefix}-component-{target}"
                    ))]);
                }
            }
            record.depends_on(vec![Identifier::bom_ref("not-in-document")])
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.sample_size(20);

    for size in [100, 1_000, 10_000] {
        let records = generate_records("app", size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| resolve(black_box(records)));
        });
    }

    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");
    group.sample_size(20);

    for size in [1_000, 10_000] {
        let (declared, _) = Sbom::from_records("declared", &generate_records("app", size));
        // Half overlaps with the declaration, half is new
        let mut discovered_records = generate_records("app", size / 2);
        discovered_records.extend(generate_records("scan", size / 2));
        let (discovered, _) = Sbom::from_records("discovered", &discovered_records);

        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(declared, discovered),
            |b, (declared, discovered)| {
                b.iter(|| {
                    join_sboms(
                        black_box(std::slice::from_ref(declared)),
                        black_box(std::slice::from_ref(discovered)),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_join);
criterion_main!(benches);
