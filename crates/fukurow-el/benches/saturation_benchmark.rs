use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fukurow_el::{ClassExpressionSaturation, ElReasoner, SaturationConfig};
use fukurow_el_index::{index_ontology, Axiom, ClassExpression, Ontology};
use std::sync::Arc;

fn class(i: usize) -> ClassExpression {
    ClassExpression::class(format!("http://example.org/Class{}", i))
}

/// A subclass chain where every class also points to its successor over a
/// transitive part-of property
fn create_test_ontology(size: usize) -> Ontology {
    let mut ontology = Ontology::new();
    let part_of = "http://example.org/partOf";
    ontology.add_axiom(Axiom::TransitiveObjectProperty(part_of.into()));

    for i in 0..size {
        if i > 0 {
            ontology.add_axiom(Axiom::SubClassOf(class(i), class(i - 1)));
        }
        ontology.add_axiom(Axiom::SubClassOf(
            class(i),
            ClassExpression::some(part_of, class((i + 1) % size)),
        ));
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::and([class(i), ClassExpression::some(part_of, class(0))]),
            class(size + i % 7),
        ));
    }

    ontology
}

fn benchmark_indexing(c: &mut Criterion) {
    let sizes = vec![10, 50, 100];

    for size in sizes {
        let ontology = create_test_ontology(size);
        c.bench_function(&format!("el_indexing_{}_classes", size), |b| {
            b.iter(|| {
                let _index = index_ontology(black_box(&ontology)).unwrap();
            });
        });
    }
}

fn benchmark_saturation(c: &mut Criterion) {
    let sizes = vec![10, 50, 100];

    for size in sizes {
        let index = Arc::new(index_ontology(&create_test_ontology(size)).unwrap());
        for workers in [1, 4] {
            c.bench_function(&format!("el_saturation_{}_classes_{}_workers", size, workers), |b| {
                b.iter(|| {
                    let config = SaturationConfig::with_workers(workers);
                    let engine = ClassExpressionSaturation::new(Arc::clone(&index), config);
                    engine.submit_all_classes().unwrap();
                    let _outcome = engine.saturate().unwrap();
                });
            });
        }
    }
}

fn benchmark_classification(c: &mut Criterion) {
    let ontology = create_test_ontology(50);
    let reasoner = ElReasoner::with_config(SaturationConfig::with_workers(4));

    c.bench_function("el_classification_50_classes", |b| {
        b.iter(|| {
            let _result = reasoner.classify(black_box(&ontology)).unwrap();
        });
    });
}

criterion_group!(benches, benchmark_indexing, benchmark_saturation, benchmark_classification);
criterion_main!(benches);
