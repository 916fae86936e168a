//! Performance benchmarks for folio-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use folio_engine::{ChangeEvent, FormEngine, RuleSet, SubmitEvent};

fn book_rules() -> RuleSet {
    RuleSet::new()
        .required("Require")
        .min_length(1, "Too short")
        .max_length(64, "Too long")
}

fn form_with_fields(count: usize) -> FormEngine {
    let mut form = FormEngine::without_handler();
    for i in 0..count {
        form.register(format!("field-{}", i), book_rules());
    }
    form
}

fn bench_form_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("form_operations");

    group.bench_function("register", |b| {
        b.iter(|| {
            let mut form = FormEngine::without_handler();
            form.register(black_box("title"), book_rules());
            form
        })
    });

    group.bench_function("change_unarmed", |b| {
        let mut form = form_with_fields(10);
        b.iter(|| form.on_change(black_box(ChangeEvent::new("field-5", "Book 5"))))
    });

    group.bench_function("change_armed", |b| {
        let mut form = form_with_fields(10);
        form.on_submit(&mut SubmitEvent::new());
        b.iter(|| form.on_change(black_box(ChangeEvent::new("field-5", "Book 5"))))
    });

    group.bench_function("email_check", |b| {
        b.iter(|| folio_engine::is_valid_email(black_box("reader@library.example.org")))
    });

    group.finish();
}

fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit");

    for size in [2, 20, 200] {
        group.bench_with_input(BenchmarkId::new("all_invalid", size), &size, |b, &size| {
            let mut form = form_with_fields(size);
            b.iter(|| form.on_submit(black_box(&mut SubmitEvent::new())))
        });

        group.bench_with_input(BenchmarkId::new("all_valid", size), &size, |b, &size| {
            let mut form = form_with_fields(size);
            for i in 0..size {
                form.on_change(ChangeEvent::new(format!("field-{}", i), "value"));
            }
            b.iter(|| form.on_submit(black_box(&mut SubmitEvent::new())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_form_operations, bench_submit);
criterion_main!(benches);
