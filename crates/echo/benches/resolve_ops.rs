//! Node Resolution Benchmarks
//!
//! Benchmarks for cached and fresh element resolution against the
//! in-memory driver, plus selector parsing.
//!
//! Run with: `cargo bench --bench resolve_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use echo::mock::CompoundSelector;
use echo::prelude::*;

fn page(rows: usize) -> (Arc<MockDriver>, Browser, MockKey) {
    let driver = Arc::new(MockDriver::new());
    let body = driver.insert(None, MockElement::new("body"));
    let list = driver.insert(Some(body), MockElement::new("ul").id("list"));
    for i in 0..rows {
        driver.insert(
            Some(list),
            MockElement::new("li").class("row").attr("data-row", i.to_string()).text(format!("row {i}")),
        );
    }
    let browser = Browser::new(driver.clone(), BrowserConfig::default());
    (driver, browser, list)
}

fn bench_cached_resolve(c: &mut Criterion) {
    let (_driver, browser, _) = page(50);
    let node = browser.node(Locator::id("list"));
    node.resolve().unwrap();

    c.bench_function("resolve_cached", |bench| {
        bench.iter(|| black_box(node.resolve().unwrap()));
    });
}

fn bench_fresh_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_fresh");

    for rows in [10usize, 100, 1_000] {
        let (_driver, browser, _) = page(rows);
        let node = browser.node(Locator::css("li[data-row='5']"));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &node, |bench, node| {
            bench.iter(|| {
                node.invalidate();
                black_box(node.resolve().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_nested_after_rerender(c: &mut Criterion) {
    let (driver, browser, list) = page(20);
    let parent = browser.node(Locator::id("list"));
    let child = parent.child(Locator::class_name("row"));
    let mut key = list;

    c.bench_function("resolve_nested_after_rerender", |bench| {
        bench.iter(|| {
            key = driver.rerender(key).unwrap();
            black_box(child.resolve().unwrap())
        });
    });
}

fn bench_selector_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_parsing");

    let selectors = vec![
        ("tag", "button"),
        ("id", "#submit"),
        ("classes", "li.row.active"),
        ("attribute", "input[type='checkbox']"),
        ("checked", "input[name=plan]:checked"),
    ];

    for (name, selector) in selectors {
        group.bench_with_input(BenchmarkId::from_parameter(name), &selector, |bench, sel| {
            bench.iter(|| black_box(CompoundSelector::parse(black_box(sel)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cached_resolve,
    bench_fresh_resolve,
    bench_nested_after_rerender,
    bench_selector_parsing
);
criterion_main!(benches);
