use criterion::{Criterion, black_box, criterion_group, criterion_main};
use linkres_core::{
    EngineConfig, LoadedCatalog, LookupBackend, ReferenceCatalog, SourceItem, link_item, normalize,
};

fn sample_catalog(n: usize) -> LoadedCatalog {
    let rows = (0..n).map(|i| {
        vec![format!(
            "Institut de Recherche en Sciences et Technologies numero {i}"
        )]
    });
    let catalog = ReferenceCatalog::from_rows(rows).unwrap();
    LoadedCatalog::build(catalog, LookupBackend::Fss)
}

fn bench_normalize_short(c: &mut Criterion) {
    c.bench_function("normalize_short", |b| {
        b.iter(|| normalize::normalize_and_tokens(black_box("Metiers de la chimie"), false));
    });
}

fn bench_normalize_long(c: &mut Criterion) {
    let input =
        "Ecole Superieure de Physique et Chimie Industrielles de la Ville de Paris ESPCI".repeat(4);
    c.bench_function("normalize_long", |b| {
        b.iter(|| normalize::normalize_and_tokens(black_box(&input), false));
    });
}

fn bench_link_small_catalog(c: &mut Criterion) {
    let loaded = sample_catalog(100);
    let item = SourceItem::new(
        "d1",
        "Institut de Recherche en Sciences et Technologies numero 42",
    );
    let config = EngineConfig::default();
    c.bench_function("link_small_catalog", |b| {
        b.iter(|| link_item(black_box(&item), black_box(&loaded), black_box(&config), 4));
    });
}

fn bench_link_large_catalog(c: &mut Criterion) {
    let loaded = sample_catalog(5_000);
    let item = SourceItem::new(
        "d1",
        "Institut de Recherche en Sciences et Technologies numero 4200",
    );
    let config = EngineConfig::default();
    c.bench_function("link_large_catalog", |b| {
        b.iter(|| link_item(black_box(&item), black_box(&loaded), black_box(&config), 4));
    });
}

criterion_group!(
    benches,
    bench_normalize_short,
    bench_normalize_long,
    bench_link_small_catalog,
    bench_link_large_catalog,
);
criterion_main!(benches);
