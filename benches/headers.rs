use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use hdrbridge::builder::{build_header, IdDomains};
use hdrbridge::model::header_map::HeaderMap;
use hdrbridge::parser::header::parse_header;

fn load_fixture(name: &str) -> Vec<u8> {
    let fixture_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(fixture_path).unwrap()
}

fn bench_parse_header(c: &mut Criterion) {
    let well_formed = load_fixture("well_formed.eml");
    let malformed = load_fixture("malformed.eml");

    c.bench_function("parse_well_formed", |b| {
        b.iter(|| parse_header(HeaderMap::parse(&well_formed)))
    });
    c.bench_function("parse_malformed", |b| {
        b.iter(|| parse_header(HeaderMap::parse(&malformed)))
    });
}

fn bench_build_header(c: &mut Criterion) {
    let mut msg = parse_header(HeaderMap::parse(&load_fixture("well_formed.eml")));
    msg.id = "Zx81qQ==".into();
    msg.conversation_id = "conv-77".into();
    let domains = IdDomains::default();

    c.bench_function("build_header", |b| b.iter(|| build_header(&msg, &domains)));
}

criterion_group!(benches, bench_parse_header, bench_build_header);
criterion_main!(benches);
