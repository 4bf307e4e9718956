//! CSRF benchmarks for formguard
//!
//! `constant_time_eq` is measured with the first mismatch at the start and at
//! the end of the input; the two timings should be indistinguishable.

use criterion::{Criterion, criterion_group, criterion_main};
use formguard::{
    CookieSigner, CsrfConfig, CsrfGuard, CsrfSettings, Exchange, HashAlgorithm, TokenGenerator,
    constant_time_eq,
};
use std::hint::black_box;
use std::sync::Arc;

fn comparison_benchmark(c: &mut Criterion) {
    let token = TokenGenerator::default().generate().unwrap();
    let stored = token.as_str().as_bytes().to_vec();

    let mut early = stored.clone();
    early[0] ^= 0x01;
    let mut late = stored.clone();
    let last = late.len() - 1;
    late[last] ^= 0x01;

    let mut group = c.benchmark_group("constant_time_eq");

    group.bench_function("mismatch_first_byte", |b| {
        b.iter(|| black_box(constant_time_eq(black_box(&stored), black_box(&early))))
    });

    group.bench_function("mismatch_last_byte", |b| {
        b.iter(|| black_box(constant_time_eq(black_box(&stored), black_box(&late))))
    });

    group.bench_function("equal", |b| {
        b.iter(|| black_box(constant_time_eq(black_box(&stored), black_box(&stored))))
    });

    group.finish();
}

fn signing_benchmark(c: &mut Criterion) {
    let payload = br#"{"csrf_token":"0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0"}"#;

    let mut group = c.benchmark_group("cookie_signing");

    for algorithm in [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ] {
        let signer = CookieSigner::new(b"benchmark-secret".to_vec(), algorithm).unwrap();
        let sealed = signer.seal(payload);

        group.bench_function(format!("seal_{}", algorithm.as_str()), |b| {
            b.iter(|| black_box(signer.seal(black_box(payload))))
        });

        group.bench_function(format!("open_{}", algorithm.as_str()), |b| {
            b.iter(|| black_box(signer.open(black_box(&sealed)).is_ok()))
        });
    }

    group.finish();
}

fn guard_benchmark(c: &mut Criterion) {
    let settings = Arc::new(CsrfSettings::new(CsrfConfig::new("benchmark-secret")).unwrap());

    let mut page = Exchange::get();
    let token = CsrfGuard::new(settings.clone())
        .embed_value(&mut page)
        .unwrap();
    let cookie = page.outgoing_cookies()[0].clone();

    let mut group = c.benchmark_group("csrf_guard");

    group.bench_function("embed_value_cookie", |b| {
        b.iter(|| {
            let mut ctx = Exchange::get();
            let mut guard = CsrfGuard::new(settings.clone());
            black_box(guard.embed_value(&mut ctx).unwrap())
        })
    });

    group.bench_function("check_cookie", |b| {
        b.iter(|| {
            let mut ctx = Exchange::post()
                .with_cookie(cookie.name.clone(), cookie.value.clone())
                .with_form_field("csrf_token", token.as_str());
            let mut guard = CsrfGuard::new(settings.clone());
            black_box(guard.check(&mut ctx, false).is_ok())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    comparison_benchmark,
    signing_benchmark,
    guard_benchmark
);
criterion_main!(benches);
