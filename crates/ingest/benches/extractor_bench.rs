//! 쿼리 추출기 벤치마크
//!
//! 매치되는 라인, 매치되지 않는 라인, 퍼센트 인코딩이 많은 라인의 처리량을 측정합니다.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use querytally_ingest::LineExtractor;

/// 매치되는 짧은 액세스 로그 라인
const MATCHING_LINE: &str = r#"10.1.2.3 - - [12/Mar/2012:10:15:32 +0100] "GET /solr/core1/browse?q=red+shoes&wt=velocity HTTP/1.1" 200 4523"#;

/// 다른 경로로 향한 라인
const NON_MATCHING_LINE: &str = r#"10.1.2.3 - - [12/Mar/2012:10:15:33 +0100] "GET /static/css/main.css HTTP/1.1" 304 0 "http://shop.example.com/" "Mozilla/5.0 (X11; Linux x86_64)""#;

/// 다국어 쿼리 (퍼센트 인코딩 다수)
const ENCODED_LINE: &str = r#"10.1.2.3 - - [12/Mar/2012:10:15:34 +0100] "GET /solr/core1/browse?q=%EC%9A%B4%EB%8F%99%ED%99%94+%EB%B9%A8%EA%B0%84%EC%83%89+caf%C3%A9 HTTP/1.1" 200 812"#;

fn bench_extract(c: &mut Criterion) {
    let extractor = LineExtractor::new("/solr/core1/browse").unwrap();

    let mut group = c.benchmark_group("line_extractor");

    group.throughput(Throughput::Elements(1));
    group.bench_function("matching", |b| {
        b.iter(|| extractor.extract(black_box(MATCHING_LINE)).unwrap())
    });

    group.bench_function("non_matching", |b| {
        b.iter(|| extractor.extract(black_box(NON_MATCHING_LINE)).unwrap())
    });

    group.bench_function("percent_encoded", |b| {
        b.iter(|| extractor.extract(black_box(ENCODED_LINE)).unwrap())
    });

    // 1000건 혼합 처리량
    group.throughput(Throughput::Elements(1000));
    group.bench_function("mixed_1000", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let line = if i % 4 == 0 { MATCHING_LINE } else { NON_MATCHING_LINE };
                extractor.extract(black_box(line)).unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
