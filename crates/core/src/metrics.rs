//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수로 `metrics::counter!()`를 호출합니다.
//! 레코더가 설치되지 않은 경우 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `querytally_`
//! - 단계명: `ingest_`, `tally_`, `reindex_`
//! - 접미어: `_total` (counter)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (hit, miss)
pub const LABEL_RESULT: &str = "result";

// ─── Ingest 메트릭 ────────────────────────────────────────────────

/// Ingest: 읽은 로그 라인 수 (counter)
pub const INGEST_LINES_READ_TOTAL: &str = "querytally_ingest_lines_read_total";

/// Ingest: 쿼리가 추출된 라인 수 (counter)
pub const INGEST_QUERIES_EXTRACTED_TOTAL: &str = "querytally_ingest_queries_extracted_total";

/// Ingest: 검색 백엔드 조회 수 (counter, label: result)
pub const INGEST_PROBES_TOTAL: &str = "querytally_ingest_probes_total";

/// Ingest: 캐시로 응답한 조회 수 (counter)
pub const INGEST_PROBE_CACHE_HITS_TOTAL: &str = "querytally_ingest_probe_cache_hits_total";

// ─── Tally 메트릭 ─────────────────────────────────────────────────

/// Tally: 새로 삽입된 레코드 수 (counter)
pub const TALLY_INSERTED_TOTAL: &str = "querytally_tally_inserted_total";

/// Tally: 갱신된 레코드 수 (counter)
pub const TALLY_UPDATED_TOTAL: &str = "querytally_tally_updated_total";

// ─── Reindex 메트릭 ───────────────────────────────────────────────

/// Reindex: 재색인 호출 수 (counter, label: result)
pub const REINDEX_TRIGGERS_TOTAL: &str = "querytally_reindex_triggers_total";

/// 모든 메트릭에 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        INGEST_LINES_READ_TOTAL,
        "Total number of access log lines read"
    );
    describe_counter!(
        INGEST_QUERIES_EXTRACTED_TOTAL,
        "Lines that matched the handler pattern and yielded a query"
    );
    describe_counter!(
        INGEST_PROBES_TOTAL,
        "Search backend probes issued, labelled by hit or miss"
    );
    describe_counter!(
        INGEST_PROBE_CACHE_HITS_TOTAL,
        "Probes answered from the in-run cache"
    );
    describe_counter!(TALLY_INSERTED_TOTAL, "Tally records inserted");
    describe_counter!(TALLY_UPDATED_TOTAL, "Tally records incremented");
    describe_counter!(
        REINDEX_TRIGGERS_TOTAL,
        "Reindex calls issued, labelled by success or failure"
    );
}
