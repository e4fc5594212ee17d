//! 액세스 로그에서 검색 쿼리를 추출하고 결과 존재 여부를 확인하는 수집 단계
//!
//! # 모듈 구성
//!
//! - [`extractor`]: 로그 한 줄에서 `GET {handler}?q=` 쿼리를 추출하고 디코딩
//! - [`probe`]: Solr dismax 조회로 결과 존재 여부 확인, 실행 내 캐시
//! - [`ingester`]: 로그 소스를 순서대로 읽어 관측 목록 생성
//! - [`error`]: 도메인 에러 타입
//!
//! # 흐름
//!
//! ```text
//! log lines -> LineExtractor -> ResultProbe -> Vec<QueryObservation>
//!                 |                 |
//!           regex + decode     Solr /select
//! ```

pub mod error;
pub mod extractor;
pub mod ingester;
pub mod probe;

// --- 주요 타입 re-export ---

pub use error::IngestError;
pub use extractor::{LineExtractor, decode_query};
pub use ingester::{IngestSummary, Ingestion, LogIngester};
pub use probe::{CachedProbe, SolrProbe};
