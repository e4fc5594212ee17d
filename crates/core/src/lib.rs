//! querytally 공통 기반 크레이트
//!
//! 액세스 로그에서 검색 쿼리를 추출해 자동완성용 집계 저장소에 반영하는
//! 파이프라인의 모든 단계가 공유하는 타입을 정의합니다.
//!
//! - [`config`]: `querytally.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`error`]: 단계별 에러 분류 (로그 읽기, 디코딩, 검색 백엔드, 저장소, 재색인)
//! - [`types`]: [`QueryObservation`], [`TallyRecord`] 도메인 타입
//! - [`pipeline`]: 외부 협력자 trait ([`ResultProbe`], [`TallyStore`], [`ReindexTrigger`])
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{
    BackendError, ConfigError, DecodeError, LogReadError, QueryTallyError, StoreError,
    TriggerError,
};

// 설정
pub use config::QueryTallyConfig;

// 외부 협력자 trait
pub use pipeline::{ReindexTrigger, ResultProbe, TallyStore};

// 도메인 타입
pub use types::{QueryObservation, Stage, TallyRecord};
