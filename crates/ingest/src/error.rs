//! 수집 단계 에러 타입
//!
//! [`IngestError`]는 로그 읽기, 디코딩, 검색 백엔드 조회 실패를
//! 라인 번호와 함께 표현합니다. `From<IngestError> for QueryTallyError`
//! 변환으로 상위 레이어에서 `?`로 전파할 수 있습니다.

use querytally_core::error::{
    BackendError, ConfigError, DecodeError, LogReadError, QueryTallyError,
};

/// 수집 단계 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 로그 소스 열기/읽기 실패
    #[error(transparent)]
    LogRead(#[from] LogReadError),

    /// 추출한 쿼리 디코딩 실패
    #[error("decode error at line {line}: {source}")]
    Decode {
        /// 로그 라인 번호 (1부터 시작)
        line: usize,
        #[source]
        source: DecodeError,
    },

    /// 검색 백엔드 조회 실패
    #[error("search backend error at line {line}: {source}")]
    Backend {
        /// 로그 라인 번호 (1부터 시작)
        line: usize,
        #[source]
        source: BackendError,
    },

    /// 핸들러 경로로 패턴을 만들 수 없음
    #[error("invalid handler pattern for '{handler_path}': {source}")]
    Pattern {
        handler_path: String,
        #[source]
        source: regex::Error,
    },

    /// HTTP 클라이언트 준비 실패
    #[error("cannot prepare search client for {endpoint}: {reason}")]
    Client { endpoint: String, reason: String },
}

impl From<IngestError> for QueryTallyError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::LogRead(e) => QueryTallyError::LogRead(e),
            IngestError::Decode { line, source } => QueryTallyError::Decode { line, source },
            IngestError::Backend { line, source } => QueryTallyError::Backend { line, source },
            IngestError::Pattern {
                handler_path,
                source,
            } => ConfigError::InvalidValue {
                field: "ingest.handler_path".to_owned(),
                reason: format!("'{}': {}", handler_path, source),
            }
            .into(),
            IngestError::Client { endpoint, reason } => ConfigError::InvalidValue {
                field: "search.endpoint".to_owned(),
                reason: format!("'{}': {}", endpoint, reason),
            }
            .into(),
        }
    }
}
