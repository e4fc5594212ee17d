//! 에러 타입 — 단계별 에러 정의
//!
//! 각 단계는 자기 에러 타입만 반환하고, 최상위 [`QueryTallyError`]가
//! 어느 단계에서 실패했는지를 보존한 채 이를 감쌉니다.

use crate::types::Stage;

/// querytally 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum QueryTallyError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 파일을 열거나 읽지 못함
    #[error("log read error: {0}")]
    LogRead(#[from] LogReadError),

    /// 추출한 쿼리의 퍼센트 디코딩 실패
    #[error("decode error at line {line}: {source}")]
    Decode {
        /// 문제가 된 로그 라인 번호 (1부터 시작)
        line: usize,
        #[source]
        source: DecodeError,
    },

    /// 검색 백엔드 조회 실패
    #[error("search backend error at line {line}: {source}")]
    Backend {
        /// 조회를 유발한 로그 라인 번호
        line: usize,
        #[source]
        source: BackendError,
    },

    /// 집계 저장소 읽기/쓰기 실패
    ///
    /// `applied`개의 관측은 이미 커밋된 상태입니다.
    #[error("store error after {applied} applied observations{}: {source}", at_query(.query))]
    Store {
        /// 실패 전에 반영된 관측 수
        applied: usize,
        /// 실패한 관측의 쿼리 (연결 단계 실패면 없음)
        query: Option<String>,
        #[source]
        source: StoreError,
    },

    /// 재색인 호출 실패
    #[error("reindex trigger error: {0}")]
    Trigger(#[from] TriggerError),
}

impl QueryTallyError {
    /// 에러가 발생한 단계를 반환합니다.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config(_) => Stage::Config,
            Self::LogRead(_) | Self::Decode { .. } | Self::Backend { .. } => Stage::Ingest,
            Self::Store { .. } => Stage::Reconcile,
            Self::Trigger(_) => Stage::Reindex,
        }
    }
}

impl From<StoreError> for QueryTallyError {
    fn from(source: StoreError) -> Self {
        Self::Store {
            applied: 0,
            query: None,
            source,
        }
    }
}

fn at_query(query: &Option<String>) -> String {
    query
        .as_deref()
        .map(|q| format!(" (query '{q}')"))
        .unwrap_or_default()
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파일 읽기 실패
    #[error("failed to read config {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 로그 소스 읽기 에러
#[derive(Debug, thiserror::Error)]
pub enum LogReadError {
    /// 로그 파일 열기 실패
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 읽는 도중 I/O 실패 (잘못된 UTF-8 포함)
    #[error("cannot read {path} at line {line}: {source}")]
    Read {
        path: String,
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// 퍼센트 디코딩 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// `%` 뒤에 16진수 두 자리가 오지 않음
    #[error("malformed percent-escape at byte {offset} in '{raw}'")]
    MalformedEscape { raw: String, offset: usize },

    /// 디코딩한 바이트가 UTF-8이 아님
    #[error("decoded bytes are not valid UTF-8 in '{raw}'")]
    InvalidUtf8 { raw: String },
}

/// 검색 백엔드 에러
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// 요청 전송/수신 실패
    #[error("request to {endpoint} failed for query '{query}': {reason}")]
    Transport {
        endpoint: String,
        query: String,
        reason: String,
    },

    /// 성공이 아닌 HTTP 상태
    #[error("{endpoint} answered HTTP {status} for query '{query}'")]
    Status {
        endpoint: String,
        query: String,
        status: u16,
    },

    /// 응답 본문에서 결과 수를 읽을 수 없음
    #[error("malformed response from {endpoint} for query '{query}': {reason}")]
    MalformedResponse {
        endpoint: String,
        query: String,
        reason: String,
    },
}

/// 저장소 에러
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 연결 실패
    #[error("connection to {target} failed: {reason}")]
    Connection { target: String, reason: String },

    /// 쿼리/갱신 실패
    #[error("{operation} failed for query '{query}': {reason}")]
    Query {
        /// 수행하던 작업 (find, update, insert)
        operation: String,
        query: String,
        reason: String,
    },
}

/// 재색인 호출 에러
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// 엔드포인트 URL이 잘못됨
    #[error("invalid reindex endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// 요청 전송/수신 실패
    #[error("reindex request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// 성공이 아닌 HTTP 상태
    #[error("reindex endpoint {endpoint} answered HTTP {status}")]
    Status { endpoint: String, status: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_carries_raw_capture() {
        let err: QueryTallyError = QueryTallyError::Decode {
            line: 7,
            source: DecodeError::MalformedEscape {
                raw: "red%zzshoes".to_owned(),
                offset: 3,
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("red%zzshoes"));
        assert_eq!(err.stage(), Stage::Ingest);
    }

    #[test]
    fn store_error_converts_with_zero_applied() {
        let err: QueryTallyError = StoreError::Connection {
            target: "autosuggest.db".to_owned(),
            reason: "unable to open".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            QueryTallyError::Store {
                applied: 0,
                query: None,
                ..
            }
        ));
        assert_eq!(err.stage(), Stage::Reconcile);
        assert!(err.to_string().contains("autosuggest.db"));
        assert!(!err.to_string().contains("(query"));
    }

    #[test]
    fn backend_error_names_endpoint_and_query() {
        let err = BackendError::Status {
            endpoint: "http://localhost:8983/solr/core1".to_owned(),
            query: "red shoes".to_owned(),
            status: 503,
        };
        let msg = err.to_string();
        assert!(msg.contains("8983"));
        assert!(msg.contains("red shoes"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn trigger_error_maps_to_reindex_stage() {
        let err: QueryTallyError = TriggerError::Status {
            endpoint: "http://localhost:8983/solr/core2/indexer".to_owned(),
            status: 500,
        }
        .into();
        assert_eq!(err.stage(), Stage::Reindex);
    }

    #[test]
    fn log_read_error_maps_to_ingest_stage() {
        let err: QueryTallyError = LogReadError::Open {
            path: "/var/log/missing.log".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        }
        .into();
        assert_eq!(err.stage(), Stage::Ingest);
        assert!(err.to_string().contains("missing.log"));
    }
}
