//! 설정 관리 — querytally.toml 파싱 및 런타임 설정
//!
//! [`QueryTallyConfig`]는 한 번의 실행에 필요한 모든 설정을 담습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`QUERYTALLY_SEARCH_ENDPOINT=http://...` 형식)
//! 3. 설정 파일 (`querytally.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), querytally_core::error::QueryTallyError> {
//! use querytally_core::config::QueryTallyConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = QueryTallyConfig::load("querytally.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = QueryTallyConfig::parse("[ingest]\nhandler_path = \"/solr/core1/browse\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, QueryTallyError};

/// 타임아웃 허용 최댓값 (초)
const MAX_TIMEOUT_SECS: u64 = 300;

/// querytally 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryTallyConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 추출 설정
    #[serde(default)]
    pub ingest: IngestConfig,
    /// 검색 백엔드 설정
    #[serde(default)]
    pub search: SearchConfig,
    /// 집계 저장소 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 재색인 설정
    #[serde(default)]
    pub reindex: ReindexConfig,
}

impl QueryTallyConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, QueryTallyError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값을 반환합니다 (환경변수 오버라이드와 검증 없음).
    ///
    /// 설정 파일을 명시하지 않은 실행에서 사용합니다. 호출자는 오버라이드를
    /// 모두 적용한 뒤 [`validate`](Self::validate)를 호출해야 합니다.
    pub async fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self, QueryTallyError> {
        let path = path.as_ref();
        match Self::from_file(path).await {
            Err(QueryTallyError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file absent, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, QueryTallyError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::ReadFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, QueryTallyError> {
        toml::from_str(toml_str).map_err(|e| {
            QueryTallyError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `QUERYTALLY_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "QUERYTALLY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "QUERYTALLY_GENERAL_LOG_FORMAT");

        // Ingest
        override_string(
            &mut self.ingest.handler_path,
            "QUERYTALLY_INGEST_HANDLER_PATH",
        );

        // Search
        override_string(&mut self.search.endpoint, "QUERYTALLY_SEARCH_ENDPOINT");
        override_u64(
            &mut self.search.timeout_secs,
            "QUERYTALLY_SEARCH_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.search.cache_probes,
            "QUERYTALLY_SEARCH_CACHE_PROBES",
        );

        // Store
        override_string(&mut self.store.path, "QUERYTALLY_STORE_PATH");
        override_string(&mut self.store.table, "QUERYTALLY_STORE_TABLE");

        // Reindex
        override_bool(&mut self.reindex.enabled, "QUERYTALLY_REINDEX_ENABLED");
        override_string(&mut self.reindex.endpoint, "QUERYTALLY_REINDEX_ENDPOINT");
        override_u64(
            &mut self.reindex.timeout_secs,
            "QUERYTALLY_REINDEX_TIMEOUT_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), QueryTallyError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // 핸들러 경로는 로그의 요청 경로와 그대로 비교되므로 '/'로 시작해야 함
        if !self.ingest.handler_path.starts_with('/') {
            return Err(invalid("ingest.handler_path", "must start with '/'"));
        }
        if self.ingest.handler_path.contains(char::is_whitespace) {
            return Err(invalid(
                "ingest.handler_path",
                "must not contain whitespace",
            ));
        }

        validate_http_url("search.endpoint", &self.search.endpoint)?;
        validate_timeout("search.timeout_secs", self.search.timeout_secs)?;

        if self.store.path.is_empty() {
            return Err(invalid("store.path", "must not be empty"));
        }
        if !is_sql_identifier(&self.store.table) {
            return Err(invalid(
                "store.table",
                "must start with a letter or '_' and contain only ASCII letters, digits, '_'",
            ));
        }

        if self.reindex.enabled {
            validate_http_url("reindex.endpoint", &self.reindex.endpoint)?;
            validate_timeout("reindex.timeout_secs", self.reindex.timeout_secs)?;
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 로그 추출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 검색 요청 핸들러 경로 (예: `/solr/core1/browse`)
    pub handler_path: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            handler_path: "/solr/core1/browse".to_owned(),
        }
    }
}

/// 검색 백엔드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Solr 코어 기본 URL (`/select`가 뒤에 붙음)
    pub endpoint: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 한 실행 안에서 같은 쿼리의 조회 결과 재사용
    pub cache_probes: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8983/solr/core1".to_owned(),
            timeout_secs: 10,
            cache_probes: true,
        }
    }
}

/// 집계 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite 데이터베이스 파일 경로
    pub path: String,
    /// 집계 테이블 이름
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "autosuggest.db".to_owned(),
            table: "autosuggest".to_owned(),
        }
    }
}

/// 재색인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReindexConfig {
    /// 집계 반영 후 재색인 호출 여부
    pub enabled: bool,
    /// 재색인 엔드포인트 (DataImportHandler full-import 명령)
    pub endpoint: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:8983/solr/core2/indexer/autosuggest?command=full-import"
                .to_owned(),
            timeout_secs: 30,
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> QueryTallyError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

fn validate_http_url(field: &str, value: &str) -> Result<(), QueryTallyError> {
    let url = url::Url::parse(value).map_err(|e| invalid(field, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(
            field,
            format!("scheme '{}' is not http or https", other),
        )),
    }
}

fn validate_timeout(field: &str, secs: u64) -> Result<(), QueryTallyError> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(invalid(field, format!("must be 1-{}", MAX_TIMEOUT_SECS)));
    }
    Ok(())
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
