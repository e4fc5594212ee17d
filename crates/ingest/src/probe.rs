//! 검색 결과 존재 여부 확인
//!
//! [`SolrProbe`]는 Solr `/select` 핸들러에 dismax 쿼리를 보내고
//! `response.numFound`가 0보다 큰지 확인합니다. 결과 문서는 필요 없으므로
//! `rows=0`으로 요청합니다.
//!
//! [`CachedProbe`]는 한 번의 실행 안에서 같은 쿼리의 조회를 한 번만 보내도록
//! 다른 [`ResultProbe`]를 감쌉니다. 실행이 끝나면 캐시도 함께 버려집니다.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use metrics::counter;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use querytally_core::error::BackendError;
use querytally_core::metrics::{INGEST_PROBE_CACHE_HITS_TOTAL, INGEST_PROBES_TOTAL, LABEL_RESULT};
use querytally_core::pipeline::ResultProbe;

use crate::error::IngestError;

/// Solr select 응답 중 필요한 부분
#[derive(Debug, Deserialize)]
struct SelectResponse {
    response: SelectResult,
}

#[derive(Debug, Deserialize)]
struct SelectResult {
    #[serde(rename = "numFound")]
    num_found: u64,
}

/// Solr select 응답 본문에서 결과 수를 읽습니다.
fn parse_num_found(body: &str) -> Result<u64, serde_json::Error> {
    serde_json::from_str::<SelectResponse>(body).map(|r| r.response.num_found)
}

/// Solr 기반 결과 존재 여부 확인기
pub struct SolrProbe {
    client: reqwest::Client,
    /// 설정된 코어 URL (에러 메시지용)
    endpoint: String,
    /// `{endpoint}/select`
    select_url: Url,
}

impl SolrProbe {
    /// 코어 URL과 요청 타임아웃으로 생성합니다.
    ///
    /// `endpoint`는 `http://localhost:8983/solr/core1`처럼 코어까지의 경로입니다.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, IngestError> {
        let client_error = |reason: String| IngestError::Client {
            endpoint: endpoint.to_owned(),
            reason,
        };

        let select_url = Url::parse(&format!("{}/select", endpoint.trim_end_matches('/')))
            .map_err(|e| client_error(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| client_error(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            select_url,
        })
    }

    /// 쿼리 하나에 대한 select 요청 URL
    fn request_url(&self, query: &str) -> Url {
        let mut url = self.select_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("defType", "dismax")
            .append_pair("rows", "0")
            .append_pair("wt", "json");
        url
    }
}

impl ResultProbe for SolrProbe {
    async fn has_results(&self, query: &str) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(self.request_url(query))
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                endpoint: self.endpoint.clone(),
                query: query.to_owned(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint: self.endpoint.clone(),
                query: query.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| BackendError::Transport {
            endpoint: self.endpoint.clone(),
            query: query.to_owned(),
            reason: e.to_string(),
        })?;
        let num_found = parse_num_found(&body).map_err(|e| BackendError::MalformedResponse {
            endpoint: self.endpoint.clone(),
            query: query.to_owned(),
            reason: e.to_string(),
        })?;

        let hit = num_found > 0;
        counter!(INGEST_PROBES_TOTAL, LABEL_RESULT => if hit { "hit" } else { "miss" })
            .increment(1);
        debug!(query, num_found, "search probe answered");
        Ok(hit)
    }
}

/// 실행 내 조회 결과 캐시
///
/// 실패한 조회는 캐시하지 않습니다.
pub struct CachedProbe<P> {
    inner: P,
    answers: Mutex<HashMap<String, bool>>,
}

impl<P: ResultProbe> CachedProbe<P> {
    /// 다른 확인기를 감쌉니다.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            answers: Mutex::new(HashMap::new()),
        }
    }

    /// 지금까지 캐시된 서로 다른 쿼리 수
    pub fn cached_queries(&self) -> usize {
        self.answers().len()
    }

    fn answers(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.answers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: ResultProbe> ResultProbe for CachedProbe<P> {
    async fn has_results(&self, query: &str) -> Result<bool, BackendError> {
        let cached = self.answers().get(query).copied();
        if let Some(hit) = cached {
            counter!(INGEST_PROBE_CACHE_HITS_TOTAL).increment(1);
            return Ok(hit);
        }

        let hit = self.inner.has_results(query).await?;
        self.answers().insert(query.to_owned(), hit);
        Ok(hit)
    }
}
