//! 외부 협력자 trait — 검색 백엔드, 집계 저장소, 재색인 호출
//!
//! 파이프라인 핵심 로직은 이 trait에만 의존하며, 실제 구현
//! (Solr, SQLite, HTTP)은 각 도메인 크레이트에 있습니다.

use std::future::Future;
use std::sync::Arc;

use crate::error::{BackendError, StoreError, TriggerError};
use crate::types::TallyRecord;

/// 쿼리가 검색 결과를 1건 이상 반환하는지 확인하는 trait
pub trait ResultProbe: Send + Sync {
    /// best-match(dismax) 모드로 조회하여 결과 수가 0보다 크면 `true`
    ///
    /// 재시도하지 않습니다. 매 호출은 새로운 조회입니다.
    fn has_results(&self, query: &str) -> impl Future<Output = Result<bool, BackendError>> + Send;
}

/// 쿼리별 집계 레코드를 읽고 쓰는 저장소 trait
///
/// 저장소 자체는 `query` 유일성을 보장하지 않습니다.
/// 유일성은 조회 후 쓰기 순서로 유지됩니다.
pub trait TallyStore: Send + Sync {
    /// `query`와 정확히 일치하는 레코드를 찾습니다.
    fn find_by_query(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<TallyRecord>, StoreError>> + Send;

    /// `id` 레코드의 횟수와 결과 플래그를 갱신합니다.
    fn update(
        &self,
        id: &str,
        count: u64,
        result_flag: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// 새 레코드를 삽입합니다.
    fn insert(&self, record: &TallyRecord) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// 공유 저장소도 그대로 사용할 수 있도록 위임
impl<S: TallyStore> TallyStore for Arc<S> {
    fn find_by_query(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<TallyRecord>, StoreError>> + Send {
        (**self).find_by_query(query)
    }

    fn update(
        &self,
        id: &str,
        count: u64,
        result_flag: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).update(id, count, result_flag)
    }

    fn insert(&self, record: &TallyRecord) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).insert(record)
    }
}

/// 자동완성 색인 재구축을 요청하는 trait
pub trait ReindexTrigger: Send + Sync {
    /// `endpoint`로 일회성 호출을 보냅니다. 응답 본문은 사용하지 않습니다.
    fn trigger(&self, endpoint: &str) -> impl Future<Output = Result<(), TriggerError>> + Send;
}
