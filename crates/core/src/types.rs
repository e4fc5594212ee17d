//! 도메인 타입 — 쿼리 관측과 집계 레코드

use std::fmt;

use serde::{Deserialize, Serialize};

/// 로그 한 줄에서 얻은 쿼리 관측
///
/// 생성 이후 변경되지 않습니다. 한 번의 실행 동안만 메모리에 유지됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryObservation {
    query: String,
    has_results: bool,
}

impl QueryObservation {
    /// 디코딩된 쿼리와 결과 존재 여부로 관측을 생성합니다.
    pub fn new(query: impl Into<String>, has_results: bool) -> Self {
        Self {
            query: query.into(),
            has_results,
        }
    }

    /// 디코딩된 쿼리 문자열 (빈 문자열일 수 있음)
    pub fn query(&self) -> &str {
        &self.query
    }

    /// 관측 시점에 검색 결과가 1건 이상이었는지 여부
    pub fn has_results(&self) -> bool {
        self.has_results
    }
}

/// 저장소의 쿼리별 집계 레코드
///
/// `query`는 대소문자와 바이트까지 정확히 일치하는 조회 키입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyRecord {
    /// 삽입 시 생성되는 불변 식별자 (UUID v4)
    pub id: String,
    /// 정확한 쿼리 문자열
    pub query: String,
    /// 가장 최근 관측의 결과 존재 여부 (누적이 아니라 덮어씀)
    pub result_flag: bool,
    /// 관측 횟수 (첫 관측 시 1)
    pub count: u64,
}

impl TallyRecord {
    /// 처음 관측된 쿼리의 레코드를 생성합니다.
    pub fn first_sighting(id: impl Into<String>, observation: &QueryObservation) -> Self {
        Self {
            id: id.into(),
            query: observation.query().to_owned(),
            result_flag: observation.has_results(),
            count: 1,
        }
    }
}

/// 실행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// 설정 로딩/검증
    Config,
    /// 로그 읽기 + 추출 + 결과 확인
    Ingest,
    /// 집계 저장소 반영
    Reconcile,
    /// 재색인 호출
    Reindex,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Ingest => write!(f, "ingest"),
            Self::Reconcile => write!(f, "reconcile"),
            Self::Reindex => write!(f, "reindex"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_accessors() {
        let obs = QueryObservation::new("red shoes", true);
        assert_eq!(obs.query(), "red shoes");
        assert!(obs.has_results());
    }

    #[test]
    fn observation_allows_empty_query() {
        let obs = QueryObservation::new("", false);
        assert_eq!(obs.query(), "");
    }

    #[test]
    fn first_sighting_starts_at_one() {
        let obs = QueryObservation::new("Red Shoes", false);
        let record = TallyRecord::first_sighting("id-1", &obs);
        assert_eq!(record.count, 1);
        assert_eq!(record.query, "Red Shoes");
        assert!(!record.result_flag);
    }

    #[test]
    fn stage_display_is_lowercase() {
        assert_eq!(Stage::Reconcile.to_string(), "reconcile");
        assert_eq!(Stage::Ingest.to_string(), "ingest");
    }
}
