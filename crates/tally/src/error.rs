//! 반영 단계 에러 타입

use querytally_core::error::{QueryTallyError, StoreError};

/// 저장소 실패로 반영이 중단됨
///
/// 앞선 `applied`개의 관측은 이미 커밋되었고, 실패한 관측 이후는
/// 시도하지 않았습니다.
#[derive(Debug, thiserror::Error)]
#[error("reconciliation stopped at observation {} ('{query}'): {source}", .applied + 1)]
pub struct ReconcileError {
    /// 실패 전에 반영된 관측 수
    pub applied: usize,
    /// 실패한 관측의 쿼리
    pub query: String,
    #[source]
    pub source: StoreError,
}

impl From<ReconcileError> for QueryTallyError {
    fn from(err: ReconcileError) -> Self {
        QueryTallyError::Store {
            applied: err.applied,
            query: Some(err.query),
            source: err.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reports_failing_position() {
        let err = ReconcileError {
            applied: 2,
            query: "red shoes".to_owned(),
            source: StoreError::Query {
                operation: "update".to_owned(),
                query: "red shoes".to_owned(),
                reason: "disk I/O error".to_owned(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("observation 3"));
        assert!(msg.contains("red shoes"));
    }

    #[test]
    fn converts_keeping_applied_count_and_query() {
        let err = ReconcileError {
            applied: 4,
            query: "winter boots".to_owned(),
            source: StoreError::Connection {
                target: "autosuggest.db".to_owned(),
                reason: "locked".to_owned(),
            },
        };
        let top: QueryTallyError = err.into();
        assert!(matches!(
            top,
            QueryTallyError::Store { applied: 4, query: Some(ref q), .. } if q == "winter boots"
        ));
        // 연결 에러 자체에는 쿼리가 없으므로 상위 메시지가 보존해야 함
        let msg = top.to_string();
        assert!(msg.contains("after 4 applied"));
        assert!(msg.contains("'winter boots'"));
    }
}
