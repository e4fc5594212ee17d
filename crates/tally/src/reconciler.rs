//! 집계 반영기
//!
//! 관측 목록을 순서대로 저장소에 반영합니다. 같은 쿼리가 한 배치에
//! 여러 번 나오면 그만큼 순서대로 처리되므로, 횟수는 등장 횟수만큼
//! 증가하고 결과 플래그는 마지막 관측의 값이 남습니다.

use metrics::counter;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use querytally_core::error::StoreError;
use querytally_core::metrics::{TALLY_INSERTED_TOTAL, TALLY_UPDATED_TOTAL};
use querytally_core::pipeline::TallyStore;
use querytally_core::types::{QueryObservation, TallyRecord};

use crate::error::ReconcileError;

/// 반영 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// 새로 삽입된 레코드 수
    pub inserted: usize,
    /// 횟수가 증가한 레코드 수
    pub updated: usize,
}

impl ReconcileSummary {
    /// 반영된 관측 수
    pub fn applied(&self) -> usize {
        self.inserted + self.updated
    }
}

/// 관측 하나의 반영 결과
enum Applied {
    Inserted,
    Updated { count: u64 },
}

/// 집계 반영기
pub struct TallyReconciler<S> {
    store: S,
}

impl<S: TallyStore> TallyReconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 사용 중인 저장소
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 관측 목록을 순서대로 반영합니다.
    ///
    /// 저장소 실패 시 즉시 중단하며, 이미 반영된 관측은 되돌리지 않습니다.
    pub async fn reconcile(
        &self,
        observations: &[QueryObservation],
    ) -> Result<ReconcileSummary, ReconcileError> {
        let mut summary = ReconcileSummary::default();

        for observation in observations {
            match self.apply(observation).await {
                Ok(Applied::Inserted) => {
                    summary.inserted += 1;
                    counter!(TALLY_INSERTED_TOTAL).increment(1);
                    debug!(query = observation.query(), "tally inserted");
                }
                Ok(Applied::Updated { count }) => {
                    summary.updated += 1;
                    counter!(TALLY_UPDATED_TOTAL).increment(1);
                    debug!(query = observation.query(), count, "tally incremented");
                }
                Err(source) => {
                    return Err(ReconcileError {
                        applied: summary.applied(),
                        query: observation.query().to_owned(),
                        source,
                    });
                }
            }
        }

        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            "tallies reconciled"
        );
        Ok(summary)
    }

    async fn apply(&self, observation: &QueryObservation) -> Result<Applied, StoreError> {
        match self.store.find_by_query(observation.query()).await? {
            Some(existing) => {
                let count = existing.count + 1;
                self.store
                    .update(&existing.id, count, observation.has_results())
                    .await?;
                Ok(Applied::Updated { count })
            }
            None => {
                let record = TallyRecord::first_sighting(Uuid::new_v4().to_string(), observation);
                self.store.insert(&record).await?;
                Ok(Applied::Inserted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryTallyStore, StoreOp};

    #[tokio::test]
    async fn new_query_is_inserted_with_count_one() {
        let reconciler = TallyReconciler::new(MemoryTallyStore::new());
        let summary = reconciler
            .reconcile(&[QueryObservation::new("red shoes", false)])
            .await
            .unwrap();

        assert_eq!(summary, ReconcileSummary { inserted: 1, updated: 0 });
        let records = reconciler.store().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "red shoes");
        assert_eq!(records[0].count, 1);
        assert!(!records[0].result_flag);
        assert!(Uuid::parse_str(&records[0].id).is_ok());
    }

    #[tokio::test]
    async fn existing_query_is_incremented_and_flag_overwritten() {
        let store = MemoryTallyStore::with_records(vec![TallyRecord {
            id: "fixed-id".to_owned(),
            query: "red shoes".to_owned(),
            result_flag: false,
            count: 7,
        }]);
        let reconciler = TallyReconciler::new(store);
        let summary = reconciler
            .reconcile(&[QueryObservation::new("red shoes", true)])
            .await
            .unwrap();

        assert_eq!(summary, ReconcileSummary { inserted: 0, updated: 1 });
        let record = reconciler.store().get("red shoes").unwrap();
        assert_eq!(record.id, "fixed-id");
        assert_eq!(record.count, 8);
        assert!(record.result_flag);
    }

    #[tokio::test]
    async fn repeated_query_in_batch_counts_each_occurrence() {
        let reconciler = TallyReconciler::new(MemoryTallyStore::new());
        reconciler
            .reconcile(&[
                QueryObservation::new("boots", true),
                QueryObservation::new("boots", false),
            ])
            .await
            .unwrap();

        let records = reconciler.store().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 2);
        assert!(!records[0].result_flag);
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let reconciler = TallyReconciler::new(MemoryTallyStore::new());
        reconciler
            .reconcile(&[
                QueryObservation::new("Boots", true),
                QueryObservation::new("boots", true),
            ])
            .await
            .unwrap();
        assert_eq!(reconciler.store().records().len(), 2);
    }

    #[tokio::test]
    async fn failure_stops_remaining_observations() {
        let store = MemoryTallyStore::new().fail_after_mutations(2);
        let reconciler = TallyReconciler::new(store);
        let batch: Vec<QueryObservation> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|q| QueryObservation::new(*q, true))
            .collect();

        let err = reconciler.reconcile(&batch).await.unwrap_err();
        assert_eq!(err.applied, 2);
        assert_eq!(err.query, "c");

        let store = reconciler.store();
        let committed: Vec<String> = store.records().into_iter().map(|r| r.query).collect();
        assert_eq!(committed, vec!["a", "b"]);
        assert!(
            !store
                .operations()
                .iter()
                .any(|op| matches!(op, StoreOp::Find(q) if q == "d" || q == "e"))
        );
    }

    #[tokio::test]
    async fn empty_batch_touches_nothing() {
        let reconciler = TallyReconciler::new(MemoryTallyStore::new());
        let summary = reconciler.reconcile(&[]).await.unwrap();
        assert_eq!(summary.applied(), 0);
        assert!(reconciler.store().operations().is_empty());
    }
}
