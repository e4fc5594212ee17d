//! 쿼리 관측을 집계 저장소에 반영하는 단계
//!
//! # 모듈 구성
//!
//! - [`reconciler`]: 관측마다 조회 후 증가/삽입 ([`TallyReconciler`])
//! - [`store`]: [`TallyStore`](querytally_core::TallyStore) 구현 (SQLite, 테스트용 인메모리)
//! - [`error`]: 반영 중단 에러
//!
//! # 반영 규칙
//!
//! ```text
//! observation ──find_by_query──┬─ found ─> update(id, count + 1, has_results)
//!                              └─ none ──> insert(uuid, query, has_results, 1)
//! ```
//!
//! 배치 전체를 감싸는 트랜잭션은 없습니다. 중간에 실패하면 그 전까지의
//! 반영은 커밋된 채로 남고 나머지는 시도하지 않습니다.

pub mod error;
pub mod reconciler;
pub mod store;

// --- 주요 타입 re-export ---

pub use error::ReconcileError;
pub use reconciler::{ReconcileSummary, TallyReconciler};
pub use store::SqliteTallyStore;
#[cfg(any(test, feature = "test-util"))]
pub use store::{MemoryTallyStore, StoreOp};
