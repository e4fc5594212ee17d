//! [`TallyStore`](querytally_core::TallyStore) 구현
//!
//! - [`SqliteTallyStore`]: 운영용 SQLite 테이블
//! - `MemoryTallyStore`: 테스트용, 작업 기록과 실패 주입 지원 (`test-util` 기능)

#[cfg(any(test, feature = "test-util"))]
mod memory;
mod sqlite;

#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryTallyStore, StoreOp};
pub use sqlite::SqliteTallyStore;
