//! 인메모리 집계 저장소
//!
//! 호출된 작업을 순서대로 기록하고, 지정한 시점에 실패하도록 만들 수 있습니다.

use std::sync::{Mutex, MutexGuard, PoisonError};

use querytally_core::error::StoreError;
use querytally_core::pipeline::TallyStore;
use querytally_core::types::TallyRecord;

/// 저장소에 들어온 작업 기록
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Find(String),
    Update {
        id: String,
        count: u64,
        result_flag: bool,
    },
    Insert(TallyRecord),
}

#[derive(Default)]
struct MemoryState {
    records: Vec<TallyRecord>,
    operations: Vec<StoreOp>,
    /// 성공한 update/insert 수
    mutations: usize,
    fail_after_mutations: Option<usize>,
    fail_on_query: Option<String>,
}

/// 인메모리 집계 저장소
#[derive(Default)]
pub struct MemoryTallyStore {
    state: Mutex<MemoryState>,
}

impl MemoryTallyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기존 레코드를 담은 저장소
    pub fn with_records(records: Vec<TallyRecord>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records,
                ..Default::default()
            }),
        }
    }

    /// `n`번의 update/insert가 성공한 뒤 모든 쓰기를 실패시킵니다.
    pub fn fail_after_mutations(mut self, n: usize) -> Self {
        self.state_mut().fail_after_mutations = Some(n);
        self
    }

    /// 해당 쿼리 조회를 실패시킵니다.
    pub fn fail_on_query(mut self, query: impl Into<String>) -> Self {
        self.state_mut().fail_on_query = Some(query.into());
        self
    }

    /// 현재 레코드 (삽입 순서)
    pub fn records(&self) -> Vec<TallyRecord> {
        self.state().records.clone()
    }

    /// 쿼리와 일치하는 첫 레코드
    pub fn get(&self, query: &str) -> Option<TallyRecord> {
        self.state().records.iter().find(|r| r.query == query).cloned()
    }

    /// 지금까지 호출된 작업 (호출 순서)
    pub fn operations(&self) -> Vec<StoreOp> {
        self.state().operations.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    fn check_mutation(&self, operation: &str, query: &str) -> Result<(), StoreError> {
        match self.fail_after_mutations {
            Some(limit) if self.mutations >= limit => Err(StoreError::Query {
                operation: operation.to_owned(),
                query: query.to_owned(),
                reason: "injected failure".to_owned(),
            }),
            _ => Ok(()),
        }
    }
}

impl TallyStore for MemoryTallyStore {
    async fn find_by_query(&self, query: &str) -> Result<Option<TallyRecord>, StoreError> {
        let mut state = self.state();
        state.operations.push(StoreOp::Find(query.to_owned()));
        if state.fail_on_query.as_deref() == Some(query) {
            return Err(StoreError::Query {
                operation: "find".to_owned(),
                query: query.to_owned(),
                reason: "injected failure".to_owned(),
            });
        }
        Ok(state.records.iter().find(|r| r.query == query).cloned())
    }

    async fn update(&self, id: &str, count: u64, result_flag: bool) -> Result<(), StoreError> {
        let mut state = self.state();
        state.operations.push(StoreOp::Update {
            id: id.to_owned(),
            count,
            result_flag,
        });
        state.check_mutation("update", id)?;

        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::Query {
                operation: "update".to_owned(),
                query: id.to_owned(),
                reason: "no record with this id".to_owned(),
            })?;
        record.count = count;
        record.result_flag = result_flag;
        state.mutations += 1;
        Ok(())
    }

    async fn insert(&self, record: &TallyRecord) -> Result<(), StoreError> {
        let mut state = self.state();
        state.operations.push(StoreOp::Insert(record.clone()));
        state.check_mutation("insert", &record.query)?;

        if state.records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Query {
                operation: "insert".to_owned(),
                query: record.query.clone(),
                reason: format!("duplicate id {}", record.id),
            });
        }
        state.records.push(record.clone());
        state.mutations += 1;
        Ok(())
    }
}
