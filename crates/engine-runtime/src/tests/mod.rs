//! In-memory connector doubles for exercising the coordinator without a
//! database.

mod coordinator;

use async_trait::async_trait;
use connectors::{
    destination::DestinationBranch,
    error::{ConnectorError, DbError},
    provider::ConnectionProvider,
    requests::FetchRequest,
    source::SourceReader,
};
use model::{core::value::Value, records::row::Row, xid::Xid};
use std::sync::{Arc, Mutex};

pub(crate) fn int_rows(count: u64) -> Vec<Row> {
    (0..count)
        .map(|i| Row::new(vec![Value::Int(i as i64), Value::String(format!("row-{i}"))]))
        .collect()
}

/// Shared world both sides of the copy see.
pub(crate) struct MockState {
    pub source_rows: Vec<Row>,
    pub committed_rows: Vec<Row>,
    /// Transaction-control calls in arrival order, as `(branch, op)`.
    pub ops: Vec<(usize, &'static str)>,
    /// Every range fetch issued, as `(offset, limit)`.
    pub fetches: Vec<(u64, u64)>,
    pub branches_opened: usize,
}

impl MockState {
    pub fn shared(source_rows: Vec<Row>) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(MockState {
            source_rows,
            committed_rows: Vec::new(),
            ops: Vec::new(),
            fetches: Vec::new(),
            branches_opened: 0,
        }))
    }
}

pub(crate) struct MockSourceReader {
    pub(crate) state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl SourceReader for MockSourceReader {
    async fn count(&mut self, _table: &str) -> Result<u64, DbError> {
        Ok(self.state.lock().unwrap().source_rows.len() as u64)
    }

    async fn find_ordering_column(&mut self, _table: &str) -> Result<Option<String>, DbError> {
        Ok(Some("id".to_string()))
    }

    async fn fetch_rows(&mut self, request: &FetchRequest) -> Result<Vec<Row>, DbError> {
        let mut state = self.state.lock().unwrap();
        state.fetches.push((request.offset, request.limit));
        Ok(state
            .source_rows
            .iter()
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .cloned()
            .collect())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        Ok(())
    }
}

pub(crate) struct MockBranch {
    state: Arc<Mutex<MockState>>,
    id: usize,
    staged: Vec<Row>,
    prepared: bool,
    fail_insert: bool,
    fail_prepare: bool,
}

impl MockBranch {
    fn log(&self, op: &'static str) {
        self.state.lock().unwrap().ops.push((self.id, op));
    }
}

#[async_trait]
impl DestinationBranch for MockBranch {
    async fn begin(&mut self, _xid: &Xid) -> Result<(), DbError> {
        self.log("begin");
        Ok(())
    }

    async fn insert_batch(&mut self, _table: &str, rows: &[Row]) -> Result<(), DbError> {
        if self.fail_insert {
            return Err(DbError::Unknown("simulated insert failure".into()));
        }
        self.staged.extend_from_slice(rows);
        Ok(())
    }

    async fn end(&mut self) -> Result<(), DbError> {
        self.log("end");
        Ok(())
    }

    async fn prepare(&mut self) -> Result<(), DbError> {
        self.log("prepare");
        if self.fail_prepare {
            return Err(DbError::Unknown("simulated prepare veto".into()));
        }
        self.prepared = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.log("commit");
        let staged = std::mem::take(&mut self.staged);
        self.state.lock().unwrap().committed_rows.extend(staged);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.log("rollback");
        self.staged.clear();
        self.prepared = false;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        self.log("close");
        Ok(())
    }
}

/// Provider whose branches can be told to fail at a given phase.
pub(crate) struct MockProvider {
    pub state: Arc<Mutex<MockState>>,
    pub fail_insert_on: Option<usize>,
    pub fail_prepare_on: Option<usize>,
}

impl MockProvider {
    pub fn new(state: Arc<Mutex<MockState>>) -> Self {
        MockProvider {
            state,
            fail_insert_on: None,
            fail_prepare_on: None,
        }
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    async fn open_source(&self) -> Result<Box<dyn SourceReader>, ConnectorError> {
        Ok(Box::new(MockSourceReader {
            state: Arc::clone(&self.state),
        }))
    }

    async fn open_destination(&self) -> Result<Box<dyn DestinationBranch>, ConnectorError> {
        let id = {
            let mut state = self.state.lock().unwrap();
            let id = state.branches_opened;
            state.branches_opened += 1;
            id
        };
        Ok(Box::new(MockBranch {
            state: Arc::clone(&self.state),
            id,
            staged: Vec::new(),
            prepared: false,
            fail_insert: self.fail_insert_on == Some(id),
            fail_prepare: self.fail_prepare_on == Some(id),
        }))
    }
}
