use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// One source row in column order.
///
/// Column names are deliberately absent: the insert side binds every value
/// positionally, so the only schema fact the copy path relies on is the
/// column count of the source result set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    pub fn column_count(&self) -> usize {
        self.values.len()
    }
}
