//! Positional column access with shape checking

use chrono::NaiveDate;

use crate::store::{Row, Value};

use super::errors::{ExecutorError, ExecutorResult};

/// Reads typed columns from a row whose arity has been checked
pub struct RowReader<'r> {
    row: &'r Row,
    context: &'static str,
}

impl<'r> RowReader<'r> {
    /// Fails unless the row has exactly `arity` columns
    pub fn expect(row: &'r Row, arity: usize, context: &'static str) -> ExecutorResult<Self> {
        if row.len() != arity {
            return Err(ExecutorError::row_shape(
                context,
                format!("expected {} columns, got {}", arity, row.len()),
            ));
        }
        Ok(Self { row, context })
    }

    fn value(&self, index: usize) -> &'r Value {
        // Arity was checked in `expect`, and callers only use fixed indices below it
        self.row.values().get(index).unwrap_or(&Value::Null)
    }

    fn mismatch(&self, index: usize, expected: &str) -> ExecutorError {
        ExecutorError::row_shape(
            self.context,
            format!(
                "column {} is {}, expected {}",
                index,
                self.value(index).type_name(),
                expected
            ),
        )
    }

    pub fn int(&self, index: usize) -> ExecutorResult<i64> {
        match self.value(index) {
            Value::Int(v) => Ok(*v),
            _ => Err(self.mismatch(index, "int")),
        }
    }

    pub fn opt_int(&self, index: usize) -> ExecutorResult<Option<i64>> {
        match self.value(index) {
            Value::Int(v) => Ok(Some(*v)),
            Value::Null => Ok(None),
            _ => Err(self.mismatch(index, "int or null")),
        }
    }

    pub fn text(&self, index: usize) -> ExecutorResult<String> {
        match self.value(index) {
            Value::Text(s) => Ok(s.clone()),
            _ => Err(self.mismatch(index, "text")),
        }
    }

    pub fn opt_text(&self, index: usize) -> ExecutorResult<Option<String>> {
        match self.value(index) {
            Value::Text(s) => Ok(Some(s.clone())),
            Value::Null => Ok(None),
            _ => Err(self.mismatch(index, "text or null")),
        }
    }

    pub fn opt_date(&self, index: usize) -> ExecutorResult<Option<NaiveDate>> {
        match self.value(index) {
            Value::Date(d) => Ok(Some(*d)),
            Value::Timestamp(ts) => Ok(Some(ts.date_naive())),
            Value::Null => Ok(None),
            _ => Err(self.mismatch(index, "date or null")),
        }
    }

    pub fn opt_bool(&self, index: usize) -> ExecutorResult<Option<bool>> {
        match self.value(index) {
            Value::Bool(b) => Ok(Some(*b)),
            Value::Null => Ok(None),
            _ => Err(self.mismatch(index, "bool or null")),
        }
    }
}
