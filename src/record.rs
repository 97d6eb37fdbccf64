use crate::{Error, Timestamp, Value};
use std::sync::Arc;

/// A row that can be fed into a [`crate::SeriesAggregator`].
pub trait Row {
    /// Timestamp of the row (epoch milliseconds).
    fn timestamp(&self) -> Timestamp;

    /// Reads a numeric field by name.
    ///
    /// `Ok(None)` means the field exists but holds no value for this row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRow`] if the row has no such field.
    fn value(&self, field: &str) -> crate::Result<Option<Value>>;
}

/// A row read from the simulation store.
///
/// Column names are shared between all records of one query.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    ts: Timestamp,
    key: Option<i64>,
    columns: Arc<[String]>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// Creates a record; `values` line up with `columns`.
    #[must_use]
    pub fn new(ts: Timestamp, columns: Arc<[String]>, values: Vec<Option<Value>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());

        Self {
            ts,
            key: None,
            columns,
            values,
        }
    }

    /// Builds a standalone record from `(name, value)` pairs.
    ///
    /// ```
    /// use gridplot::{Record, Row};
    ///
    /// let record = Record::from_pairs(100, &[("demand", 4.2)]);
    /// assert_eq!(Some(4.2), record.value("demand")?);
    /// # Ok::<(), gridplot::Error>(())
    /// ```
    #[must_use]
    pub fn from_pairs(ts: Timestamp, pairs: &[(&str, Value)]) -> Self {
        let columns = pairs.iter().map(|(name, _)| (*name).to_owned()).collect();
        let values = pairs.iter().map(|(_, value)| Some(*value)).collect();
        Self::new(ts, columns, values)
    }

    /// Attaches a series key (e.g. a policy id).
    #[must_use]
    pub fn with_key(mut self, key: i64) -> Self {
        self.key = Some(key);
        self
    }

    /// Series key, if the query selected one.
    #[must_use]
    pub fn key(&self) -> Option<i64> {
        self.key
    }

    /// Series key of a keyed query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRow`] naming `series_key` if the record carries no key.
    pub fn require_key(&self) -> crate::Result<i64> {
        self.key.ok_or_else(|| Error::malformed(crate::store::KEY_COLUMN))
    }

    /// Column names in query order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Row for Record {
    fn timestamp(&self) -> Timestamp {
        self.ts
    }

    fn value(&self, field: &str) -> crate::Result<Option<Value>> {
        let idx = self
            .columns
            .iter()
            .position(|name| name == field)
            .ok_or_else(|| Error::malformed(field))?;

        Ok(self.values.get(idx).copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn record_missing_field() {
        let record = Record::from_pairs(1, &[("demand", 1.0)]);
        assert!(matches!(
            record.value("price"),
            Err(Error::MalformedRow { field }) if field == "price"
        ));
    }

    #[test_log::test]
    fn record_null_field() -> crate::Result<()> {
        let columns: Arc<[String]> = ["price".to_owned()].into_iter().collect();
        let record = Record::new(1, columns, vec![None]);
        assert_eq!(None, record.value("price")?);
        Ok(())
    }

    #[test_log::test]
    fn record_key() -> crate::Result<()> {
        let record = Record::from_pairs(1, &[("demand", 1.0)]);
        assert!(record.require_key().is_err());
        assert_eq!(4, record.with_key(4).require_key()?);
        Ok(())
    }
}
