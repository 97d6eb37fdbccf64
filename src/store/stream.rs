use super::columns::{KEY, TICK};
use crate::{Error, Record, Timestamp, Value};
use std::sync::Arc;

/// Forward-only stream of records read from one query.
///
/// The first selected column is the tick. If the second column is named
/// `series_key`, it becomes the record's key; all remaining columns are
/// nullable numeric fields.
///
/// After the first read failure the stream is fused.
pub struct RecordStream<'stmt> {
    rows: rusqlite::Rows<'stmt>,
    columns: Arc<[String]>,
    keyed: bool,
    failed: bool,
}

impl<'stmt> RecordStream<'stmt> {
    pub(crate) fn new(rows: rusqlite::Rows<'stmt>, names: &[String]) -> Self {
        debug_assert_eq!(Some(TICK), names.first().map(String::as_str));

        let keyed = names.get(1).is_some_and(|name| name == KEY);
        let offset = if keyed { 2 } else { 1 };

        Self {
            rows,
            columns: names.iter().skip(offset).cloned().collect(),
            keyed,
            failed: false,
        }
    }

    fn read(columns: &Arc<[String]>, keyed: bool, row: &rusqlite::Row<'_>) -> crate::Result<Record> {
        let ts: Timestamp = row.get(0).map_err(|_| Error::malformed(TICK))?;

        let offset = if keyed { 2 } else { 1 };

        let values = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                row.get::<_, Option<Value>>(idx + offset)
                    .map_err(|_| Error::malformed(name.as_str()))
            })
            .collect::<crate::Result<Vec<_>>>()?;

        let record = Record::new(ts, columns.clone(), values);

        if keyed {
            let key: i64 = row.get(1).map_err(|_| Error::malformed(KEY))?;
            Ok(record.with_key(key))
        } else {
            Ok(record)
        }
    }
}

impl Iterator for RecordStream<'_> {
    type Item = crate::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.rows.next() {
            Ok(Some(row)) => Some(Self::read(&self.columns, self.keyed, row)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(Error::source_read(e)))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{Row, SeriesAggregator};
    use rusqlite::Connection;
    use test_log::test;

    // abs() of the smallest i64 makes SQLite fail while stepping to the second row
    const SCHEMA: &str = "
        CREATE TABLE t (tick INTEGER, x INTEGER);
        INSERT INTO t VALUES (1, 2), (2, -9223372036854775807 - 1), (3, 4);
    ";

    const QUERY: &str = "SELECT tick, abs(x) AS v FROM t";

    fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
        stmt.column_names().into_iter().map(String::from).collect()
    }

    #[test]
    fn stream_fused_after_read_failure() -> crate::Result<()> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        let mut stmt = conn.prepare(QUERY)?;
        let names = column_names(&stmt);
        let mut stream = RecordStream::new(stmt.query([])?, &names);

        let first = stream.next().expect("should yield first row")?;
        assert_eq!(1, first.timestamp());
        assert_eq!(Some(2.0), first.value("v")?);

        assert!(matches!(stream.next(), Some(Err(Error::SourceRead(_)))));
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());

        Ok(())
    }

    #[test]
    fn stream_read_failure_aborts_aggregation() -> crate::Result<()> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        let mut stmt = conn.prepare(QUERY)?;
        let names = column_names(&stmt);
        let stream = RecordStream::new(stmt.query([])?, &names);

        let result = SeriesAggregator::unkeyed().column("v").run(stream);
        assert!(matches!(result, Err(Error::SourceRead(_))));

        Ok(())
    }

    #[test]
    fn stream_reads_key_column() -> crate::Result<()> {
        let conn = Connection::open_in_memory()?;

        let mut stmt = conn.prepare("SELECT 5 AS tick, 7 AS series_key, 1.5 AS v")?;
        let names = column_names(&stmt);
        let records = RecordStream::new(stmt.query([])?, &names).collect::<crate::Result<Vec<_>>>()?;

        assert_eq!(1, records.len());
        let record = records.first().expect("should exist");
        assert_eq!(Some(7), record.key());
        assert_eq!(vec!["v".to_owned()], record.columns());
        assert_eq!(Some(1.5), record.value("v")?);

        Ok(())
    }
}
