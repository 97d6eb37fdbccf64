use super::{
    anchor::AxisAnchor,
    extremum::{Min, Running},
    series::{SeriesSet, TimePoint},
};
use crate::{record::Row, Error, Timestamp, Value};
use std::hash::Hash;

type KeyFn<'a, R, K> = Box<dyn Fn(&R) -> crate::Result<K> + 'a>;
type ValueFn<'a, R> = Box<dyn Fn(&R) -> crate::Result<Option<Value>> + 'a>;

/// Turns a flat, ordered row stream into named point series in a single pass.
///
/// Every row is routed to the series of its key (`key_fn`), once per
/// requested field. While draining the source, the aggregator remembers the
/// first timestamp and the running minimum of each field, which later anchor
/// the chart axes.
///
/// ```
/// use gridplot::{Record, SeriesAggregator};
///
/// let rows = vec![
///     Ok(Record::from_pairs(100, &[("v", 5.0)]).with_key(1)),
///     Ok(Record::from_pairs(200, &[("v", 3.0)]).with_key(1)),
///     Ok(Record::from_pairs(100, &[("v", 9.0)]).with_key(2)),
/// ];
///
/// let aggregated = SeriesAggregator::new(|row: &Record| row.require_key())
///     .column("v")
///     .run(rows)?;
///
/// let anchor = aggregated.anchor("v").unwrap();
/// assert_eq!(100, anchor.y_anchor);
/// assert_eq!(3.0, anchor.x_anchor);
/// # Ok::<(), gridplot::Error>(())
/// ```
pub struct SeriesAggregator<'a, R, K> {
    key_fn: KeyFn<'a, R, K>,
    fields: Vec<(String, ValueFn<'a, R>)>,
}

impl<'a, R: Row + 'a> SeriesAggregator<'a, R, ()> {
    /// Creates an aggregator that puts all rows into one series per field.
    #[must_use]
    pub fn unkeyed() -> Self {
        Self::new(|_| Ok(()))
    }
}

impl<'a, R: Row + 'a, K: Eq + Hash + Clone> SeriesAggregator<'a, R, K> {
    /// Creates an aggregator grouping rows by `key_fn`.
    pub fn new<F>(key_fn: F) -> Self
    where
        F: Fn(&R) -> crate::Result<K> + 'a,
    {
        Self {
            key_fn: Box::new(key_fn),
            fields: Vec::new(),
        }
    }

    /// Requests an output field computed by `extract`.
    ///
    /// `Ok(None)` skips the row for this field only. Requesting the same
    /// name twice replaces the earlier extractor.
    #[must_use]
    pub fn field<S, F>(mut self, name: S, extract: F) -> Self
    where
        S: Into<String>,
        F: Fn(&R) -> crate::Result<Option<Value>> + 'a,
    {
        let name = name.into();
        let extract: ValueFn<'a, R> = Box::new(extract);

        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = extract;
        } else {
            self.fields.push((name, extract));
        }

        self
    }

    /// Requests an output field read directly from the row's column of the same name.
    #[must_use]
    pub fn column(self, name: &str) -> Self {
        let column = name.to_owned();
        self.field(name, move |row: &R| row.value(&column))
    }

    /// Drains `rows` and returns the finished series.
    ///
    /// # Errors
    ///
    /// Fails on the first row the source could not produce, or on the first
    /// row missing a requested field. Nothing aggregated so far is returned.
    pub fn run<I>(self, rows: I) -> crate::Result<Aggregated<K>>
    where
        I: IntoIterator<Item = crate::Result<R>>,
    {
        let mut first_ts: Option<Timestamp> = None;
        let mut row_count = 0_usize;

        let mut fields = self
            .fields
            .iter()
            .map(|(name, _)| FieldSeries {
                name: name.clone(),
                series: SeriesSet::default(),
                min: Running::new(),
            })
            .collect::<Vec<_>>();

        for row in rows {
            let row = row?;
            let ts = row.timestamp();
            let key = (self.key_fn)(&row)?;

            if first_ts.is_none() {
                first_ts = Some(ts);
            }

            for ((name, extract), out) in self.fields.iter().zip(fields.iter_mut()) {
                let Some(value) = extract(&row)? else {
                    continue;
                };

                if value.is_nan() {
                    return Err(Error::malformed(name.as_str()));
                }

                out.min.push(value);
                out.series.push(&key, name, TimePoint { ts, value });
            }

            row_count += 1;
        }

        log::debug!(
            "Aggregated {row_count} rows into {} field(s), first ts: {first_ts:?}",
            fields.len()
        );

        for field in &fields {
            log::trace!(
                "{}: {} series, min {:?}",
                field.name,
                field.series.len(),
                field.min.get()
            );
        }

        Ok(Aggregated { first_ts, fields })
    }
}

/// The series of one requested field, plus its running minimum.
#[derive(Clone, Debug)]
pub struct FieldSeries<K> {
    name: String,
    series: SeriesSet<K>,
    min: Running<Min>,
}

impl<K> FieldSeries<K> {
    /// Field name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Series of this field, keyed in first-seen order
    #[must_use]
    pub fn series(&self) -> &SeriesSet<K> {
        &self.series
    }

    /// Smallest value seen, if any
    #[must_use]
    pub fn min(&self) -> Option<Value> {
        self.min.get()
    }
}

/// Result of one aggregation pass.
#[derive(Clone, Debug)]
pub struct Aggregated<K> {
    first_ts: Option<Timestamp>,
    fields: Vec<FieldSeries<K>>,
}

impl<K> Aggregated<K> {
    /// Timestamp of the first row seen, if the source was not empty.
    #[must_use]
    pub fn y_anchor(&self) -> Option<Timestamp> {
        self.first_ts
    }

    /// Returns `true` if no series received a point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|f| f.series.is_empty())
    }

    /// Iterates requested fields in request order.
    pub fn fields(&self) -> std::slice::Iter<'_, FieldSeries<K>> {
        self.fields.iter()
    }

    /// Returns the output of one field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSeries<K>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the series set of one field.
    #[must_use]
    pub fn series(&self, name: &str) -> Option<&SeriesSet<K>> {
        self.field(name).map(FieldSeries::series)
    }

    /// Moves the series set of one field out, leaving it empty.
    pub fn take_series(&mut self, name: &str) -> Option<SeriesSet<K>> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .map(|f| std::mem::take(&mut f.series))
    }

    /// Axis anchor of one field.
    ///
    /// `None` if the field never produced a value: do not draw a crossing.
    #[must_use]
    pub fn anchor(&self, name: &str) -> Option<AxisAnchor> {
        Some(AxisAnchor {
            y_anchor: self.first_ts?,
            x_anchor: self.field(name)?.min()?,
        })
    }

    /// Axis anchor shared by several fields drawn on one chart.
    #[must_use]
    pub fn combined_anchor(&self, names: &[&str]) -> Option<AxisAnchor> {
        let min: Running<Min> = names
            .iter()
            .filter_map(|name| self.field(name)?.min())
            .collect();

        Some(AxisAnchor {
            y_anchor: self.first_ts?,
            x_anchor: min.get()?,
        })
    }
}
