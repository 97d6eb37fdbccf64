use crate::{Timestamp, Value};
use std::hash::Hash;

/// A single plotted point
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimePoint {
    /// Epoch milliseconds
    pub ts: Timestamp,

    /// Observed value
    pub value: Value,
}

impl TimePoint {
    /// Creates a point.
    #[must_use]
    pub fn new(ts: Timestamp, value: Value) -> Self {
        Self { ts, value }
    }
}

impl From<(Timestamp, Value)> for TimePoint {
    fn from((ts, value): (Timestamp, Value)) -> Self {
        Self { ts, value }
    }
}

/// One named, time-ordered sequence of points destined for a single plotted line.
///
/// Points keep their arrival order; a finished series is never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Series<K> {
    key: K,
    label: String,
    points: Vec<TimePoint>,
}

impl<K> Series<K> {
    /// Key the series was grouped by.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Display label (field name until relabeled).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Points in arrival order.
    #[must_use]
    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false` for series produced by the aggregator.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Replaces the display label.
    pub fn set_label<S: Into<String>>(&mut self, label: S) {
        self.label = label.into();
    }

    /// Consumes the series, returning its points.
    #[must_use]
    pub fn into_points(self) -> Vec<TimePoint> {
        self.points
    }
}

/// Series of one field, indexed by key, in the order keys were first seen.
#[derive(Clone, Debug)]
pub struct SeriesSet<K> {
    index: crate::HashMap<K, usize>,
    series: Vec<Series<K>>,
}

impl<K> Default for SeriesSet<K> {
    fn default() -> Self {
        Self {
            index: crate::HashMap::default(),
            series: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> SeriesSet<K> {
    /// Appends a point to the series of `key`, creating the series on first use.
    pub(crate) fn push(&mut self, key: &K, label: &str, point: TimePoint) {
        if let Some(series) = self
            .index
            .get(key)
            .and_then(|&idx| self.series.get_mut(idx))
        {
            series.points.push(point);
            return;
        }

        log::trace!("new series #{} ({label})", self.series.len());

        self.index.insert(key.clone(), self.series.len());
        self.series.push(Series {
            key: key.clone(),
            label: label.to_owned(),
            points: vec![point],
        });
    }

    /// Returns the series of the given key.
    pub fn get(&self, key: &K) -> Option<&Series<K>> {
        self.index.get(key).and_then(|&idx| self.series.get(idx))
    }

    /// Relabels every series using a fallible lookup (e.g. a store query).
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_label_with<F>(&mut self, mut f: F) -> crate::Result<()>
    where
        F: FnMut(&K) -> crate::Result<String>,
    {
        for series in &mut self.series {
            series.label = f(&series.key)?;
        }
        Ok(())
    }
}

impl<K> SeriesSet<K> {
    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Returns `true` if no key received a point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Iterates series in first-seen key order.
    pub fn iter(&self) -> std::slice::Iter<'_, Series<K>> {
        self.series.iter()
    }

    /// Iterates keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.series.iter().map(|s| &s.key)
    }

    /// Relabels every series.
    pub fn label_with<F: FnMut(&K) -> String>(&mut self, mut f: F) {
        for series in &mut self.series {
            series.label = f(&series.key);
        }
    }
}

impl<K> IntoIterator for SeriesSet<K> {
    type Item = Series<K>;
    type IntoIter = std::vec::IntoIter<Series<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.into_iter()
    }
}

impl<'a, K> IntoIterator for &'a SeriesSet<K> {
    type Item = &'a Series<K>;
    type IntoIter = std::slice::Iter<'a, Series<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}
