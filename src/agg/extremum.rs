use crate::Value;
use std::marker::PhantomData;

/// Defines which of two values a running extremum keeps.
pub trait Extremum {
    /// Returns `true` if `candidate` should replace `current`.
    ///
    /// Ties never replace.
    fn replaces(current: Value, candidate: Value) -> bool;
}

/// Keeps the smallest value seen
#[derive(Copy, Clone, Debug)]
pub struct Min;

impl Extremum for Min {
    fn replaces(current: Value, candidate: Value) -> bool {
        candidate < current
    }
}

/// Keeps the largest value seen
#[derive(Copy, Clone, Debug)]
pub struct Max;

impl Extremum for Max {
    fn replaces(current: Value, candidate: Value) -> bool {
        candidate > current
    }
}

/// A running extremum over a stream of values.
///
/// Stays empty until the first value is pushed, so "no data" is never
/// confused with a real value such as `0.0`.
#[derive(Clone, Debug)]
pub struct Running<E> {
    value: Option<Value>,
    phantom: PhantomData<E>,
}

impl<E> Default for Running<E> {
    fn default() -> Self {
        Self {
            value: None,
            phantom: PhantomData,
        }
    }
}

impl<E: Extremum> Running<E> {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a value into the tracker.
    pub fn push(&mut self, x: Value) {
        match self.value {
            Some(current) if !E::replaces(current, x) => {}
            _ => self.value = Some(x),
        }
    }

    /// Returns the current extremum, if any value was pushed.
    #[must_use]
    pub fn get(&self) -> Option<Value> {
        self.value
    }
}

impl<E: Extremum> FromIterator<Value> for Running<E> {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let mut running = Self::new();
        for x in iter {
            running.push(x);
        }
        running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn running_min_empty() {
        let min = Running::<Min>::new();
        assert_eq!(None, min.get());
    }

    #[test_log::test]
    fn running_min_keeps_zero() {
        let min: Running<Min> = [2.0, 0.0, 5.0].into_iter().collect();
        assert_eq!(Some(0.0), min.get());
    }

    #[test_log::test]
    fn running_min_negative() {
        let min: Running<Min> = [3.0, -1.5, -1.0].into_iter().collect();
        assert_eq!(Some(-1.5), min.get());
    }

    #[test_log::test]
    fn running_max() {
        let max: Running<Max> = [3.0, 7.5, 7.0].into_iter().collect();
        assert_eq!(Some(7.5), max.get());
    }
}
