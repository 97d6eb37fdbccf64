use crate::{Timestamp, Value};

/// Point at which the two chart axes cross.
///
/// Derived from the data instead of being fixed at zero: the value axis is
/// drawn at the first timestamp of the aggregation, the time axis at the
/// smallest value of the plotted field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisAnchor {
    /// Timestamp of the first row seen across the whole aggregation
    pub y_anchor: Timestamp,

    /// Smallest value seen for the field
    pub x_anchor: Value,
}

impl AxisAnchor {
    /// Pulls the value crossing towards zero by `factor` (e.g. `0.95`),
    /// leaving some room below the lowest line.
    #[must_use]
    pub fn scaled(self, factor: Value) -> Self {
        Self {
            y_anchor: self.y_anchor,
            x_anchor: self.x_anchor * factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn anchor_scaled() {
        let anchor = AxisAnchor {
            y_anchor: 100,
            x_anchor: 10.0,
        }
        .scaled(0.5);

        assert_eq!(100, anchor.y_anchor);
        assert!((anchor.x_anchor - 5.0).abs() < f64::EPSILON);
    }
}
