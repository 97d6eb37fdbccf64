pub(crate) mod aggregator;
pub(crate) mod anchor;
pub(crate) mod extremum;
pub(crate) mod series;

pub use aggregator::{Aggregated, FieldSeries, SeriesAggregator};
pub use anchor::AxisAnchor;
pub use extremum::{Extremum, Max, Min, Running};
pub use series::{Series, SeriesSet, TimePoint};
