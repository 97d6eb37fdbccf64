//! Charts for smart-grid simulation runs.
//!
//! The simulation logs per-household demand, active appliances, aggregate
//! supply/demand and prices into a SQLite database. `gridplot` reads those
//! logs and turns them into line charts: policy comparisons, single-policy
//! detail views and a supply/demand/price overview.
//!
//! At its core sits the [`SeriesAggregator`]: a single pass over an ordered
//! row stream that buckets rows into one series per key and field, while
//! remembering the first timestamp and the smallest value of every field.
//! Those two extremes anchor the crossing point of the chart axes.
//!
//! ```
//! use gridplot::{Record, SeriesAggregator};
//!
//! // rows as they come out of the store: ordered by tick, keyed by policy
//! let rows = vec![
//!     Ok(Record::from_pairs(100, &[("demand", 5.0), ("appliancesOn", 2.0)]).with_key(1)),
//!     Ok(Record::from_pairs(200, &[("demand", 3.0), ("appliancesOn", 0.0)]).with_key(1)),
//!     Ok(Record::from_pairs(100, &[("demand", 9.0), ("appliancesOn", 4.0)]).with_key(2)),
//! ];
//!
//! let aggregated = SeriesAggregator::new(Record::require_key)
//!     .column("demand")
//!     .column("appliancesOn")
//!     .run(rows)?;
//!
//! let demand = aggregated.series("demand").unwrap();
//! assert_eq!(2, demand.len());
//! assert_eq!(2, demand.get(&1).unwrap().len());
//!
//! // zero is a real minimum, not "no data"
//! let anchor = aggregated.anchor("appliancesOn").unwrap();
//! assert_eq!(100, anchor.y_anchor);
//! assert_eq!(0.0, anchor.x_anchor);
//! #
//! # Ok::<(), gridplot::Error>(())
//! ```
//!
//! Charts are built from a [`Store`] and handed to a [`chart::Renderer`]:
//!
//! ```
//! use gridplot::{chart, RunContext, Store};
//!
//! let store = Store::builder().create_schema(true).open_in_memory()?;
//! store.insert_run(1, 1_331_130_600_000)?;
//! store.log_aggregator(1, 1_331_130_600_000, 12.0, 9.5, 0.2)?;
//!
//! let ctx = RunContext::load(&store, 1)?;
//! let charts = chart::supply_demand(&store, &ctx, chart::Screen::default())?;
//!
//! assert_eq!("Price for run: 7 Mar 2012 14:30:00 GMT", charts[1].title);
//! #
//! # Ok::<(), gridplot::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::result_unit_err)]

mod agg;
pub mod chart;
mod context;
mod error;
mod record;
pub mod store;
mod time;

type HashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;

pub use agg::{
    Aggregated, AxisAnchor, Extremum, FieldSeries, Max, Min, Running, Series, SeriesAggregator,
    SeriesSet, TimePoint,
};
pub use context::{Mode, RunContext};
pub use error::{Error, Result};
pub use record::{Record, Row};
pub use store::Store;
pub use time::{format_run_date, format_tick, timestamp};

/// Epoch milliseconds
pub type Timestamp = i64;

/// Value used in time series
pub type Value = f64;

/// Identifies one simulation run
pub type RunId = i64;

/// Identifies one household behavior policy
pub type PolicyId = i64;

/// Identifies one simulated household
pub type HouseholdId = i64;
