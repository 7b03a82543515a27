//! Record types mirroring the structure of an rrdtool dump.
//!
//! An [`Archive`] owns everything decoded from one dump: the data source
//! definitions and the round-robin archives with their rows. Records are built
//! once by [`decode`](crate::decode()) and never mutated afterwards.
//!
//! ```text
//! rrd                      Archive
//! ├── version, step, ...
//! ├── ds *                 DataSource
//! └── rra *                RoundRobinArchive
//!     ├── params ?         Params
//!     ├── cdp_prep/ds *    ConsolidationState
//!     └── database/row *   Row (v * -> Value)
//! ```

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::value::Value;

/// One complete dump of a round-robin database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Archive {
    /// Format version as written by rrdtool, e.g. `0003`.
    pub version: String,

    /// Base interval between primary data points.
    #[serde(serialize_with = "duration_secs::serialize")]
    pub step: Duration,

    /// Time of the last update, UTC.
    pub last_update: DateTime<Utc>,

    /// Data source definitions, in dump order.
    pub data_sources: Vec<DataSource>,

    /// Round-robin archives, in dump order.
    pub archives: Vec<RoundRobinArchive>,
}

impl Archive {
    /// Decodes a dump buffer. Same as [`crate::decode`].
    ///
    /// # Errors
    ///
    /// Returns [`RrdError`](crate::RrdError) if the buffer is not a well-formed
    /// dump or a field cannot be decoded.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        crate::decode::decode(bytes)
    }

    /// Finds a data source by name.
    pub fn data_source(&self, name: &str) -> Option<&DataSource> {
        self.data_sources.iter().find(|ds| ds.name == name)
    }

    /// Returns the position of a data source, which is also its column in
    /// every [`Row`].
    pub fn data_source_index(&self, name: &str) -> Option<usize> {
        self.data_sources.iter().position(|ds| ds.name == name)
    }

    /// Timestamps of the rows of archive `index`; see
    /// [`RoundRobinArchive::row_timestamps`].
    pub fn row_timestamps(&self, index: usize) -> Option<Vec<DateTime<Utc>>> {
        self.archives
            .get(index)?
            .row_timestamps(self.step, self.last_update)
    }
}

/// Definition and accumulator state of one monitored metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSource {
    /// Data source name.
    pub name: String,

    /// Data source type, e.g. `GAUGE` or `COUNTER`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Maximum seconds between updates before the value becomes unknown.
    pub minimal_heartbeat: i64,

    /// Lower bound; unknown means unbounded.
    pub min: Value,

    /// Upper bound; unknown means unbounded.
    pub max: Value,

    /// Last raw value supplied to the database.
    pub last_ds: i64,

    /// Accumulated value of the current primary data point.
    pub value: Value,

    /// Seconds of the current step that are unknown.
    pub unknown_sec: i64,
}

/// One retention policy: a consolidation function applied over a fixed number
/// of primary data points, with its own row history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRobinArchive {
    /// Consolidation function tag as written, e.g. `AVERAGE`.
    pub cf: String,

    /// Primary data points consolidated into each row.
    pub pdp_per_row: i64,

    /// Archive parameters; `None` when the dump has no `params` block.
    pub params: Option<Params>,

    /// In-progress consolidation state, one entry per data source.
    pub cdp_prep: Vec<ConsolidationState>,

    /// Rows from oldest to newest.
    pub rows: Vec<Row>,
}

impl RoundRobinArchive {
    /// Parses [`Self::cf`] into a [`ConsolidationFn`].
    ///
    /// Returns `None` for functions other than the four basic ones, such as
    /// the Holt-Winters family.
    pub fn consolidation_fn(&self) -> Option<ConsolidationFn> {
        ConsolidationFn::from_tag(&self.cf)
    }

    /// The configured xff, if any.
    pub fn xff(&self) -> Option<f64> {
        self.params.as_ref().and_then(|p| p.xff)
    }

    /// Values of one data source column across all rows, oldest first.
    ///
    /// Rows too short to hold `index` are skipped.
    pub fn column(&self, index: usize) -> impl Iterator<Item = Value> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Time covered by one row: `step * pdp_per_row`.
    ///
    /// Returns `None` when `pdp_per_row` is not positive or the product
    /// overflows.
    pub fn row_interval(&self, step: Duration) -> Option<Duration> {
        let pdp = u32::try_from(self.pdp_per_row).ok().filter(|&p| p > 0)?;
        step.checked_mul(pdp)
    }

    /// Start-aligned timestamps of every row, oldest first.
    ///
    /// rrdtool aligns archive rows to multiples of the row interval, so the
    /// newest row is stamped `last_update` rounded down to the interval and
    /// each earlier row one interval before the next.
    ///
    /// Returns `None` if the row interval is zero or the arithmetic leaves the
    /// representable range.
    #[allow(clippy::cast_possible_wrap)] // Row counts are far below i64::MAX
    pub fn row_timestamps(
        &self,
        step: Duration,
        last_update: DateTime<Utc>,
    ) -> Option<Vec<DateTime<Utc>>> {
        let interval = i64::try_from(self.row_interval(step)?.as_secs())
            .ok()
            .filter(|&i| i > 0)?;
        let last = last_update.timestamp();
        let newest = last.checked_sub(last.rem_euclid(interval))?;

        let count = self.rows.len() as i64;
        (0..count)
            .map(|i| {
                let back = (count - 1 - i).checked_mul(interval)?;
                let secs = newest.checked_sub(back)?;
                DateTime::from_timestamp(secs, 0)
            })
            .collect()
    }

    /// Span between the oldest and newest row.
    pub fn span(&self, step: Duration) -> Option<TimeDelta> {
        let interval = TimeDelta::from_std(self.row_interval(step)?).ok()?;
        let rows = i32::try_from(self.rows.len().saturating_sub(1)).ok()?;
        interval.checked_mul(rows)
    }
}

/// Archive parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Params {
    /// Fraction of a row's primary data points that may be unknown before
    /// the row itself is unknown. Holt-Winters archives have none.
    pub xff: Option<f64>,
}

/// Consolidation state of one data source within one archive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsolidationState {
    /// Primary value of the last completed step.
    pub primary_value: Value,

    /// Secondary value of the last completed step.
    pub secondary_value: Value,

    /// Value of the row being consolidated.
    pub value: Value,

    /// Unknown primary data points in the row being consolidated.
    pub unknown_datapoints: Value,
}

/// One archive row: a value per data source, in data source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from its values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// The value for data source `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.values.get(index).copied()
    }

    /// All values of the row.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// The basic consolidation functions rrdtool applies when building rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConsolidationFn {
    /// Arithmetic mean of the primary data points.
    Average,

    /// Minimum of the primary data points.
    Min,

    /// Maximum of the primary data points.
    Max,

    /// Last primary data point.
    Last,
}

impl ConsolidationFn {
    /// Parses an rrdtool function tag, ignoring case and padding.
    ///
    /// ```rust
    /// use rrdump::ConsolidationFn;
    ///
    /// assert_eq!(ConsolidationFn::from_tag(" AVERAGE "), Some(ConsolidationFn::Average));
    /// assert_eq!(ConsolidationFn::from_tag("last"), Some(ConsolidationFn::Last));
    /// assert_eq!(ConsolidationFn::from_tag("HWPREDICT"), None);
    /// ```
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        [Self::Average, Self::Min, Self::Max, Self::Last]
            .into_iter()
            .find(|f| f.tag().eq_ignore_ascii_case(tag))
    }

    /// The tag rrdtool uses for this function.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Average => "AVERAGE",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Last => "LAST",
        }
    }
}

/// Serde support for Duration fields.
///
/// Dump durations are whole seconds, so they serialize as an integer count.
mod duration_secs {
    use std::time::Duration;

    use serde::{Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }
}
