//! Coercion rules from raw element text to typed field values.
//!
//! rrdtool pretty-prints its dump, so most scalars arrive padded with
//! whitespace, and unknown samples are written as tokens that are not numbers.
//! Every leaf field of the schema is declared as one [`FieldKind`]; each kind
//! has a rule type implementing [`Coerce`], and [`FieldKind::coerce`]
//! dispatches over the same rules when the kind is only known at runtime.
//!
//! Only [`Sample`] tolerates bad input. Integer, float and time fields fail
//! with [`CoerceError`] so genuine corruption is not silently masked.
//!
//! ```rust
//! use rrdump::coerce::{Coerce, FieldKind, FieldValue, Sample, SpacedInt};
//!
//! assert_eq!(SpacedInt::coerce("  \n\t42\t\n  ").unwrap(), 42);
//! assert!(Sample::coerce("U").unwrap().is_unknown());
//! assert_eq!(
//!     FieldKind::TrimmedText.coerce(" ds0 ").unwrap(),
//!     FieldValue::Text("ds0".to_string()),
//! );
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::CoerceError;
use crate::value::Value;

/// The closed set of semantic types a leaf field can be declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Text kept exactly as written.
    Text,
    /// Text with surrounding whitespace removed.
    TrimmedText,
    /// Base-10 signed integer, surrounding whitespace allowed.
    Integer,
    /// Integer seconds since the Unix epoch, UTC.
    Timestamp,
    /// Integer count of seconds.
    Duration,
    /// Floating-point literal; anything else is an error.
    Float,
    /// Floating-point sample; anything unparsable is unknown.
    Sample,
}

impl FieldKind {
    /// Applies the rule for this kind to `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`CoerceError`] when `raw` does not fit the kind. [`FieldKind::Sample`]
    /// and the text kinds never fail.
    pub fn coerce(self, raw: &str) -> Result<FieldValue, CoerceError> {
        Ok(match self {
            Self::Text => FieldValue::Text(RawText::coerce(raw)?),
            Self::TrimmedText => FieldValue::Text(TrimmedText::coerce(raw)?),
            Self::Integer => FieldValue::Integer(SpacedInt::coerce(raw)?),
            Self::Timestamp => FieldValue::Timestamp(UnixTime::coerce(raw)?),
            Self::Duration => FieldValue::Duration(Seconds::coerce(raw)?),
            Self::Float => FieldValue::Float(Float::coerce(raw)?),
            Self::Sample => FieldValue::Sample(Sample::coerce(raw)?),
        })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::TrimmedText => "trimmed text",
            Self::Integer => "integer",
            Self::Timestamp => "unix timestamp",
            Self::Duration => "duration in seconds",
            Self::Float => "float",
            Self::Sample => "sample value",
        })
    }
}

/// A coerced value tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Result of [`FieldKind::Text`] or [`FieldKind::TrimmedText`].
    Text(String),
    /// Result of [`FieldKind::Integer`].
    Integer(i64),
    /// Result of [`FieldKind::Timestamp`].
    Timestamp(DateTime<Utc>),
    /// Result of [`FieldKind::Duration`].
    Duration(Duration),
    /// Result of [`FieldKind::Float`].
    Float(f64),
    /// Result of [`FieldKind::Sample`].
    Sample(Value),
}

/// A rule turning raw element text into a typed value.
pub trait Coerce {
    /// The typed value this rule produces.
    type Output;

    /// The kind this rule implements, used when reporting failures.
    const KIND: FieldKind;

    /// Converts the raw inner text of an element.
    ///
    /// # Errors
    ///
    /// Returns [`CoerceError`] when `raw` does not fit [`Self::KIND`].
    fn coerce(raw: &str) -> Result<Self::Output, CoerceError>;
}

/// Rule for [`FieldKind::Text`].
#[derive(Debug, Clone, Copy)]
pub struct RawText;

/// Rule for [`FieldKind::TrimmedText`].
#[derive(Debug, Clone, Copy)]
pub struct TrimmedText;

/// Rule for [`FieldKind::Integer`].
#[derive(Debug, Clone, Copy)]
pub struct SpacedInt;

/// Rule for [`FieldKind::Timestamp`].
#[derive(Debug, Clone, Copy)]
pub struct UnixTime;

/// Rule for [`FieldKind::Duration`].
#[derive(Debug, Clone, Copy)]
pub struct Seconds;

/// Rule for [`FieldKind::Float`].
#[derive(Debug, Clone, Copy)]
pub struct Float;

/// Rule for [`FieldKind::Sample`].
#[derive(Debug, Clone, Copy)]
pub struct Sample;

/// Strips the pretty-printing padding rrdtool puts around scalars.
fn strip(raw: &str) -> &str {
    raw.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}

impl Coerce for RawText {
    type Output = String;
    const KIND: FieldKind = FieldKind::Text;

    fn coerce(raw: &str) -> Result<String, CoerceError> {
        Ok(raw.to_string())
    }
}

impl Coerce for TrimmedText {
    type Output = String;
    const KIND: FieldKind = FieldKind::TrimmedText;

    fn coerce(raw: &str) -> Result<String, CoerceError> {
        Ok(strip(raw).to_string())
    }
}

impl Coerce for SpacedInt {
    type Output = i64;
    const KIND: FieldKind = FieldKind::Integer;

    fn coerce(raw: &str) -> Result<i64, CoerceError> {
        Ok(strip(raw).parse()?)
    }
}

impl Coerce for UnixTime {
    type Output = DateTime<Utc>;
    const KIND: FieldKind = FieldKind::Timestamp;

    fn coerce(raw: &str) -> Result<DateTime<Utc>, CoerceError> {
        let secs = SpacedInt::coerce(raw)?;
        DateTime::from_timestamp(secs, 0).ok_or(CoerceError::TimestampOutOfRange { secs })
    }
}

impl Coerce for Seconds {
    type Output = Duration;
    const KIND: FieldKind = FieldKind::Duration;

    fn coerce(raw: &str) -> Result<Duration, CoerceError> {
        let secs = SpacedInt::coerce(raw)?;
        u64::try_from(secs)
            .map(Duration::from_secs)
            .map_err(|_| CoerceError::NegativeDuration { secs })
    }
}

impl Coerce for Float {
    type Output = f64;
    const KIND: FieldKind = FieldKind::Float;

    fn coerce(raw: &str) -> Result<f64, CoerceError> {
        Ok(strip(raw).parse()?)
    }
}

impl Coerce for Sample {
    type Output = Value;
    const KIND: FieldKind = FieldKind::Sample;

    fn coerce(raw: &str) -> Result<Value, CoerceError> {
        Ok(strip(raw)
            .parse::<f64>()
            .map_or(Value::UNKNOWN, Value::new))
    }
}
