//! Sample values that may be unknown.

use std::fmt;

use serde::{Serialize, Serializer};

/// A floating-point sample from a dump.
///
/// rrdtool marks missing or invalid samples with a non-numeric token such as
/// `NaN` or `U`. Those decode to NaN, exposed here as [`Value::is_unknown`].
///
/// Two unknown values compare equal, so decoded trees can be compared
/// structurally.
#[derive(Debug, Clone, Copy, Default)]
pub struct Value(f64);

impl Value {
    /// The unknown sample.
    pub const UNKNOWN: Self = Self(f64::NAN);

    /// Wraps a raw float. NaN becomes the unknown sample.
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Returns the raw float, NaN when unknown.
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Returns `true` if this sample is unknown.
    pub fn is_unknown(self) -> bool {
        self.0.is_nan()
    }

    /// Returns the float, or `None` when unknown.
    ///
    /// ```rust
    /// use rrdump::Value;
    ///
    /// assert_eq!(Value::new(2.5).known(), Some(2.5));
    /// assert_eq!(Value::UNKNOWN.known(), None);
    /// ```
    pub fn known(self) -> Option<f64> {
        if self.is_unknown() { None } else { Some(self.0) }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        (self.is_unknown() && other.is_unknown()) || self.0 == other.0
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Value> for f64 {
    fn from(value: Value) -> Self {
        value.0
    }
}

impl fmt::Display for Value {
    /// Unknown samples display as `U`, the token rrdtool itself writes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.known() {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("U"),
        }
    }
}

impl Serialize for Value {
    /// Unknown samples serialize as null, infinities as `"+Inf"` and
    /// `"-Inf"`, everything else as a string with six fractional digits.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.known() {
            None => serializer.serialize_none(),
            Some(v) if v == f64::INFINITY => serializer.serialize_str("+Inf"),
            Some(v) if v == f64::NEG_INFINITY => serializer.serialize_str("-Inf"),
            Some(v) => serializer.collect_str(&format_args!("{v:.6}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_values_compare_equal() {
        assert_eq!(Value::UNKNOWN, Value::new(f64::NAN));
        assert_ne!(Value::UNKNOWN, Value::new(0.0));
        assert_eq!(Value::new(1.5), Value::from(1.5));
        assert_ne!(Value::new(1.5), Value::new(1.25));
    }

    #[test]
    fn test_serialize_unknown_as_null() {
        let json = serde_json::to_string(&Value::UNKNOWN).unwrap();
        assert_eq!(json, "null");
        assert!(!json.contains("NaN"));
    }

    #[test]
    fn test_serialize_known_as_text() {
        assert_eq!(serde_json::to_string(&Value::new(1.5)).unwrap(), "\"1.500000\"");
        assert_eq!(serde_json::to_string(&Value::new(-0.25)).unwrap(), "\"-0.250000\"");

        let row = vec![Value::new(3.0), Value::UNKNOWN];
        assert_eq!(serde_json::to_string(&row).unwrap(), "[\"3.000000\",null]");
    }

    #[test]
    fn test_serialize_infinities() {
        let row = vec![Value::new(f64::INFINITY), Value::new(f64::NEG_INFINITY)];
        assert_eq!(serde_json::to_string(&row).unwrap(), "[\"+Inf\",\"-Inf\"]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::new(42.0).to_string(), "42");
        assert_eq!(Value::UNKNOWN.to_string(), "U");
    }
}
