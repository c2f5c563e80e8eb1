//! Typed parameter values and units expressions.

use serde::Serialize;

/// The datum carried by a [`Value`].
///
/// Dates and times keep their source spelling; the grammar has already
/// checked their shape, and round-tripping the exact text matters more to
/// label producers than calendar arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ValueData {
    /// Signed integer, including radix literals such as `16#FF#`.
    Integer(i64),
    /// Real number.
    Real(f64),
    /// Double-quoted text.
    String(String),
    /// Identifier or single-quoted symbol.
    Symbol(String),
    /// `YYYY-MM-DD` or `YYYY-DDD`.
    Date(String),
    /// `HH:MM[:SS[.fff]][Z]`.
    Time(String),
    /// Date and time joined by `T`.
    DateTime(String),
    /// The `NULL` literal.
    Null,
}

/// One `{designator, exponent}` term of a units expression.
///
/// A negative exponent places the designator in the denominator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFactor {
    /// Unit name, e.g. `KM`.
    pub designator: String,
    /// Power; negative for denominators.
    pub exponent: i32,
}

/// Ordered product of unit factors, written `<KM/SEC**2>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Units {
    /// Factors in source order.
    pub factors: Vec<UnitFactor>,
}

impl Units {
    /// A single designator raised to the first power.
    pub fn single(designator: impl Into<String>) -> Self {
        Self {
            factors: vec![UnitFactor {
                designator: designator.into(),
                exponent: 1,
            }],
        }
    }

    /// `<BYTES>`, the units that mark a byte-located pointer.
    pub fn bytes() -> Self {
        Self::single("BYTES")
    }

    /// Whether this expression is exactly `<BYTES>` (case-insensitive).
    pub fn is_bytes(&self) -> bool {
        matches!(
            self.factors.as_slice(),
            [f] if f.exponent == 1 && f.designator.eq_ignore_ascii_case("BYTES")
        )
    }
}

/// A single value of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Value {
    /// The typed datum.
    #[serde(flatten)]
    pub data: ValueData,
    /// Optional units expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Units>,
    /// `false` when the grammar kept a malformed value.
    pub valid: bool,
}

impl Value {
    /// A valid value without units.
    pub fn new(data: ValueData) -> Self {
        Self {
            data,
            units: None,
            valid: true,
        }
    }

    /// Integer value.
    pub fn integer(n: i64) -> Self {
        Self::new(ValueData::Integer(n))
    }

    /// Real value.
    pub fn real(x: f64) -> Self {
        Self::new(ValueData::Real(x))
    }

    /// Double-quoted text value.
    pub fn string(s: impl Into<String>) -> Self {
        Self::new(ValueData::String(s.into()))
    }

    /// Symbol value.
    pub fn symbol(s: impl Into<String>) -> Self {
        Self::new(ValueData::Symbol(s.into()))
    }

    /// Attach a units expression.
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = Some(units);
        self
    }

    /// A value the grammar could not make sense of; `raw` is kept as text.
    pub(crate) fn malformed(raw: impl Into<String>) -> Self {
        Self {
            data: ValueData::String(raw.into()),
            units: None,
            valid: false,
        }
    }

    /// The integer payload, if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self.data {
            ValueData::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// The textual payload of string, symbol, date, and time values.
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            ValueData::String(s)
            | ValueData::Symbol(s)
            | ValueData::Date(s)
            | ValueData::Time(s)
            | ValueData::DateTime(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the units expression is `<BYTES>`.
    pub fn has_byte_units(&self) -> bool {
        self.units.as_ref().is_some_and(Units::is_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_detection_ignores_case() {
        assert!(Units::single("bytes").is_bytes());
        assert!(Units::bytes().is_bytes());
        assert!(!Units::single("KM").is_bytes());
        let squared = Units {
            factors: vec![UnitFactor {
                designator: "BYTES".into(),
                exponent: 2,
            }],
        };
        assert!(!squared.is_bytes());
    }

    #[test]
    fn text_accessors() {
        assert_eq!(Value::string("a.img").as_text(), Some("a.img"));
        assert_eq!(Value::symbol("IMAGE").as_text(), Some("IMAGE"));
        assert_eq!(Value::integer(4).as_text(), None);
        assert_eq!(Value::integer(4).as_integer(), Some(4));
    }

    #[test]
    fn malformed_is_invalid() {
        let v = Value::malformed("\"oops");
        assert!(!v.valid);
        assert_eq!(v.as_text(), Some("\"oops"));
    }
}
