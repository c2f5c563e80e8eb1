//! Value formatter: renders typed values back to label text.
//!
//! Output always re-parses to an equal value: symbols that are not plain
//! identifiers are single-quoted, reals always carry a decimal point, and
//! units follow the value separated by one space.

use std::fmt::{self, Write};

use crate::tree::{Parameter, UnitFactor, Units, Value, ValueData, ValueShape};

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('<')?;
        let (num, den): (Vec<&UnitFactor>, Vec<&UnitFactor>) =
            self.factors.iter().partition(|u| u.exponent >= 0);
        if num.is_empty() {
            f.write_char('1')?;
        }
        for (i, u) in num.iter().enumerate() {
            if i > 0 {
                f.write_char('*')?;
            }
            write_factor(f, &u.designator, u.exponent)?;
        }
        for u in den {
            f.write_char('/')?;
            write_factor(f, &u.designator, -u.exponent)?;
        }
        f.write_char('>')
    }
}

fn write_factor(f: &mut fmt::Formatter<'_>, designator: &str, exponent: i32) -> fmt::Result {
    f.write_str(designator)?;
    if exponent != 1 {
        write!(f, "**{exponent}")?;
    }
    Ok(())
}

impl fmt::Display for ValueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueData::Integer(n) => write!(f, "{n}"),
            ValueData::Real(x) => f.write_str(&format_real(*x)),
            ValueData::String(s) => write!(f, "\"{s}\""),
            ValueData::Symbol(s) if is_identifier(s) => f.write_str(s),
            ValueData::Symbol(s) => write!(f, "'{s}'"),
            ValueData::Date(s) | ValueData::Time(s) | ValueData::DateTime(s) => f.write_str(s),
            ValueData::Null => f.write_str("NULL"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            // Malformed values keep their raw source text.
            if let ValueData::String(raw) = &self.data {
                return f.write_str(raw);
            }
        }
        write!(f, "{}", self.data)?;
        if let Some(units) = &self.units {
            write!(f, " {units}")?;
        }
        Ok(())
    }
}

/// Format a real so that it re-lexes as a real: a decimal point is always
/// present, and very large or small magnitudes use `E` notation.
pub fn format_real(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let mag = x.abs();
    if mag != 0.0 && !(1e-4..1e15).contains(&mag) {
        let s = format!("{x:E}");
        return match s.split_once('E') {
            Some((mantissa, exp)) if !mantissa.contains('.') => format!("{mantissa}.0E{exp}"),
            _ => s,
        };
    }
    let s = x.to_string();
    if s.contains('.') { s } else { format!("{s}.0") }
}

/// Whether `s` can be written as a bare identifier symbol.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !s.eq_ignore_ascii_case("NULL")
        && !s.eq_ignore_ascii_case("END")
}

/// Render a parameter's full right-hand side, honoring its shape.
pub fn format_parameter_value(param: &Parameter) -> String {
    format_values(param.shape(), param.columns(), param.values())
}

/// Render a value list in the given shape.
pub fn format_values(shape: ValueShape, columns: usize, values: &[Value]) -> String {
    let mut out = String::new();
    match shape {
        ValueShape::Scalar => {
            if let Some(v) = values.first() {
                let _ = write!(out, "{v}");
            }
        }
        ValueShape::Sequence => push_list(&mut out, '(', ')', values),
        ValueShape::Set => push_list(&mut out, '{', '}', values),
        ValueShape::Sequence2D => {
            out.push('(');
            let width = columns.max(1);
            for (i, row) in values.chunks(width).enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                push_list(&mut out, '(', ')', row);
            }
            out.push(')');
        }
    }
    out
}

fn push_list(out: &mut String, open: char, close: char, values: &[Value]) {
    out.push(open);
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{v}");
    }
    out.push(close);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_kinds() {
        assert_eq!(Value::integer(-12).to_string(), "-12");
        assert_eq!(Value::real(1.5).to_string(), "1.5");
        assert_eq!(Value::real(2.0).to_string(), "2.0");
        assert_eq!(Value::string("a b").to_string(), "\"a b\"");
        assert_eq!(Value::symbol("IMAGE").to_string(), "IMAGE");
        assert_eq!(Value::symbol("N/A").to_string(), "'N/A'");
        assert_eq!(Value::new(ValueData::Null).to_string(), "NULL");
        assert_eq!(
            Value::new(ValueData::DateTime("2001-02-03T04:05:06Z".into())).to_string(),
            "2001-02-03T04:05:06Z"
        );
    }

    #[test]
    fn reserved_words_are_quoted_symbols() {
        assert_eq!(Value::symbol("END").to_string(), "'END'");
        assert_eq!(Value::symbol("null").to_string(), "'null'");
    }

    #[test]
    fn reals_use_exponent_outside_range() {
        assert_eq!(format_real(1e-7), "1.0E-7");
        assert_eq!(format_real(2.5e20), "2.5E20");
        assert_eq!(format_real(0.0), "0.0");
    }

    #[test]
    fn units_numerator_and_denominator() {
        let u = Units {
            factors: vec![
                UnitFactor {
                    designator: "KM".into(),
                    exponent: 1,
                },
                UnitFactor {
                    designator: "SEC".into(),
                    exponent: -2,
                },
            ],
        };
        assert_eq!(u.to_string(), "<KM/SEC**2>");
        let inv = Units {
            factors: vec![UnitFactor {
                designator: "SEC".into(),
                exponent: -1,
            }],
        };
        assert_eq!(inv.to_string(), "<1/SEC>");
        assert_eq!(Value::integer(5).with_units(Units::bytes()).to_string(), "5 <BYTES>");
    }

    #[test]
    fn shapes() {
        let vals = vec![Value::integer(1), Value::integer(2), Value::integer(3), Value::integer(4)];
        assert_eq!(format_values(ValueShape::Sequence, 0, &vals), "(1, 2, 3, 4)");
        assert_eq!(format_values(ValueShape::Set, 0, &vals[..2]), "{1, 2}");
        assert_eq!(
            format_values(ValueShape::Sequence2D, 2, &vals),
            "((1, 2), (3, 4))"
        );
        assert_eq!(format_values(ValueShape::Scalar, 0, &vals), "1");
    }
}
