//! Units expression parser: the text between `<` and `>`.

use crate::tree::{UnitFactor, Units};

/// Parse `KM/SEC**2`, `BYTES`, `1/SEC` and friends into ordered factors.
///
/// A leading `1` stands for an empty numerator. Factors after `/` get their
/// exponent negated. Whitespace around operators is ignored.
pub fn parse_units(text: &str) -> Result<Units, &'static str> {
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut factors = Vec::new();
    let mut denominator = false;
    let mut first = true;

    loop {
        skip_ws(bytes, &mut i);
        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        let name = &text[start..i];
        if name.is_empty() {
            return Err(if first {
                "empty units expression"
            } else {
                "expected a unit name after an operator"
            });
        }
        let is_unity = first && name == "1";
        if !is_unity && !name.as_bytes()[0].is_ascii_alphabetic() {
            return Err("unit names must start with a letter");
        }

        skip_ws(bytes, &mut i);
        let mut exponent: i32 = 1;
        if text[i..].starts_with("**") {
            if is_unity {
                return Err("the unity numerator cannot carry an exponent");
            }
            i += 2;
            skip_ws(bytes, &mut i);
            let exp_start = i;
            if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
                i += 1;
            }
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            exponent = text[exp_start..i]
                .parse()
                .map_err(|_| "exponent after '**' must be an integer")?;
            if exponent == 0 {
                return Err("exponent must not be zero");
            }
        }

        if !is_unity {
            factors.push(UnitFactor {
                designator: name.to_string(),
                exponent: if denominator { -exponent } else { exponent },
            });
        }
        first = false;

        skip_ws(bytes, &mut i);
        match bytes.get(i) {
            None => break,
            Some(b'*') => {
                if denominator {
                    return Err("'*' cannot follow a '/' term");
                }
            }
            Some(b'/') => denominator = true,
            Some(_) => return Err("unexpected character in units expression"),
        }
        i += 1;
    }

    if factors.is_empty() {
        return Err("units expression has no unit names");
    }
    Ok(Units { factors })
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}
