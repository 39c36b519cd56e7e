use std::str;

use crate::error::{new_error, ErrorKind, Result};

/// Parse a field as a wide integer in the `strtol` base-0 discipline.
///
/// Leading ASCII whitespace and an optional sign are accepted; a `0x` or
/// `0X` prefix selects hexadecimal and a bare leading `0` selects octal,
/// otherwise the field is decimal. The whole field must be consumed:
/// trailing bytes, like an empty field, yield
/// [`ErrorKind::Conversion`](crate::ErrorKind::Conversion). A value
/// outside the `i64` range yields
/// [`ErrorKind::Overflow`](crate::ErrorKind::Overflow), but only once
/// every digit has been consumed, so garbage after an overflowing number
/// still reports a conversion error.
pub fn to_long(field: &[u8]) -> Result<i64> {
    let mut i = 0;
    while i < field.len() && field[i].is_ascii_whitespace() {
        i += 1;
    }
    let negative = match field.get(i) {
        Some(&b'+') => {
            i += 1;
            false
        }
        Some(&b'-') => {
            i += 1;
            true
        }
        _ => false,
    };
    let radix: u32 = if field.get(i) == Some(&b'0')
        && matches!(field.get(i + 1), Some(&b'x') | Some(&b'X'))
        && field.get(i + 2).map_or(false, |b| b.is_ascii_hexdigit())
    {
        i += 2;
        16
    } else if field.get(i) == Some(&b'0') {
        8
    } else {
        10
    };

    let mut value: i64 = 0;
    let mut any = false;
    let mut overflow = false;
    while let Some(d) = field.get(i).and_then(|&b| (b as char).to_digit(radix)) {
        any = true;
        i += 1;
        if overflow {
            continue;
        }
        // Accumulate on the negative side so i64::MIN parses.
        value = match value.checked_mul(radix as i64).and_then(|v| {
            if negative {
                v.checked_sub(d as i64)
            } else {
                v.checked_add(d as i64)
            }
        }) {
            Some(v) => v,
            None => {
                overflow = true;
                0
            }
        };
    }

    if !any || i != field.len() {
        return Err(new_error(ErrorKind::Conversion));
    }
    if overflow {
        return Err(new_error(ErrorKind::Overflow));
    }
    Ok(value)
}

/// Parse a field as a double in the `strtod` discipline.
///
/// Leading ASCII whitespace is accepted; the rest of the field must parse
/// completely or [`ErrorKind::Conversion`](crate::ErrorKind::Conversion)
/// is returned. A finite-looking value whose magnitude exceeds the `f64`
/// range, that is, one that parses to an infinity without being spelled
/// as one, yields [`ErrorKind::Overflow`](crate::ErrorKind::Overflow).
/// Explicit `inf` and `nan` spellings parse to the corresponding values.
pub fn to_double(field: &[u8]) -> Result<f64> {
    let s = str::from_utf8(field).map_err(|_| new_error(ErrorKind::Conversion))?;
    let s = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if s.is_empty() {
        return Err(new_error(ErrorKind::Conversion));
    }
    let value: f64 = s.parse().map_err(|_| new_error(ErrorKind::Conversion))?;
    if value.is_infinite() && !spelled_infinite(s) {
        return Err(new_error(ErrorKind::Overflow));
    }
    Ok(value)
}

fn spelled_infinite(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    s.eq_ignore_ascii_case("inf") || s.eq_ignore_ascii_case("infinity")
}
