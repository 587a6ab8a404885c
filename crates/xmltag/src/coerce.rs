//! Text-to-primitive conversion.
//!
//! Integers and floats are parsed from the text exactly as found; only
//! booleans are trimmed. Unsigned integers take no sign, and finite floats
//! that overflow are out of range. Timestamps must be RFC 3339 with an
//! uppercase `T` separator and a `Z` or `±hh:mm` offset. Any failure is a
//! [`CoercionError`]; no default is ever substituted.

use chrono::{DateTime, FixedOffset, Utc};

use crate::decode::Decode;
use crate::descriptor::Category;
use crate::error::{CoercionError, Result};

type CoerceResult<T> = std::result::Result<T, CoercionError>;

/// Parses a base-10 signed integer and narrows it to the target width.
pub fn parse_signed<T: TryFrom<i64>>(text: &str, kind: &'static str) -> CoerceResult<T>
where
    T::Error: std::fmt::Display,
{
    let wide: i64 = text
        .parse()
        .map_err(|e| CoercionError::new(kind, text, e))?;
    T::try_from(wide).map_err(|e| CoercionError::new(kind, text, e))
}

/// Parses a base-10 unsigned integer and narrows it to the target width.
pub fn parse_unsigned<T: TryFrom<u64>>(text: &str, kind: &'static str) -> CoerceResult<T>
where
    T::Error: std::fmt::Display,
{
    if text.starts_with('+') {
        return Err(CoercionError::new(kind, text, "unexpected sign"));
    }
    let wide: u64 = text
        .parse()
        .map_err(|e| CoercionError::new(kind, text, e))?;
    T::try_from(wide).map_err(|e| CoercionError::new(kind, text, e))
}

/// Parses a double-precision float. Only an explicit infinity literal may
/// yield an infinite value.
pub fn parse_float(text: &str, kind: &'static str) -> CoerceResult<f64> {
    let value: f64 = text
        .parse()
        .map_err(|e| CoercionError::new(kind, text, e))?;
    if value.is_infinite() && !is_infinity_literal(text) {
        return Err(CoercionError::new(kind, text, "value out of range"));
    }
    Ok(value)
}

fn is_infinity_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

/// Parses a boolean literal after trimming surrounding whitespace.
pub fn parse_bool(text: &str) -> CoerceResult<bool> {
    match text.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CoercionError::new("bool", text, "not a boolean literal")),
    }
}

/// Parses an RFC 3339 timestamp, keeping its offset.
pub fn parse_timestamp(text: &str) -> CoerceResult<DateTime<FixedOffset>> {
    if !has_strict_rfc3339_shape(text) {
        return Err(CoercionError::new(
            "timestamp",
            text,
            "expected YYYY-MM-DDThh:mm:ss with a Z or ±hh:mm offset",
        ));
    }
    DateTime::parse_from_rfc3339(text).map_err(|e| CoercionError::new("timestamp", text, e))
}

// chrono also takes a space or lowercase `t` separator and a lowercase `z`.
fn has_strict_rfc3339_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() < 20 || bytes[10] != b'T' {
        return false;
    }
    if bytes.ends_with(b"Z") {
        return true;
    }
    match &bytes[bytes.len() - 6..] {
        [sign, h1, h2, b':', m1, m2] => {
            matches!(sign, b'+' | b'-')
                && [h1, h2, m1, m2].iter().all(|d| d.is_ascii_digit())
        }
        _ => false,
    }
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {$(
        impl Decode for $ty {
            const CATEGORY: Category = Category::Scalar;

            fn decode_text(&mut self, text: &str) -> Result<()> {
                *self = parse_signed(text, stringify!($ty))?;
                Ok(())
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl Decode for $ty {
            const CATEGORY: Category = Category::Scalar;

            fn decode_text(&mut self, text: &str) -> Result<()> {
                *self = parse_unsigned(text, stringify!($ty))?;
                Ok(())
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u16, u32, u64, usize);

// `u8` doubles as the element type of byte sequences: `Vec<u8>` takes the
// raw text instead of growing one element per match.
impl Decode for u8 {
    const CATEGORY: Category = Category::Scalar;
    const BYTE: bool = true;

    fn decode_text(&mut self, text: &str) -> Result<()> {
        *self = parse_unsigned(text, "u8")?;
        Ok(())
    }

    fn assign_bytes(seq: &mut Vec<u8>, text: &str) {
        seq.clear();
        seq.extend_from_slice(text.as_bytes());
    }
}

impl Decode for f64 {
    const CATEGORY: Category = Category::Scalar;

    fn decode_text(&mut self, text: &str) -> Result<()> {
        *self = parse_float(text, "f64")?;
        Ok(())
    }
}

impl Decode for f32 {
    const CATEGORY: Category = Category::Scalar;

    fn decode_text(&mut self, text: &str) -> Result<()> {
        let wide = parse_float(text, "f32")?;
        let narrow = wide as f32;
        if narrow.is_infinite() && wide.is_finite() {
            return Err(CoercionError::new("f32", text, "value out of range").into());
        }
        *self = narrow;
        Ok(())
    }
}

impl Decode for bool {
    const CATEGORY: Category = Category::Scalar;

    fn decode_text(&mut self, text: &str) -> Result<()> {
        *self = parse_bool(text)?;
        Ok(())
    }
}

impl Decode for String {
    const CATEGORY: Category = Category::Scalar;

    fn decode_text(&mut self, text: &str) -> Result<()> {
        self.clear();
        self.push_str(text);
        Ok(())
    }
}

impl Decode for DateTime<FixedOffset> {
    const CATEGORY: Category = Category::Scalar;

    fn decode_text(&mut self, text: &str) -> Result<()> {
        *self = parse_timestamp(text)?;
        Ok(())
    }
}

impl Decode for DateTime<Utc> {
    const CATEGORY: Category = Category::Scalar;

    fn decode_text(&mut self, text: &str) -> Result<()> {
        *self = parse_timestamp(text)?.with_timezone(&Utc);
        Ok(())
    }
}
