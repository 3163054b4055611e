//! Native representation of the values exchanged with the API.
//!
//! Responses decode into a `Value`: either a `Resource` (field name to value),
//! an `Array` of values, or a single `Scalar`. Requests are built from
//! `Fields`, which only ever hold scalars.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::FromIterator;
use std::ops::Index;
use std::str::FromStr;

use num::bigint::Sign;
use num::{BigInt, Zero};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::{Error, Result};

pub type Array = Vec<Value>;
pub type Resource = BTreeMap<String, Value>;

/// Arbitrary-precision decimal number: `mantissa * 10^exponent`.
///
/// The exponent of the parsed text is kept, so `"9.00"` prints back as `"9.00"`,
/// while comparison is numeric (`1.0 == 1.00`). Exponents are never expanded
/// into digits, so `1E+999999999` stays small.
#[derive(Clone, Debug)]
pub struct Decimal {
    mantissa: BigInt,
    exponent: i64,
}

impl Decimal {
    pub fn new(mantissa: BigInt, exponent: i64) -> Decimal {
        Decimal {
            mantissa: mantissa,
            exponent: exponent,
        }
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    /// Mantissa and exponent with trailing zeros moved into the exponent.
    fn normalized(&self) -> (BigInt, i128) {
        if self.mantissa.is_zero() {
            return (BigInt::zero(), 0);
        }

        let ten = BigInt::from(10u32);
        let mut mantissa = self.mantissa.clone();
        let mut exponent = self.exponent as i128;
        while (&mantissa % &ten).is_zero() {
            mantissa /= &ten;
            exponent += 1;
        }
        (mantissa, exponent)
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Decimal> {
        let invalid = || Error::InvalidValue {
            kind: "decimal",
            text: s.to_string(),
        };

        let trimmed = s.trim();

        let (number, exponent) = match trimmed.find(|c: char| c == 'e' || c == 'E') {
            Some(pos) => {
                let exponent = trimmed[pos + 1..].parse::<i64>().map_err(|_| invalid())?;
                (&trimmed[..pos], exponent)
            }
            None => (trimmed, 0),
        };

        let (negative, unsigned) = match number.as_bytes().first() {
            Some(&b'-') => (true, &number[1..]),
            Some(&b'+') => (false, &number[1..]),
            _ => (false, number),
        };

        let (int_part, frac_part) = match unsigned.find('.') {
            Some(pos) => (&unsigned[..pos], &unsigned[pos + 1..]),
            None => (unsigned, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = format!("{}{}", int_part, frac_part);
        let mut mantissa = BigInt::from_str(&digits).map_err(|_| invalid())?;
        if negative {
            mantissa = -mantissa;
        }

        let frac_len = i64::try_from(frac_part.len()).map_err(|_| invalid())?;
        let exponent = exponent.checked_sub(frac_len).ok_or_else(invalid)?;

        Ok(Decimal::new(mantissa, exponent))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign = if self.mantissa.sign() == Sign::Minus { "-" } else { "" };
        let digits = self.mantissa.magnitude().to_string();
        let adjusted = self.exponent as i128 + digits.len() as i128 - 1;

        // Scientific notation once the exponent is positive or the number is tiny
        if self.exponent > 0 || adjusted < -6 {
            let (first, rest) = digits.split_at(1);
            let exp_sign = if adjusted < 0 { "-" } else { "+" };
            return if rest.is_empty() {
                write!(f, "{}{}E{}{}", sign, first, exp_sign, adjusted.abs())
            } else {
                write!(f, "{}{}.{}E{}{}", sign, first, rest, exp_sign, adjusted.abs())
            };
        }

        // adjusted >= -6 bounds the scale by the digit count
        let scale = self.exponent.unsigned_abs() as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }

        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);

        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Decimal) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Decimal {}

impl From<i64> for Decimal {
    fn from(value: i64) -> Decimal {
        Decimal::new(BigInt::from(value), 0)
    }
}

/// A single typed field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    DateTime(OffsetDateTime),
    Null,
}

impl fmt::Display for Scalar {
    /// Writes the text sent on the wire for this value.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Scalar::Boolean(b) => f.write_str(if b { "true" } else { "false" }),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Decimal(ref d) => fmt::Display::fmt(d, f),
            Scalar::Text(ref s) => f.write_str(s),
            // Plain "date time" form, not the ISO-8601 form responses use
            Scalar::DateTime(ref dt) => {
                let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
                let text = dt.format(format).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
            Scalar::Null => Ok(()),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Scalar {
        Scalar::Boolean(value)
    }
}

macro_rules! scalar_from_int {
    ($($t:ty), +) => (
        $(impl From<$t> for Scalar {
            fn from(value: $t) -> Scalar { Scalar::Integer(value as i64) }
        })+
    )
}

scalar_from_int! { i8, i16, i32, i64, u8, u16, u32 }

impl From<Decimal> for Scalar {
    fn from(value: Decimal) -> Scalar {
        Scalar::Decimal(value)
    }
}

impl<'a> From<&'a str> for Scalar {
    fn from(value: &'a str) -> Scalar {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Scalar {
        Scalar::Text(value)
    }
}

impl From<OffsetDateTime> for Scalar {
    fn from(value: OffsetDateTime) -> Scalar {
        Scalar::DateTime(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Scalar {
        match value {
            Some(value) => value.into(),
            None => Scalar::Null,
        }
    }
}

/// A decoded response value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Array(Array),
    Resource(Resource),
}

impl Value {
    /// If the value is a Resource, returns the value associated with the provided key.
    pub fn find<'a>(&'a self, key: &str) -> Option<&'a Value> {
        match *self {
            Value::Resource(ref map) => map.get(key),
            _ => None,
        }
    }

    /// Follows `keys` through nested resources.
    pub fn find_path<'a>(&'a self, keys: &[&str]) -> Option<&'a Value> {
        let mut target = self;
        for key in keys.iter() {
            target = target.find(key)?;
        }
        Some(target)
    }

    /// Depth-first search for `key` through nested resources and arrays.
    pub fn search<'a>(&'a self, key: &str) -> Option<&'a Value> {
        match *self {
            Value::Resource(ref map) => map
                .get(key)
                .or_else(|| map.values().filter_map(|v| v.search(key)).next()),
            Value::Array(ref values) => values.iter().filter_map(|v| v.search(key)).next(),
            Value::Scalar(_) => None,
        }
    }

    pub fn is_resource(&self) -> bool {
        self.as_resource().is_some()
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match *self {
            Value::Resource(ref map) => Some(map),
            _ => None,
        }
    }

    pub fn into_resource(self) -> Result<Resource> {
        match self {
            Value::Resource(map) => Ok(map),
            _ => Err(Error::UnexpectedDocument { expected: "a resource" }),
        }
    }

    pub fn is_array(&self) -> bool {
        self.as_array().is_some()
    }

    pub fn as_array(&self) -> Option<&Array> {
        match *self {
            Value::Array(ref values) => Some(values),
            _ => None,
        }
    }

    pub fn into_array(self) -> Result<Array> {
        match self {
            Value::Array(values) => Ok(values),
            _ => Err(Error::UnexpectedDocument { expected: "an array" }),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match *self {
            Value::Scalar(ref scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Scalar(Scalar::Text(ref s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Scalar(Scalar::Boolean(b)) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Scalar(Scalar::Integer(i)) => Some(i),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match *self {
            Value::Scalar(Scalar::Decimal(ref d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<OffsetDateTime> {
        match *self {
            Value::Scalar(Scalar::DateTime(dt)) => Some(dt),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Value::Scalar(Scalar::Null)
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Value {
        Value::Scalar(value)
    }
}

impl<'a> Index<&'a str> for Value {
    type Output = Value;

    fn index(&self, key: &'a str) -> &Value {
        match self.find(key) {
            Some(value) => value,
            None => panic!("no field named '{}'", key),
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, idx: usize) -> &Value {
        match *self {
            Value::Array(ref values) => &values[idx],
            _ => panic!("can only index a value with usize if it is an array"),
        }
    }
}

/// Ordered field assignments for a request document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Scalar)>,
}

impl Fields {
    pub fn new() -> Fields {
        Fields { entries: Vec::new() }
    }

    pub fn with<V: Into<Scalar>>(mut self, name: &str, value: V) -> Fields {
        self.insert(name, value);
        self
    }

    /// Sets `name`, replacing an earlier value in place.
    pub fn insert<V: Into<Scalar>>(&mut self, name: &str, value: V) {
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.0 == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.entries.iter().find(|entry| entry.0 == name).map(|entry| &entry.1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|entry| (entry.0.as_str(), &entry.1))
    }
}

impl<'a, V: Into<Scalar>> FromIterator<(&'a str, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (&'a str, V)>>(iter: I) -> Fields {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::{Decimal, Fields, Scalar, Value};
    use std::collections::BTreeMap;
    use time::macros::datetime;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_decimal_keeps_scale() {
        assert_eq!("9.00", decimal("9.00").to_string());
        assert_eq!("0.05", decimal("0.05").to_string());
        assert_eq!("-12.5", decimal("-12.5").to_string());
        assert_eq!("0.5", decimal(".5").to_string());
        assert_eq!("503", decimal("503").to_string());
    }

    #[test]
    fn test_decimal_exponent() {
        assert_eq!("1.5E+3", decimal("1.5E3").to_string());
        assert_eq!("0.015", decimal("1.5e-2").to_string());
        assert_eq!("1E-9", decimal("1e-9").to_string());
        assert_eq!(decimal("1500"), decimal("1.5E3"));
    }

    #[test]
    fn test_decimal_huge_exponent_stays_compact() {
        let huge = decimal("1E+999999999");

        assert_eq!("1E+999999999", huge.to_string());
        assert_eq!(decimal("100E+999999997"), huge);
        assert!(decimal("1e3000000") != decimal("1e3000001"));
    }

    #[test]
    fn test_decimal_exponent_bounds() {
        assert_eq!("1E-9223372036854775808", decimal("1e-9223372036854775808").to_string());
        assert!("1.5e-9223372036854775808".parse::<Decimal>().is_err());
        assert!("1e9223372036854775808".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_decimal_numeric_equality() {
        assert_eq!(decimal("1.0"), decimal("1.00"));
        assert_eq!(decimal("12"), Decimal::from(12));
        assert!(decimal("1.01") != decimal("1.1"));
    }

    #[test]
    fn test_decimal_beyond_machine_precision() {
        let text = "123456789012345678901234567890.123456789";
        assert_eq!(text, decimal(text).to_string());
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        assert!("".parse::<Decimal>().is_err());
        assert!("-".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("NaN".parse::<Decimal>().is_err());
        assert!("12abc".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_scalar_wire_text() {
        assert_eq!("true", Scalar::Boolean(true).to_string());
        assert_eq!("false", Scalar::Boolean(false).to_string());
        assert_eq!("503", Scalar::Integer(503).to_string());
        assert_eq!("9.00", Scalar::Decimal(decimal("9.00")).to_string());
        assert_eq!("H\u{c9}llo", Scalar::from("H\u{c9}llo").to_string());
        assert_eq!("", Scalar::Null.to_string());
    }

    #[test]
    fn test_datetime_wire_text_is_not_iso() {
        let dt = Scalar::from(datetime!(2009-11-10 21:11:00 UTC));
        assert_eq!("2009-11-10 21:11:00", dt.to_string());
    }

    #[test]
    fn test_option_into_scalar() {
        assert_eq!(Scalar::Null, Scalar::from(None::<i32>));
        assert_eq!(Scalar::Integer(3), Scalar::from(Some(3)));
    }

    #[test]
    fn test_fields_insert_replaces_in_place() {
        let mut fields = Fields::new().with("screen_name", "test").with("email", "");
        fields.insert("screen_name", "jb");

        let names: Vec<&str> = fields.iter().map(|(name, _)| name).collect();
        assert_eq!(vec!["screen_name", "email"], names);
        assert_eq!(Some(&Scalar::from("jb")), fields.get("screen_name"));
        assert_eq!(2, fields.len());
    }

    #[test]
    fn test_fields_from_iter() {
        let fields: Fields = vec![("a", 1), ("b", 2), ("a", 3)].into_iter().collect();

        assert_eq!(2, fields.len());
        assert_eq!(Some(&Scalar::Integer(3)), fields.get("a"));
    }

    #[test]
    fn test_value_lookup() {
        let mut inner = BTreeMap::new();
        inner.insert("id".to_string(), Value::from(Scalar::Integer(7)));

        let mut outer = BTreeMap::new();
        outer.insert("plan".to_string(), Value::Resource(inner));
        outer.insert("on_trial".to_string(), Value::from(Scalar::Boolean(true)));
        outer.insert("email".to_string(), Value::from(Scalar::Null));
        let value = Value::Resource(outer);

        assert_eq!(Some(true), value["on_trial"].as_bool());
        assert_eq!(Some(7), value.find_path(&["plan", "id"]).and_then(|v| v.as_integer()));
        assert_eq!(Some(7), value.search("id").and_then(|v| v.as_integer()));
        assert!(value["email"].is_null());
        assert!(value.find("missing").is_none());
        assert!(value.clone().into_array().is_err());
        assert!(value.into_resource().is_ok());
    }
}
