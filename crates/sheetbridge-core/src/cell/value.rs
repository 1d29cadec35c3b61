//! Typed scalar values

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// The declared type of a column or command payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    Integer,
    Real,
    Text,
    Date,
    DateTime,
    Formula,
}

impl DataType {
    /// The SQL column type used when materializing a schema
    pub fn sql_name(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Real => "real",
            DataType::Text | DataType::Formula => "text",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Integer => "integer",
            DataType::Real => "real",
            DataType::Text => "text",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
            DataType::Formula => "formula",
        })
    }
}

/// A typed scalar, as read from a cell or written in a specification
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// A spreadsheet formula, stored with its leading `=`
    Formula(String),
}

impl Value {
    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }

    /// The natural type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Real(_) => DataType::Real,
            Value::Text(_) => DataType::Text,
            Value::Date(_) => DataType::Date,
            Value::DateTime(_) => DataType::DateTime,
            Value::Formula(_) => DataType::Formula,
        }
    }

    /// The textual rendering used for content matching and text casts
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Whether this value renders as the empty string
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }

    /// Parse a date given as three groups of digits separated by `-` or `/`,
    /// with the year either first or last
    pub fn parse_date(s: &str) -> Result<NaiveDate> {
        let cast = || Error::Cast {
            value: s.to_string(),
            target: "date",
        };

        let mut groups = s.trim().split(|c| c == '-' || c == '/');
        let (a, b, c) = match (groups.next(), groups.next(), groups.next(), groups.next()) {
            (Some(a), Some(b), Some(c), None) => (a, b, c),
            _ => return Err(cast()),
        };
        let parse = |g: &str| g.parse::<u32>().map_err(|_| cast());
        let (a_num, month, c_num) = (parse(a)?, parse(b)?, parse(c)?);

        // a 4-digit (or just large) first group means the year comes first,
        // otherwise the day does
        let (year, day) = if a.len() == 4 || a_num > 31 {
            (a_num, c_num)
        } else {
            (c_num, a_num)
        };

        NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(cast)
    }

    /// Parse a datetime: a date as above, whitespace, then
    /// `HH:MM:SS[.ffffff]`
    pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
        let cast = || Error::Cast {
            value: s.to_string(),
            target: "datetime",
        };

        let s = s.trim();
        let split = s.find(char::is_whitespace).ok_or_else(cast)?;
        let date = Self::parse_date(&s[..split])?;

        let clock = s[split..].trim_start();
        let (hms, frac) = match clock.split_once('.') {
            Some((hms, frac)) => (hms, Some(frac)),
            None => (clock, None),
        };

        let mut fields = hms.split(':');
        let (h, m, sec) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(h), Some(m), Some(sec), None) => (h, m, sec),
            _ => return Err(cast()),
        };
        let parse = |g: &str| g.parse::<u32>().map_err(|_| cast());
        let (h, m, sec) = (parse(h)?, parse(m)?, parse(sec)?);

        let micros = match frac {
            Some(frac) if frac.len() <= 6 => {
                parse(frac)? * 10u32.pow(6 - frac.len() as u32)
            }
            Some(_) => return Err(cast()),
            None => 0,
        };

        let time = NaiveTime::from_hms_micro_opt(h, m, sec, micros).ok_or_else(cast)?;
        Ok(NaiveDateTime::new(date, time))
    }

    /// Cast this value to the given type
    ///
    /// Numeric texts parse, reals truncate to integers, everything renders
    /// as text, and dates/datetimes parse from their textual forms. Anything
    /// else is a cast error.
    pub fn cast(&self, target: DataType) -> Result<Value> {
        let fail = |target: &'static str| Error::Cast {
            value: self.to_text(),
            target,
        };

        match target {
            DataType::Integer => match self {
                Value::Integer(n) => Ok(Value::Integer(*n)),
                Value::Real(r) => Ok(Value::Integer(r.trunc() as i64)),
                Value::Text(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| fail("integer")),
                _ => Err(fail("integer")),
            },
            DataType::Real => match self {
                Value::Integer(n) => Ok(Value::Real(*n as f64)),
                Value::Real(r) => Ok(Value::Real(*r)),
                Value::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Real)
                    .map_err(|_| fail("real")),
                _ => Err(fail("real")),
            },
            DataType::Text => Ok(Value::Text(self.to_text())),
            DataType::Date => match self {
                Value::Date(d) => Ok(Value::Date(*d)),
                Value::DateTime(dt) => Ok(Value::Date(dt.date())),
                Value::Text(s) => Self::parse_date(s).map(Value::Date),
                _ => Err(fail("date")),
            },
            DataType::DateTime => match self {
                Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
                Value::Date(d) => Ok(Value::DateTime(
                    d.and_hms_opt(0, 0, 0).expect("midnight always exists"),
                )),
                Value::Text(s) => Self::parse_datetime(s).map(Value::DateTime),
                _ => Err(fail("datetime")),
            },
            DataType::Formula => match self {
                Value::Formula(f) => Ok(Value::Formula(f.clone())),
                Value::Text(s) if s.starts_with('=') => Ok(Value::Formula(s.clone())),
                _ => Err(fail("formula")),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
            Value::Formula(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_date_year_first_and_last() {
        let expected = NaiveDate::from_ymd_opt(2018, 7, 24).unwrap();
        assert_eq!(Value::parse_date("2018-07-24").unwrap(), expected);
        assert_eq!(Value::parse_date("2018/07/24").unwrap(), expected);
        assert_eq!(Value::parse_date("24-07-2018").unwrap(), expected);
        assert_eq!(Value::parse_date("24/7/2018").unwrap(), expected);

        assert!(Value::parse_date("2018-07").is_err());
        assert!(Value::parse_date("2018-13-01").is_err());
        assert!(Value::parse_date("not a date").is_err());
    }

    #[test]
    fn test_parse_datetime() {
        let dt = Value::parse_datetime("2018-07-24 15:18:45").unwrap();
        assert_eq!(dt.to_string(), "2018-07-24 15:18:45");

        let dt = Value::parse_datetime("24/07/2018 1:2:3.5").unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2018, 7, 24)
                .unwrap()
                .and_hms_micro_opt(1, 2, 3, 500_000)
                .unwrap()
        );

        assert!(Value::parse_datetime("2018-07-24").is_err());
        assert!(Value::parse_datetime("2018-07-24 25:00:00").is_err());
    }

    #[test]
    fn test_cast_integer() {
        assert_eq!(
            Value::text("42").cast(DataType::Integer).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            Value::Real(3.7).cast(DataType::Integer).unwrap(),
            Value::Integer(3)
        );
        assert!(Value::text("3.7").cast(DataType::Integer).is_err());
        assert!(Value::text("x").cast(DataType::Integer).is_err());
    }

    #[test]
    fn test_cast_real_and_text() {
        assert_eq!(
            Value::text("2.5").cast(DataType::Real).unwrap(),
            Value::Real(2.5)
        );
        assert_eq!(
            Value::Integer(2).cast(DataType::Real).unwrap(),
            Value::Real(2.0)
        );
        assert_eq!(
            Value::Integer(2).cast(DataType::Text).unwrap(),
            Value::text("2")
        );
    }

    #[test]
    fn test_cast_formula() {
        assert_eq!(
            Value::text("=A1+B1").cast(DataType::Formula).unwrap(),
            Value::Formula("=A1+B1".into())
        );
        assert!(Value::text("A1+B1").cast(DataType::Formula).is_err());
    }

    #[test]
    fn test_cast_dates() {
        let date = Value::text("24-12-2013").cast(DataType::Date).unwrap();
        assert_eq!(date.to_text(), "2013-12-24");

        let dt = date.cast(DataType::DateTime).unwrap();
        assert_eq!(dt.to_text(), "2013-12-24 00:00:00");
    }
}
