//! Human-readable byte sizes and durations for configuration values
//!
//! Both types accept either a bare integer (bytes / seconds) or a string with a
//! unit suffix, so `max_body_bytes = "1MB"` and `ttl = "5m"` read naturally in TOML
//! and in `CANOEGATE__*` environment overrides.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Value out of range: {0}")]
    Overflow(String),
}

/// Splits `"300 ms"` into `(300, "ms")`. The unit is lowercased.
fn split_quantity(input: &str) -> Result<(u64, String), ParseError> {
    let s = input.trim();
    let pos = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if pos == 0 {
        return Err(ParseError::InvalidFormat(s.to_string()));
    }

    let value = s[..pos].parse::<u64>()?;
    Ok((value, s[pos..].trim().to_ascii_lowercase()))
}

/// Byte size with human-readable parsing (`"512KB"`, `"1MB"`, `1024`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl From<u64> for ByteSize {
    fn from(value: u64) -> Self {
        ByteSize(value)
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_quantity(s)?;

        let multiplier: u64 = match unit.as_str() {
            "" | "b" => 1,
            "k" | "kb" | "kib" => 1024,
            "m" | "mb" | "mib" => 1024 * 1024,
            "g" | "gb" | "gib" => 1024 * 1024 * 1024,
            _ => return Err(ParseError::InvalidUnit(unit)),
        };

        value
            .checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| ParseError::Overflow(s.to_string()))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [(&str, u64); 3] = [
            ("GB", 1024 * 1024 * 1024),
            ("MB", 1024 * 1024),
            ("KB", 1024),
        ];

        for (unit, divisor) in UNITS {
            if self.0 >= divisor && self.0 % divisor == 0 {
                return write!(f, "{}{}", self.0 / divisor, unit);
            }
        }
        write!(f, "{}B", self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(HumanVisitor::<ByteSize>::new(
            "a byte size as string (e.g. \"512KB\", \"1MB\") or integer",
        ))
    }
}

/// Duration with human-readable parsing (`"250ms"`, `"30s"`, `"5m"`, `"1h"`, `300`)
///
/// Bare integers are seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub fn from_secs(secs: u64) -> Self {
        HumanDuration(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<u64> for HumanDuration {
    fn from(secs: u64) -> Self {
        HumanDuration::from_secs(secs)
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_quantity(s)?;

        let duration = match unit.as_str() {
            "ms" => Duration::from_millis(value),
            "" | "s" | "sec" | "secs" => Duration::from_secs(value),
            "m" | "min" | "mins" => value
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| ParseError::Overflow(s.to_string()))?,
            "h" | "hr" | "hrs" => value
                .checked_mul(3600)
                .map(Duration::from_secs)
                .ok_or_else(|| ParseError::Overflow(s.to_string()))?,
            _ => return Err(ParseError::InvalidUnit(unit)),
        };

        Ok(HumanDuration(duration))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.subsec_millis() != 0 {
            write!(f, "{}ms", self.0.as_millis())
        } else {
            write!(f, "{}s", self.0.as_secs())
        }
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(HumanVisitor::<HumanDuration>::new(
            "a duration as string (e.g. \"30s\", \"5m\") or integer seconds",
        ))
    }
}

/// Shared visitor: integers go through `From<u64>`, strings through `FromStr`
struct HumanVisitor<T> {
    expecting: &'static str,
    marker: PhantomData<T>,
}

impl<T> HumanVisitor<T> {
    fn new(expecting: &'static str) -> Self {
        Self {
            expecting,
            marker: PhantomData,
        }
    }
}

impl<'de, T> serde::de::Visitor<'de> for HumanVisitor<T>
where
    T: FromStr<Err = ParseError> + From<u64>,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.expecting)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(T::from(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        u64::try_from(v)
            .map(T::from)
            .map_err(|_| E::custom(format!("negative value: {v}")))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse::<T>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte_sizes() {
        assert_eq!("1024".parse::<ByteSize>().unwrap().as_u64(), 1024);
        assert_eq!("512KB".parse::<ByteSize>().unwrap().as_u64(), 512 * 1024);
        assert_eq!("1 MiB".parse::<ByteSize>().unwrap().as_u64(), 1024 * 1024);
        assert_eq!("2g".parse::<ByteSize>().unwrap().as_u64(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_byte_size_errors() {
        assert!(matches!("MB".parse::<ByteSize>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("5XB".parse::<ByteSize>(), Err(ParseError::InvalidUnit(_))));
        assert!(matches!(
            "99999999999999GB".parse::<ByteSize>(),
            Err(ParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_parse_durations() {
        assert_eq!("300".parse::<HumanDuration>().unwrap().as_secs(), 300);
        assert_eq!("30s".parse::<HumanDuration>().unwrap().as_secs(), 30);
        assert_eq!("5m".parse::<HumanDuration>().unwrap().as_secs(), 300);
        assert_eq!("1h".parse::<HumanDuration>().unwrap().as_secs(), 3600);
        assert_eq!(
            "250ms".parse::<HumanDuration>().unwrap().as_duration(),
            Duration::from_millis(250)
        );
        assert!("10 fortnights".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ByteSize(1024 * 1024).to_string(), "1MB");
        assert_eq!(ByteSize(1500).to_string(), "1500B");
        assert_eq!(HumanDuration::from_secs(300).to_string(), "300s");
        assert_eq!(HumanDuration(Duration::from_millis(1500)).to_string(), "1500ms");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        #[derive(Deserialize)]
        struct Sample {
            size: ByteSize,
            ttl: HumanDuration,
        }

        let parsed: Sample = serde_json::from_str(r#"{"size": "1MB", "ttl": 60}"#).unwrap();
        assert_eq!(parsed.size.as_u64(), 1024 * 1024);
        assert_eq!(parsed.ttl.as_secs(), 60);

        let parsed: Sample = serde_json::from_str(r#"{"size": 2048, "ttl": "2m"}"#).unwrap();
        assert_eq!(parsed.size.as_u64(), 2048);
        assert_eq!(parsed.ttl.as_secs(), 120);
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        #[derive(Debug, Deserialize)]
        struct Sample {
            #[allow(dead_code)]
            ttl: HumanDuration,
        }

        assert!(serde_json::from_str::<Sample>(r#"{"ttl": -5}"#).is_err());
    }
}
