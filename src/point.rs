//! Published points and InfluxDB line protocol encoding.
//!
//! A [`Point`] is validated on construction so that anything reaching the
//! sink can be encoded. Line protocol reference:
//! `measurement[,tag=value...] field=value[,field=value...] timestamp`

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use crate::error::PointError;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    UInteger(u64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}i", v),
            // 1.x servers only accept signed integers; Point::new guarantees the fit
            FieldValue::UInteger(v) => write!(f, "{}i", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Boolean(v) => write!(f, "{}", v),
            FieldValue::Text(v) => {
                f.write_char('"')?;
                for c in v.chars() {
                    if c == '"' || c == '\\' {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_char('"')
            }
        }
    }
}

/// Timestamp precision of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Seconds,
    Milliseconds,
    Nanoseconds,
}

impl Precision {
    /// Value of the `precision` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Seconds => "s",
            Precision::Milliseconds => "ms",
            Precision::Nanoseconds => "ns",
        }
    }
}

/// A tagged, timestamped field set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: DateTime<Utc>,
}

impl Point {
    /// Validates and builds a point. The timestamp is truncated to whole
    /// seconds.
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, FieldValue>,
        time: DateTime<Utc>,
    ) -> Result<Self, PointError> {
        let measurement = measurement.into();
        if measurement.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }
        if fields.is_empty() {
            return Err(PointError::NoFields);
        }
        if tags.keys().any(|k| k.is_empty()) {
            return Err(PointError::EmptyKey("tag"));
        }

        for (key, value) in &fields {
            if key.is_empty() {
                return Err(PointError::EmptyKey("field"));
            }
            match value {
                FieldValue::Float(v) if !v.is_finite() => {
                    return Err(PointError::NonFiniteFloat { key: key.clone() });
                }
                FieldValue::UInteger(v) if *v > i64::MAX as u64 => {
                    return Err(PointError::IntegerOverflow {
                        key: key.clone(),
                        value: *v,
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            measurement,
            tags,
            fields,
            timestamp: time.trunc_subsecs(0),
        })
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Encodes the point as one line of line protocol.
    pub fn to_line(&self, precision: Precision) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);

        for (key, value) in &self.tags {
            if value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&escape(key, &[',', '=', ' ']));
            line.push('=');
            line.push_str(&escape(value, &[',', '=', ' ']));
        }

        line.push(' ');
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={}", escape(key, &[',', '=', ' ']), value))
            .collect();
        line.push_str(&fields.join(","));

        let secs = self.timestamp.timestamp() as i128;
        let ts = match precision {
            Precision::Seconds => secs,
            Precision::Milliseconds => secs * 1_000,
            Precision::Nanoseconds => secs * 1_000_000_000,
        };
        let _ = write!(line, " {}", ts);

        line
    }
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Points bound for one database write.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPoints {
    pub database: String,
    pub precision: Precision,
    pub points: Vec<Point>,
}

impl BatchPoints {
    pub fn new(database: impl Into<String>, precision: Precision) -> Self {
        Self {
            database: database.into(),
            precision,
            points: Vec::new(),
        }
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Request body for `/write`: one line per point.
    pub fn to_body(&self) -> String {
        self.points
            .iter()
            .map(|p| p.to_line(self.precision))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
