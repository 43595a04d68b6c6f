use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::domain::error::FormatError;

const UTC_MARKER: char = 'Z';
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M%:z"];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTimestamp {
    EpochMillis(i64),
    IsoString(String),
}

impl TryFrom<&Value> for RawTimestamp {
    type Error = FormatError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(number) => number
                .as_i64()
                .map(Self::EpochMillis)
                .ok_or_else(|| FormatError::Timestamp(value.to_string())),
            Value::String(text) => Ok(Self::IsoString(text.clone())),
            _ => Err(FormatError::Timestamp(value.to_string())),
        }
    }
}

impl RawTimestamp {
    // ISO strings keep their written wall time; epoch millis use the host zone.
    pub fn normalize(&self) -> Result<NaiveDateTime, FormatError> {
        match self {
            Self::EpochMillis(millis) => DateTime::from_timestamp_millis(*millis)
                .map(|utc| utc.with_timezone(&Local).naive_local())
                .ok_or_else(|| FormatError::Timestamp(millis.to_string())),
            Self::IsoString(text) => parse_iso(text),
        }
    }
}

pub fn normalize_timestamp(value: &Value) -> Result<NaiveDateTime, FormatError> {
    RawTimestamp::try_from(value)?.normalize()
}

fn parse_iso(text: &str) -> Result<NaiveDateTime, FormatError> {
    let trimmed = text.trim().trim_end_matches(UTC_MARKER);

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .or_else(|| {
                    OFFSET_FORMATS
                        .iter()
                        .find_map(|format| DateTime::parse_from_str(trimmed, format).ok())
                })
                .map(|with_offset| with_offset.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| FormatError::Timestamp(text.to_string()))
}
