use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde_json::Value;
use thiserror::Error;

use crate::domain::billing_plan::{WEEK, week_index};
use crate::domain::error::FormatError;
use crate::domain::timestamp::normalize_timestamp;

pub const HOURS_PER_DAY: usize = 24;

pub type SensorStatistics = BTreeMap<String, Vec<Value>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub sensor_id: String,
    pub timestamp: NaiveDateTime,
    pub change_kwh: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ReadingError {
    #[error("record must be a JSON object")]
    InvalidRecordType,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field `change` is not a number")]
    InvalidChange,
    #[error(transparent)]
    Timestamp(#[from] FormatError),
}

impl Reading {
    pub fn from_record(sensor_id: &str, record: &Value) -> Result<Self, ReadingError> {
        let object = record.as_object().ok_or(ReadingError::InvalidRecordType)?;

        let start = object
            .get("start")
            .ok_or(ReadingError::MissingField("start"))?;
        let change = match object.get("change") {
            None | Some(Value::Null) => return Err(ReadingError::MissingField("change")),
            Some(value) => value.as_f64().ok_or(ReadingError::InvalidChange)?,
        };

        Ok(Self {
            sensor_id: sensor_id.to_string(),
            timestamp: normalize_timestamp(start)?,
            change_kwh: change,
        })
    }

    pub fn weekday(&self) -> Weekday {
        self.timestamp.weekday()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyTotals([f64; HOURS_PER_DAY]);

impl Default for HourlyTotals {
    fn default() -> Self {
        Self([0.0; HOURS_PER_DAY])
    }
}

impl HourlyTotals {
    #[cfg(test)]
    pub fn get(&self, hour: u32) -> f64 {
        self.0.get(hour as usize).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        (0_u32..).zip(self.0.iter().copied())
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    fn add(&mut self, hour: u32, kwh: f64) {
        if let Some(cell) = self.0.get_mut(hour as usize) {
            *cell += kwh;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayHourTotals([[f64; HOURS_PER_DAY]; 7]);

impl Default for DayHourTotals {
    fn default() -> Self {
        Self([[0.0; HOURS_PER_DAY]; 7])
    }
}

impl DayHourTotals {
    #[cfg(test)]
    pub fn get(&self, day: Weekday, hour: u32) -> f64 {
        self.0[week_index(day)]
            .get(hour as usize)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn cells(&self) -> impl Iterator<Item = (Weekday, u32, f64)> + '_ {
        WEEK.into_iter().flat_map(move |day| {
            (0_u32..)
                .zip(self.0[week_index(day)].iter().copied())
                .map(move |(hour, kwh)| (day, hour, kwh))
        })
    }

    pub fn add(&mut self, day: Weekday, hour: u32, kwh: f64) {
        if let Some(cell) = self.0[week_index(day)].get_mut(hour as usize) {
            *cell += kwh;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub hourly: HourlyTotals,
    pub by_day_hour: DayHourTotals,
    pub accepted: usize,
    pub skipped: usize,
}

impl Aggregation {
    pub fn record(&mut self, reading: &Reading) {
        let (day, hour) = (reading.weekday(), reading.hour());
        self.hourly.add(hour, reading.change_kwh);
        self.by_day_hour.add(day, hour, reading.change_kwh);
        self.accepted += 1;
    }
}

pub fn aggregate(statistics: &SensorStatistics) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for (sensor_id, records) in statistics {
        for record in records {
            match Reading::from_record(sensor_id, record) {
                Ok(reading) => aggregation.record(&reading),
                Err(error) => {
                    aggregation.skipped += 1;
                    tracing::warn!(
                        sensor_id = %sensor_id,
                        record = %record,
                        error = %error,
                        "skipping malformed statistics record"
                    );
                }
            }
        }
    }

    tracing::debug!(
        accepted = aggregation.accepted,
        skipped = aggregation.skipped,
        "statistics aggregated"
    );

    aggregation
}
