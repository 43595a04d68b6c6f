use std::collections::BTreeSet;

use chrono::Weekday;

use crate::domain::error::{FormatError, PlanField};

pub const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

const FIELD_SEPARATOR: char = '|';
const LIST_SEPARATOR: char = ',';
const RANGE_SEPARATOR: char = '-';
const MAX_HOUR: u32 = 23;

#[derive(Debug, Clone, PartialEq)]
pub struct BillingPlan {
    pub name: String,
    pub hours: BTreeSet<u32>,
    pub days: Vec<Weekday>,
    pub discount_rate: f64,
}

impl BillingPlan {
    pub fn applies_to(&self, day: Weekday, hour: u32) -> bool {
        self.days.contains(&day) && self.hours.contains(&hour)
    }
}

pub fn parse_plan(descriptor: &str) -> Result<BillingPlan, FormatError> {
    let fields: Vec<&str> = descriptor.split(FIELD_SEPARATOR).collect();
    let [name, hour_spec, day_spec, discount] = fields.as_slice() else {
        return Err(FormatError::PlanFieldCount {
            descriptor: descriptor.to_string(),
            found: fields.len(),
        });
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(FormatError::plan_field(
            descriptor,
            PlanField::Name,
            "name must not be empty",
        ));
    }

    let hours = parse_hour_range(hour_spec)
        .map_err(|reason| FormatError::plan_field(name, PlanField::Hours, reason))?;
    let days = parse_day_range(day_spec)
        .map_err(|reason| FormatError::plan_field(name, PlanField::Days, reason))?;
    let discount_rate = parse_discount(discount)
        .map_err(|reason| FormatError::plan_field(name, PlanField::Discount, reason))?;

    Ok(BillingPlan {
        name: name.to_string(),
        hours,
        days,
        discount_rate,
    })
}

// Hours never wrap: `23-1` is rejected rather than read as overnight.
pub fn parse_hour_range(spec: &str) -> Result<BTreeSet<u32>, String> {
    let mut hours = BTreeSet::new();

    for token in spec.split(LIST_SEPARATOR).map(str::trim) {
        match token.split_once(RANGE_SEPARATOR) {
            Some((start, end)) => {
                let start = parse_hour(start)?;
                let end = parse_hour(end)?;
                if end < start {
                    return Err(format!("range `{token}` ends before it starts"));
                }
                hours.extend(start..=end);
            }
            None => {
                hours.insert(parse_hour(token)?);
            }
        }
    }

    Ok(hours)
}

pub fn parse_day_range(spec: &str) -> Result<Vec<Weekday>, String> {
    let mut days = Vec::new();

    for token in spec.split(LIST_SEPARATOR).map(str::trim) {
        let covered: Vec<Weekday> = match token.split_once(RANGE_SEPARATOR) {
            Some((start, end)) => {
                let start = week_index(parse_weekday(start)?);
                let end = week_index(parse_weekday(end)?);
                if start <= end {
                    WEEK[start..=end].to_vec()
                } else {
                    WEEK[start..].iter().chain(&WEEK[..=end]).copied().collect()
                }
            }
            None => vec![parse_weekday(token)?],
        };

        for day in covered {
            if !days.contains(&day) {
                days.push(day);
            }
        }
    }

    Ok(days)
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

pub fn week_index(day: Weekday) -> usize {
    day.num_days_from_sunday() as usize
}

fn parse_weekday(token: &str) -> Result<Weekday, String> {
    let token = token.trim();
    WEEK.iter()
        .copied()
        .find(|day| weekday_name(*day).eq_ignore_ascii_case(token))
        .ok_or_else(|| format!("unknown weekday `{token}`"))
}

fn parse_hour(token: &str) -> Result<u32, String> {
    let token = token.trim();
    let hour = token
        .parse::<u32>()
        .map_err(|_| format!("`{token}` is not an hour"))?;
    if hour > MAX_HOUR {
        return Err(format!("hour {hour} is out of range"));
    }
    Ok(hour)
}

fn parse_discount(token: &str) -> Result<f64, String> {
    let token = token.trim();
    let rate = token
        .parse::<f64>()
        .map_err(|_| format!("`{token}` is not a number"))?;
    if !rate.is_finite() {
        return Err(format!("`{token}` is not a finite number"));
    }
    Ok(rate)
}
