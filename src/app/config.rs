use std::collections::HashMap;
use std::path::Path;

use crate::app::AppError;
use crate::domain::billing_plan::{BillingPlan, parse_plan};

const PLAN_KEY_PREFIX: &str = "ENERGY_PLAN_";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ha_url: String,
    pub access_token: String,
    pub sensor_ids: Vec<String>,
    pub tariff_rate: f64,
    pub plans: Vec<BillingPlan>,
    pub receive_timeout_secs: u64,
    pub currency: String,
    pub replay_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Values from `path` win; anything the file leaves out falls back to the
    // process environment.
    pub fn from_env_file(path: &Path) -> Result<Self, AppError> {
        let entries = dotenvy::from_path_iter(path).map_err(|error| {
            AppError::config(format!("failed to read {}: {error}", path.display()))
        })?;
        let values = entries
            .collect::<Result<HashMap<String, String>, _>>()
            .map_err(|error| {
                AppError::config(format!("failed to parse {}: {error}", path.display()))
            })?;

        Self::from_lookup(|key| values.get(key).cloned().or_else(|| std::env::var(key).ok()))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ha_url = required(&lookup, "HA_URL")?;
        let access_token = required(&lookup, "HA_ACCESS_TOKEN")?;
        let sensor_ids: Vec<String> = required(&lookup, "HA_SENSOR_IDS")?
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        if sensor_ids.is_empty() {
            return Err(AppError::config("HA_SENSOR_IDS must list at least one sensor"));
        }

        let tariff_rate = parse_or_default(&lookup, "UNIVERSAL_TARIFF", 0.15_f64)?;
        if !tariff_rate.is_finite() || tariff_rate < 0.0 {
            return Err(AppError::config(
                "UNIVERSAL_TARIFF must be a non-negative number",
            ));
        }

        let receive_timeout_secs = parse_or_default(&lookup, "HA_RECEIVE_TIMEOUT_SECS", 30_u64)?;
        if receive_timeout_secs == 0 {
            return Err(AppError::config("HA_RECEIVE_TIMEOUT_SECS must be at least 1"));
        }

        Ok(Self {
            ha_url,
            access_token,
            sensor_ids,
            tariff_rate,
            plans: load_plans(&lookup)?,
            receive_timeout_secs,
            currency: optional(&lookup, "REPORT_CURRENCY").unwrap_or_else(|| "NIS".to_string()),
            replay_file: optional(&lookup, "HA_REPLAY_FILE"),
        })
    }
}

fn load_plans<F>(lookup: &F) -> Result<Vec<BillingPlan>, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut plans: Vec<BillingPlan> = Vec::new();

    for index in 1.. {
        let key = format!("{PLAN_KEY_PREFIX}{index}");
        let Some(descriptor) = optional(lookup, &key) else {
            break;
        };

        let plan = parse_plan(&descriptor).map_err(|source| AppError::Plan {
            key: key.clone(),
            source,
        })?;

        if plans.iter().any(|existing| existing.name == plan.name) {
            return Err(AppError::config(format!(
                "{key} reuses plan name `{}`",
                plan.name
            )));
        }
        if !(0.0..=1.0).contains(&plan.discount_rate) {
            tracing::warn!(
                plan = %plan.name,
                discount_rate = plan.discount_rate,
                "discount rate outside 0..=1 accepted as configured"
            );
        }

        plans.push(plan);
    }

    if plans.is_empty() {
        return Err(AppError::config(format!(
            "no energy plans defined, set {PLAN_KEY_PREFIX}1"
        )));
    }

    Ok(plans)
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| AppError::config(format!("{key} is required")))
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}
