use thiserror::Error;

use crate::domain::aggregation::{DayHourTotals, HourlyTotals};
use crate::domain::billing_plan::BillingPlan;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TariffError {
    #[error("no billing plans configured")]
    NoPlans,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanDiscount {
    pub plan: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanDiscounts(Vec<PlanDiscount>);

impl PlanDiscounts {
    pub fn iter(&self) -> impl Iterator<Item = &PlanDiscount> {
        self.0.iter()
    }

    #[cfg(test)]
    pub fn get(&self, plan: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|entry| entry.plan == plan)
            .map(|entry| entry.amount)
    }

    // Highest discount. On an exact tie the plan declared first wins.
    pub fn best(&self) -> Option<&PlanDiscount> {
        self.0.iter().fold(None, |best, entry| match best {
            Some(current) if current.amount >= entry.amount => Some(current),
            _ => Some(entry),
        })
    }
}

pub fn plan_discount(consumption: &DayHourTotals, plan: &BillingPlan, tariff_rate: f64) -> f64 {
    consumption
        .cells()
        .filter(|(day, hour, _)| plan.applies_to(*day, *hour))
        .map(|(_, _, kwh)| kwh * tariff_rate * plan.discount_rate)
        .sum()
}

pub fn evaluate(
    consumption: &DayHourTotals,
    plans: &[BillingPlan],
    tariff_rate: f64,
) -> Result<PlanDiscounts, TariffError> {
    if plans.is_empty() {
        return Err(TariffError::NoPlans);
    }

    Ok(PlanDiscounts(
        plans
            .iter()
            .map(|plan| PlanDiscount {
                plan: plan.name.clone(),
                amount: plan_discount(consumption, plan, tariff_rate),
            })
            .collect(),
    ))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostSummary {
    pub total_kwh: f64,
    pub cost_before_discount: f64,
    pub best_plan: String,
    pub best_discount: f64,
    pub cost_after_discount: f64,
}

impl CostSummary {
    pub fn new(
        hourly: &HourlyTotals,
        discounts: &PlanDiscounts,
        tariff_rate: f64,
    ) -> Result<Self, TariffError> {
        let best = discounts.best().ok_or(TariffError::NoPlans)?;
        let total_kwh = hourly.total();
        let cost_before_discount = total_kwh * tariff_rate;

        Ok(Self {
            total_kwh,
            cost_before_discount,
            best_plan: best.plan.clone(),
            best_discount: best.amount,
            cost_after_discount: cost_before_discount - best.amount,
        })
    }
}
