use std::fmt;

use crate::domain::aggregation::HourlyTotals;
use crate::domain::report_window::ReportWindow;
use crate::domain::tariff::{CostSummary, PlanDiscounts};

const CHART_WIDTH: usize = 50;
const BAR: char = '█';

#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub window: ReportWindow,
    pub hourly: &'a HourlyTotals,
    pub discounts: &'a PlanDiscounts,
    pub summary: &'a CostSummary,
    pub currency: &'a str,
}

impl Report<'_> {
    fn write_chart(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max = self.hourly.max();
        let scale = if max > 0.0 { CHART_WIDTH as f64 / max } else { 1.0 };

        writeln!(f)?;
        writeln!(f, "Hourly consumption (kWh):")?;
        writeln!(f, "Hour |   kWh | Chart")?;
        writeln!(f, "{}", "-".repeat(11 + CHART_WIDTH))?;

        for (hour, kwh) in self.hourly.iter() {
            // Negative cells saturate to an empty bar.
            let width = (kwh * scale) as usize;
            let bar: String = std::iter::repeat_n(BAR, width).collect();
            writeln!(f, "{hour:02}:00 | {kwh:5.2} | {bar}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Energy consumption from {} to {}",
            self.window.start.date(),
            self.window.end.date()
        )?;
        writeln!(f, "Number of days: {}", self.window.day_count())?;

        self.write_chart(f)?;

        writeln!(f)?;
        writeln!(f, "Total energy consumption: {:.3} kWh", self.summary.total_kwh)?;

        writeln!(f)?;
        writeln!(f, "Discount per plan ({}):", self.currency)?;
        for discount in self.discounts.iter() {
            if discount.plan == self.summary.best_plan {
                writeln!(f, "{}: {:.2} (Best)", discount.plan, discount.amount)?;
            } else {
                writeln!(f, "{}: {:.2}", discount.plan, discount.amount)?;
            }
        }

        writeln!(
            f,
            "Total cost before discount: {:.2} {}",
            self.summary.cost_before_discount, self.currency
        )?;
        writeln!(
            f,
            "Best discount applied: {:.2} {}",
            self.summary.best_discount, self.currency
        )?;
        write!(
            f,
            "Total cost after best discount: {:.2} {}",
            self.summary.cost_after_discount, self.currency
        )
    }
}
