use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormatError {
    #[error("unexpected timestamp format: {0}")]
    Timestamp(String),
    #[error("plan descriptor must have 4 `|`-separated fields, found {found}: {descriptor}")]
    PlanFieldCount { descriptor: String, found: usize },
    #[error("plan `{plan}` has an invalid {field}: {reason}")]
    PlanField {
        plan: String,
        field: PlanField,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanField {
    Name,
    Hours,
    Days,
    Discount,
}

impl std::fmt::Display for PlanField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Name => "name",
            Self::Hours => "hour spec",
            Self::Days => "day spec",
            Self::Discount => "discount rate",
        };
        f.write_str(label)
    }
}

impl FormatError {
    pub fn plan_field<R: std::fmt::Display>(plan: &str, field: PlanField, reason: R) -> Self {
        Self::PlanField {
            plan: plan.to_string(),
            field,
            reason: reason.to_string(),
        }
    }
}
