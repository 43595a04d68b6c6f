pub mod aggregation;
pub mod billing_plan;
pub mod error;
pub mod report_window;
pub mod session_state;
pub mod tariff;
pub mod timestamp;
