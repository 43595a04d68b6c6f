use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const AUTH_REQUIRED: &str = "auth_required";
pub const AUTH_OK: &str = "auth_ok";
pub const STATISTICS_DURING_PERIOD: &str = "recorder/statistics_during_period";

#[derive(Debug, Serialize)]
pub struct AuthMessage<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub access_token: &'a str,
}

impl<'a> AuthMessage<'a> {
    pub fn new(access_token: &'a str) -> Self {
        Self {
            kind: "auth",
            access_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnergyUnits {
    pub energy: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatisticsRequest<'a> {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub start_time: String,
    pub end_time: String,
    pub statistic_ids: &'a [String],
    pub period: &'static str,
    pub types: [&'static str; 1],
    pub units: EnergyUnits,
}

impl<'a> StatisticsRequest<'a> {
    pub fn hourly_change(
        id: u64,
        statistic_ids: &'a [String],
        start_time: String,
        end_time: String,
    ) -> Self {
        Self {
            id,
            kind: STATISTICS_DURING_PERIOD,
            start_time,
            end_time,
            statistic_ids,
            period: "hour",
            types: ["change"],
            units: EnergyUnits { energy: "kWh" },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<ErrorBody>,
    #[serde(default)]
    pub result: Option<Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AuthMessage, InboundMessage, StatisticsRequest};

    #[test]
    fn serializes_statistics_request() {
        let sensors = vec!["sensor.grid_import".to_string()];
        let request = StatisticsRequest::hourly_change(
            3,
            &sensors,
            "2024-05-01T00:00:00".to_string(),
            "2024-05-31T23:59:59".to_string(),
        );

        let value = serde_json::to_value(&request).expect("request should serialize");

        assert_eq!(
            value,
            json!({
                "id": 3,
                "type": "recorder/statistics_during_period",
                "start_time": "2024-05-01T00:00:00",
                "end_time": "2024-05-31T23:59:59",
                "statistic_ids": ["sensor.grid_import"],
                "period": "hour",
                "types": ["change"],
                "units": {"energy": "kWh"}
            })
        );
    }

    #[test]
    fn serializes_auth_message() {
        let value = serde_json::to_value(AuthMessage::new("token")).expect("should serialize");
        assert_eq!(value, json!({"type": "auth", "access_token": "token"}));
    }

    #[test]
    fn parses_failed_result_frame() {
        let message: InboundMessage = serde_json::from_value(json!({
            "id": 1,
            "type": "result",
            "success": false,
            "error": {"code": "invalid_format", "message": "bad statistic id"}
        }))
        .expect("frame should parse");

        assert!(!message.success);
        assert_eq!(
            message.error.and_then(|error| error.message),
            Some("bad statistic id".to_string())
        );
    }

    #[test]
    fn defaults_missing_fields() {
        let message: InboundMessage =
            serde_json::from_value(json!({"type": "auth_ok"})).expect("frame should parse");

        assert_eq!(message.kind, "auth_ok");
        assert_eq!(message.id, None);
        assert!(!message.success);
    }
}
