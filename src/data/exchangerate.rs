//! exchangerate.host integration (`timeframe` endpoint).

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::config::ProviderConfig;
use crate::data::QuoteSource;
use crate::domain::{DateRange, parse_date, quotes_of};
use crate::error::AppError;

pub const TIMEFRAME_ENDPOINT: &str = "timeframe";

pub struct ExchangeRateClient {
    client: Client,
    config: ProviderConfig,
}

impl ExchangeRateClient {
    pub fn new(config: ProviderConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint_url(&self) -> String {
        format!("{}/{TIMEFRAME_ENDPOINT}", self.config.base_url)
    }
}

impl QuoteSource for ExchangeRateClient {
    fn fetch_timeframe(&self, range: DateRange) -> Result<Map<String, Value>, AppError> {
        let resp = self
            .client
            .get(self.endpoint_url())
            .query(&[
                ("access_key", self.config.access_key.as_str()),
                ("start_date", &range.start_param()),
                ("end_date", &range.end_param()),
            ])
            .send()
            // The URL carries the access key; never let it reach the logs.
            .map_err(|e| AppError::remote(TIMEFRAME_ENDPOINT, range, e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| {
                AppError::remote(TIMEFRAME_ENDPOINT, range, format!("failed to read body: {}", e.without_url()))
            })?;

        interpret_response(status, &body, range)
    }
}

/// Turn a raw HTTP outcome into the provider payload, or a fatal error.
///
/// The provider answers quota and credential problems with HTTP 200 and
/// `"success": false`, so the status code alone is not enough.
pub fn interpret_response(status: StatusCode, body: &str, range: DateRange) -> Result<Map<String, Value>, AppError> {
    if !status.is_success() {
        return Err(AppError::remote(
            TIMEFRAME_ENDPOINT,
            range,
            format!("status {status}: {}", excerpt(body)),
        ));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::remote(TIMEFRAME_ENDPOINT, range, format!("failed to parse response: {e}")))?;

    let Value::Object(payload) = value else {
        return Err(AppError::remote(TIMEFRAME_ENDPOINT, range, "response is not a JSON object"));
    };

    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(AppError::remote(TIMEFRAME_ENDPOINT, range, provider_error(&payload)));
    }

    let quotes = quotes_of(&payload)
        .ok_or_else(|| AppError::remote(TIMEFRAME_ENDPOINT, range, "response has no `quotes` object"))?;

    for key in quotes.keys() {
        if let Some(day) = parse_date(key) {
            if !range.contains(day) {
                return Err(AppError::remote(
                    TIMEFRAME_ENDPOINT,
                    range,
                    format!("quote date {day} is outside the requested range"),
                ));
            }
        }
    }

    Ok(payload)
}

fn provider_error(payload: &Map<String, Value>) -> String {
    let Some(error) = payload.get("error") else {
        return "provider reported success=false".to_string();
    };
    let code = error.get("code").map(|c| c.to_string());
    let kind = error.get("type").and_then(Value::as_str);
    let info = error.get("info").and_then(Value::as_str);

    let mut parts = vec!["provider reported success=false".to_string()];
    if let Some(code) = code {
        parts.push(format!("code {code}"));
    }
    if let Some(kind) = kind {
        parts.push(kind.to_string());
    }
    if let Some(info) = info {
        parts.push(info.to_string());
    }
    parts.join(": ")
}

fn excerpt(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_2024() -> DateRange {
        DateRange::full_year(2024).unwrap()
    }

    #[test]
    fn successful_body_is_passed_through() {
        let body = r#"{
            "success": true,
            "timeframe": true,
            "start_date": "2024-01-01",
            "end_date": "2024-12-31",
            "source": "USD",
            "quotes": {"2024-01-01": {"USDEUR": 0.905}, "2024-01-02": {"USDEUR": 0.912}}
        }"#;
        let payload = interpret_response(StatusCode::OK, body, range_2024()).unwrap();
        assert_eq!(payload.get("source").and_then(Value::as_str), Some("USD"));
        assert_eq!(quotes_of(&payload).unwrap().len(), 2);
    }

    #[test]
    fn non_success_status_is_fatal() {
        let err = interpret_response(StatusCode::TOO_MANY_REQUESTS, "slow down", range_2024()).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, AppError::RemoteRequest { .. }));
        assert!(msg.contains("429"), "{msg}");
        assert!(msg.contains("2024-01-01..=2024-12-31"), "{msg}");
    }

    #[test]
    fn provider_reported_failure_is_fatal_even_with_http_200() {
        let body = r#"{"success": false, "error": {"code": 101, "type": "invalid_access_key", "info": "You have not supplied a valid API Access Key."}}"#;
        let err = interpret_response(StatusCode::OK, body, range_2024()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("invalid_access_key"), "{msg}");
        assert!(msg.contains("code 101"), "{msg}");
    }

    #[test]
    fn missing_quotes_or_non_object_body_is_fatal() {
        assert!(interpret_response(StatusCode::OK, r#"{"success": true}"#, range_2024()).is_err());
        assert!(interpret_response(StatusCode::OK, "[1, 2]", range_2024()).is_err());
        assert!(interpret_response(StatusCode::OK, "not json", range_2024()).is_err());
    }

    #[test]
    fn quotes_outside_the_requested_range_are_rejected() {
        let body = r#"{"success": true, "quotes": {"2023-12-31": {"USDEUR": 0.9}}}"#;
        let err = interpret_response(StatusCode::OK, body, range_2024()).unwrap_err();
        assert!(err.to_string().contains("2023-12-31"));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let err = interpret_response(StatusCode::BAD_GATEWAY, &body, range_2024()).unwrap_err();
        assert!(err.to_string().len() < 400);
    }
}
