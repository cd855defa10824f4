//! REST provider for the 투싹증권 API server, which proxies KIS (한국투자증권) data.
//!
//! Chart: `GET {base}{chart_path}/{symbol}?period={D|W|M|Y}` answering
//! `{"success": true, "data": {...}}`. Price: `GET {base}{price_path}/{symbol}`.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::ChartConfig;
use crate::error::{ChartError, ChartResult};
use crate::indicators::period::Period;
use crate::market::normalizer::parse_number;
use crate::market::source::ChartSource;

const USER_AGENT: &str = "tussak-chart/0.1";

#[derive(Debug, Clone)]
pub struct KisRestSource {
    http: Client,
    base_url: String,
    chart_path: String,
    price_path: String,
}

impl KisRestSource {
    pub fn new(config: &ChartConfig) -> ChartResult<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            chart_path: config.chart_path.clone(),
            price_path: config.price_path.clone(),
        })
    }

    pub fn from_env() -> ChartResult<Self> {
        Self::new(&ChartConfig::from_env())
    }

    pub fn chart_url(&self, symbol: &str) -> String {
        format!("{}{}/{}", self.base_url, self.chart_path, symbol)
    }

    pub fn price_url(&self, symbol: &str) -> String {
        format!("{}{}/{}", self.base_url, self.price_path, symbol)
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> ChartResult<Value> {
        debug!(%url, ?query, "GET");
        let resp = self.http.get(url).query(query).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        decode_body(status, &bytes)
    }
}

impl ChartSource for KisRestSource {
    fn name(&self) -> &'static str {
        "KIS"
    }

    async fn fetch_series(&self, symbol: &str, period: Period) -> ChartResult<Value> {
        let body = self
            .get_json(&self.chart_url(symbol), &[("period", period.code())])
            .await?;
        unwrap_envelope(body)
    }

    async fn fetch_price(&self, symbol: &str) -> ChartResult<f64> {
        let body = self.get_json(&self.price_url(symbol), &[]).await?;
        extract_price(&body)
            .ok_or_else(|| ChartError::Decode(format!("no current price for {symbol}")))
    }
}

/// Decodes a response body. Error statuses keep whatever message the body
/// carries; a successful status with a non-JSON body is a decode error.
fn decode_body(status: StatusCode, bytes: &[u8]) -> ChartResult<Value> {
    if !status.is_success() {
        let body: Value = serde_json::from_slice(bytes).unwrap_or(Value::Null);
        return Err(ChartError::Status {
            status: status.as_u16(),
            message: envelope_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
        });
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Unwraps `{success, data, message}`. Bodies without a `success` flag are
/// returned as-is for the normalizer to sniff.
pub fn unwrap_envelope(body: Value) -> ChartResult<Value> {
    match body.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(body.get("data").cloned().unwrap_or(Value::Null)),
        Some(false) => Err(ChartError::Api(
            envelope_message(&body).unwrap_or_else(|| "request failed".to_string()),
        )),
        None => Ok(body),
    }
}

fn envelope_message(body: &Value) -> Option<String> {
    ["message", "error", "msg1"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Accepts `{currentPrice}`, `{data: {currentPrice}}`, `{price}`,
/// `{output: {stck_prpr}}` or a bare number.
pub fn extract_price(body: &Value) -> Option<f64> {
    let candidates = [
        Some(body),
        body.get("currentPrice"),
        body.get("price"),
        body.get("data").and_then(|d| d.get("currentPrice")),
        body.get("output").and_then(|o| o.get("stck_prpr")),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(parse_number)
        .find(|price| *price > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urls_follow_config() {
        let config = ChartConfig {
            api_base_url: "http://api.test/".to_string(),
            ..ChartConfig::default()
        };
        let source = KisRestSource::new(&config).unwrap();
        assert_eq!(source.chart_url("005930"), "http://api.test/api/stock/kis-chart/005930");
        assert_eq!(source.price_url("005930"), "http://api.test/api/stock/current-price/005930");
        assert_eq!(source.name(), "KIS");
    }

    #[test]
    fn test_unwrap_envelope() {
        let ok = json!({"success": true, "data": {"candleData": []}});
        assert_eq!(unwrap_envelope(ok).unwrap(), json!({"candleData": []}));

        let failed = json!({"success": false, "message": "종목 없음"});
        match unwrap_envelope(failed) {
            Err(ChartError::Api(msg)) => assert_eq!(msg, "종목 없음"),
            other => panic!("expected Api error, got {other:?}"),
        }

        let bare = json!([{"date": "20240102"}]);
        assert_eq!(unwrap_envelope(bare.clone()).unwrap(), bare);
    }

    #[test]
    fn test_non_json_success_body_is_a_decode_error() {
        match decode_body(StatusCode::OK, b"<html>maintenance</html>") {
            Err(ChartError::Decode(_)) => {}
            other => panic!("expected Decode error, got {other:?}"),
        }
        assert_eq!(
            decode_body(StatusCode::OK, br#"{"success":true}"#).unwrap(),
            json!({"success": true})
        );
    }

    #[test]
    fn test_error_status_keeps_body_message() {
        match decode_body(StatusCode::NOT_FOUND, br#"{"message":"no such code"}"#) {
            Err(ChartError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "no such code");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
        match decode_body(StatusCode::BAD_GATEWAY, b"upstream down") {
            Err(ChartError::Status { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_price_shapes() {
        assert_eq!(extract_price(&json!({"currentPrice": 71500})), Some(71500.0));
        assert_eq!(extract_price(&json!({"data": {"currentPrice": "71,600"}})), Some(71600.0));
        assert_eq!(extract_price(&json!({"price": 10.5})), Some(10.5));
        assert_eq!(extract_price(&json!({"output": {"stck_prpr": "70000"}})), Some(70000.0));
        assert_eq!(extract_price(&json!(235000)), Some(235000.0));
        assert_eq!(extract_price(&json!({"currentPrice": 0})), None);
        assert_eq!(extract_price(&json!({})), None);
    }
}
