//! Converts upstream chart payloads into a canonical, time-ordered candle series.
//!
//! Payload shapes and field names differ between the KIS proxy, the mock
//! generator and older endpoints. Both are resolved through ordered tables:
//! the first matching shape wins, and each field takes the first key present.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::NormalizeError;
use crate::indicators::candle::Candle;

type ShapeExtractor = fn(&Value) -> Option<&Vec<Value>>;

/// Recognised payload shapes, tried in order.
const PAYLOAD_SHAPES: &[(&str, ShapeExtractor)] = &[
    ("array", bare_array),
    ("output", output_field),
    ("candleData", candle_data_field),
    ("data", data_field),
    ("data.output", data_output_field),
];

// Provider abbreviations (KIS) first, generic names after.
const DATE_KEYS: &[&str] = &["stck_bsop_date", "date", "timestamp", "time", "t"];
const OPEN_KEYS: &[&str] = &["stck_oprc", "open", "o"];
const HIGH_KEYS: &[&str] = &["stck_hgpr", "high", "h"];
const LOW_KEYS: &[&str] = &["stck_lwpr", "low", "l"];
const CLOSE_KEYS: &[&str] = &["stck_clpr", "close", "c"];
const VOLUME_KEYS: &[&str] = &["acml_vol", "volume", "v"];
const CHANGE_KEYS: &[&str] = &["prdy_vrss", "change"];
const CHANGE_RATE_KEYS: &[&str] = &["prdy_ctrt", "changeRate", "change_rate"];

/// Numbers in this range are `YYYYMMDD` dates, not epoch milliseconds.
const YYYYMMDD_MIN: i64 = 19_700_101;
const YYYYMMDD_MAX: i64 = 99_991_231;

fn bare_array(v: &Value) -> Option<&Vec<Value>> {
    v.as_array()
}

fn output_field(v: &Value) -> Option<&Vec<Value>> {
    v.get("output")?.as_array()
}

fn candle_data_field(v: &Value) -> Option<&Vec<Value>> {
    v.get("candleData")?.as_array()
}

fn data_field(v: &Value) -> Option<&Vec<Value>> {
    v.get("data")?.as_array()
}

fn data_output_field(v: &Value) -> Option<&Vec<Value>> {
    v.get("data")?.get("output")?.as_array()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    NotAnObject,
    InvalidDate,
    InvalidPrice(&'static str),
}

/// Normalizes a raw payload into candles sorted ascending by timestamp.
///
/// Invalid records are dropped; only an empty result is an error.
pub fn normalize(payload: &Value) -> Result<Vec<Candle>, NormalizeError> {
    let (shape, records) = resolve_shape(payload).ok_or(NormalizeError::InvalidShape)?;
    let (candles, dropped) = normalize_records(records);

    debug!(shape, kept = candles.len(), dropped, "normalized chart payload");

    if candles.is_empty() {
        return Err(NormalizeError::NoValidCandles { dropped });
    }
    Ok(candles)
}

/// Returns the name of the first matching shape and its record array.
pub fn resolve_shape(payload: &Value) -> Option<(&'static str, &Vec<Value>)> {
    PAYLOAD_SHAPES
        .iter()
        .find_map(|(name, extract)| extract(payload).map(|records| (*name, records)))
}

/// Converts records one by one, returning the sorted candles and the number
/// of records dropped.
pub fn normalize_records(records: &[Value]) -> (Vec<Candle>, usize) {
    let mut candles = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for (index, record) in records.iter().enumerate() {
        match parse_record(record) {
            Ok(candle) => candles.push(candle),
            Err(reason) => {
                dropped += 1;
                debug!(index, ?reason, "dropping chart record");
            }
        }
    }

    // Stable: equal timestamps keep their upstream order
    candles.sort_by_key(|c| c.get_timestamp());
    (candles, dropped)
}

fn parse_record(record: &Value) -> Result<Candle, DropReason> {
    let obj = record.as_object().ok_or(DropReason::NotAnObject)?;

    let timestamp = first_field(obj, DATE_KEYS)
        .and_then(parse_date)
        .ok_or(DropReason::InvalidDate)?;
    let open = price_field(obj, OPEN_KEYS, "open")?;
    let high = price_field(obj, HIGH_KEYS, "high")?;
    let low = price_field(obj, LOW_KEYS, "low")?;
    let close = price_field(obj, CLOSE_KEYS, "close")?;

    let mut candle = Candle::new(timestamp, open, high, low, close);
    if let Some(volume) = first_field(obj, VOLUME_KEYS)
        .and_then(parse_number)
        .filter(|v| *v >= 0.0)
    {
        candle = candle.with_volume(volume);
    }
    let change = first_field(obj, CHANGE_KEYS).and_then(parse_number);
    let change_rate = first_field(obj, CHANGE_RATE_KEYS).and_then(parse_number);
    Ok(candle.with_change(change, change_rate))
}

fn first_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn price_field(
    obj: &Map<String, Value>,
    keys: &[&str],
    name: &'static str,
) -> Result<f64, DropReason> {
    first_field(obj, keys)
        .and_then(parse_number)
        .filter(|price| *price > 0.0)
        .ok_or(DropReason::InvalidPrice(name))
}

/// Accepts JSON numbers and numeric strings (thousands separators allowed).
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Resolves a date field to epoch milliseconds (calendar dates at 00:00 UTC).
pub fn parse_date(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            let raw = match n.as_i64() {
                Some(i) => i,
                None => {
                    let f = n.as_f64()?;
                    if !f.is_finite() || f < 0.0 {
                        return None;
                    }
                    f.trunc() as i64
                }
            };
            parse_numeric_date(raw)
        }
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_numeric_date(raw: i64) -> Option<i64> {
    if (YYYYMMDD_MIN..=YYYYMMDD_MAX).contains(&raw) {
        let year = i32::try_from(raw / 10_000).ok()?;
        let month = u32::try_from(raw / 100 % 100).ok()?;
        let day = u32::try_from(raw % 100).ok()?;
        return NaiveDate::from_ymd_opt(year, month, day).and_then(midnight_millis);
    }
    (raw >= 0).then_some(raw)
}

fn parse_date_str(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        if s.len() == 8 {
            return NaiveDate::parse_from_str(s, "%Y%m%d")
                .ok()
                .and_then(midnight_millis);
        }
        return s.parse::<i64>().ok().and_then(parse_numeric_date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return midnight_millis(d);
        }
    }
    None
}

fn midnight_millis(date: NaiveDate) -> Option<i64> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}
