use serde_json::{Value, json};
use tussak_chart::market::normalizer::{normalize, resolve_shape};
use tussak_chart::market::providers::kis::{extract_price, unwrap_envelope};
use tussak_chart::market::{SeriesEntry, SeriesKey};
use tussak_chart::{NormalizeError, Period};

const JAN_3_2024: i64 = 1_704_240_000_000;
const DAY_MS: i64 = 86_400_000;

fn kis_daily_response() -> Value {
    // Proxy envelope around KIS daily chart output, newest first
    let body = r#"{
        "success": true,
        "data": {
            "output": [
                {"stck_bsop_date":"20240105","stck_oprc":"71000","stck_hgpr":"71500","stck_lwpr":"70500","stck_clpr":"71200","acml_vol":"12345678","prdy_vrss":"200","prdy_ctrt":"0.28"},
                {"stck_bsop_date":"20240104","stck_oprc":"70800","stck_hgpr":"71300","stck_lwpr":"70400","stck_clpr":"71000","acml_vol":"9876543","prdy_vrss":"1000","prdy_ctrt":"1.43"},
                {"stck_bsop_date":"20240103","stck_oprc":"70,500","stck_hgpr":"70,900","stck_lwpr":"69,800","stck_clpr":"70,000","acml_vol":"15,000,000","prdy_vrss":"-500","prdy_ctrt":"-0.71"}
            ]
        }
    }"#;
    serde_json::from_str(body).expect("KIS sample should be valid JSON")
}

#[test]
fn test_kis_daily_sample_normalizes_in_time_order() -> anyhow::Result<()> {
    let data = unwrap_envelope(kis_daily_response())?;
    let (shape, records) = resolve_shape(&data).expect("shape should resolve");
    assert_eq!(shape, "output");
    assert_eq!(records.len(), 3);

    let candles = normalize(&data)?;
    let stamps: Vec<i64> = candles.iter().map(|c| c.get_timestamp()).collect();
    assert_eq!(stamps, vec![JAN_3_2024, JAN_3_2024 + DAY_MS, JAN_3_2024 + 2 * DAY_MS]);

    let first = candles[0];
    assert_eq!(first.get_open(), 70_500.0);
    assert_eq!(first.get_close(), 70_000.0);
    assert_eq!(first.get_volume(), Some(15_000_000.0));
    assert_eq!(first.get_change_amount(), Some(-500.0));
    assert_eq!(first.get_change_rate(), Some(-0.71));
    assert!(!first.is_rising());
    Ok(())
}

#[test]
fn test_kis_sample_builds_series_entry() -> anyhow::Result<()> {
    let data = unwrap_envelope(kis_daily_response())?;
    let entry = SeriesEntry::build(SeriesKey::new("005930", Period::Daily), &data)?;

    assert_eq!(entry.len(), 3);
    assert_eq!(entry.last_close(), Some(71_200.0));
    assert_eq!(entry.max_volume, 15_000_000.0);
    assert!((entry.full_range.min - 69_800.0 * 0.98).abs() < 1e-6);
    assert!((entry.full_range.max - 71_500.0 * 1.02).abs() < 1e-6);

    let ma = entry.candles[2].get_moving_averages().expect("annotated");
    let expected = (70_000.0 + 71_000.0 + 71_200.0) / 3.0;
    assert!((ma.ma5 - expected).abs() < 1e-9);
    assert_eq!(ma.ma5, ma.ma20);
    assert_eq!(ma.ma20, ma.ma60);
    Ok(())
}

#[test]
fn test_mock_candle_data_sample() -> anyhow::Result<()> {
    let msg = r#"{"candleData":[
        {"date":"2024-01-15","open":235000,"high":238000,"low":233500,"close":237000,"volume":812345},
        {"date":"2024-01-16","open":237000,"high":239500,"low":236000,"close":236500,"volume":654321},
        {"date":"not a date","open":1,"high":1,"low":1,"close":1}
    ]}"#;
    let value: Value = serde_json::from_str(msg)?;
    let candles = normalize(&value)?;

    assert_eq!(candles.len(), 2);
    assert!(candles[0].is_rising());
    assert_eq!(candles[1].get_high(), 239_500.0);
    Ok(())
}

#[test]
fn test_failed_envelope_surfaces_message() {
    let body = json!({"success": false, "message": "유효하지 않은 종목코드"});
    let err = unwrap_envelope(body).unwrap_err();
    assert!(err.to_string().contains("유효하지 않은 종목코드"));
}

#[test]
fn test_unrecognised_and_empty_payloads() {
    assert_eq!(normalize(&json!({"rows": []})).unwrap_err(), NormalizeError::InvalidShape);
    assert_eq!(
        normalize(&json!({"output": [{"stck_bsop_date": "20240105", "stck_clpr": "0"}]}))
            .unwrap_err(),
        NormalizeError::NoValidCandles { dropped: 1 }
    );
}

#[test]
fn test_current_price_samples() {
    let kis = json!({"rt_cd": "0", "output": {"stck_prpr": "71,200", "prdy_vrss": "200"}});
    assert_eq!(extract_price(&kis), Some(71_200.0));

    let proxy = json!({"success": true, "data": {"currentPrice": 71300}});
    assert_eq!(extract_price(&proxy), Some(71_300.0));
}
