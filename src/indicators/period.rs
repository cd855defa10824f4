use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

/// Korea Standard Time, the exchange's local clock.
pub const KST_OFFSET_SECS: i32 = 9 * 60 * 60;

/// Candle granularity requested from the upstream chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Daily,   // 일
    Weekly,  // 주
    Monthly, // 월
    Yearly,  // 년
}

/// Price/volume noise scale, used by the simulated source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityHint {
    pub price: f64,
    pub volume: f64,
}

/// Per-period settings consumed by both the view window and data generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodProfile {
    pub visible_count: usize,
    pub volatility: VolatilityHint,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Daily, Period::Weekly, Period::Monthly, Period::Yearly];

    /// Upstream period code (`D`, `W`, `M`, `Y`).
    pub fn code(&self) -> &'static str {
        match self {
            Period::Daily => "D",
            Period::Weekly => "W",
            Period::Monthly => "M",
            Period::Yearly => "Y",
        }
    }

    /// Selector label shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Period::Daily => "일",
            Period::Weekly => "주",
            Period::Monthly => "월",
            Period::Yearly => "년",
        }
    }

    pub fn profile(&self) -> PeriodProfile {
        match self {
            Period::Daily => PeriodProfile {
                visible_count: 80,
                volatility: VolatilityHint { price: 2000.0, volume: 0.1 },
            },
            Period::Weekly => PeriodProfile {
                visible_count: 60,
                volatility: VolatilityHint { price: 5000.0, volume: 0.05 },
            },
            Period::Monthly => PeriodProfile {
                visible_count: 40,
                volatility: VolatilityHint { price: 8000.0, volume: 0.1 },
            },
            Period::Yearly => PeriodProfile {
                visible_count: 20,
                volatility: VolatilityHint { price: 12000.0, volume: 0.3 },
            },
        }
    }

    /// Nominal spacing between consecutive candles, in milliseconds.
    pub fn step_millis(&self) -> i64 {
        const DAY: i64 = 24 * 60 * 60 * 1000;
        match self {
            Period::Daily => DAY,
            Period::Weekly => 7 * DAY,
            Period::Monthly => 30 * DAY,
            Period::Yearly => 365 * DAY,
        }
    }

    /// Axis label for a candle timestamp, in exchange-local time.
    pub fn format_label(&self, timestamp_ms: i64) -> String {
        let Some(utc) = DateTime::from_timestamp_millis(timestamp_ms) else {
            return String::new();
        };
        let Some(kst) = FixedOffset::east_opt(KST_OFFSET_SECS) else {
            return String::new();
        };
        let local = utc.with_timezone(&kst);
        match self {
            Period::Daily | Period::Weekly => local.format("%m/%d").to_string(),
            Period::Monthly => local.format("%Y/%m").to_string(),
            Period::Yearly => local.format("%Y").to_string(),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "D" | "d" | "일" | "daily" | "day" => Ok(Period::Daily),
            "W" | "w" | "주" | "weekly" | "week" => Ok(Period::Weekly),
            "M" | "m" | "월" | "monthly" | "month" => Ok(Period::Monthly),
            "Y" | "y" | "년" | "yearly" | "year" => Ok(Period::Yearly),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_labels_parse_back() {
        for period in Period::ALL {
            assert_eq!(period.code().parse::<Period>(), Ok(period));
            assert_eq!(period.label().parse::<Period>(), Ok(period));
        }
        assert_eq!("weekly".parse::<Period>(), Ok(Period::Weekly));
        assert!("1개월".parse::<Period>().is_err());
    }

    #[test]
    fn test_profile_table_is_within_default_limits() {
        for period in Period::ALL {
            let visible = period.profile().visible_count;
            assert!((20..=150).contains(&visible), "{period}: {visible}");
        }
        assert_eq!(Period::Daily.profile().visible_count, 80);
    }

    #[test]
    fn test_labels_use_exchange_time() {
        // 2024-01-02T15:30:00Z is already 2024-01-03 in Seoul
        let ts = 1_704_209_400_000;
        assert_eq!(Period::Daily.format_label(ts), "01/03");
        assert_eq!(Period::Monthly.format_label(ts), "2024/01");
        assert_eq!(Period::Yearly.format_label(ts), "2024");
    }
}
