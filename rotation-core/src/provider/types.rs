// =================================================================
// provider/types.rs - Data Structures
// =================================================================

use serde::Deserialize;
use std::collections::BTreeMap;

/// Alpha Vantage TIME_SERIES_MONTHLY_ADJUSTED payload.
///
/// Throttled and failed calls still answer HTTP 200, with one of the message
/// fields set instead of the series.
#[derive(Debug, Deserialize)]
pub struct MonthlyAdjustedResponse {
    /// Bars keyed by month-end date (YYYY-MM-DD)
    #[serde(rename = "Monthly Adjusted Time Series")]
    pub series: Option<BTreeMap<String, MonthlyAdjustedBar>>,

    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,

    /// Call frequency warning
    #[serde(rename = "Note")]
    pub note: Option<String>,

    /// Daily quota or premium endpoint notice
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

/// One monthly bar; only the adjusted close is used
#[derive(Debug, Deserialize, Clone)]
pub struct MonthlyAdjustedBar {
    #[serde(rename = "5. adjusted close")]
    pub adjusted_close: String,
}
