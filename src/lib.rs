//! Client-side core of the retail back-office dashboard.
//!
//! The two pieces with real behaviour are the rule-based sales
//! [`forecast`]er behind the sales-overview chart and the [`lazy_image`]
//! loader (with its FIFO [`cache`]) behind the product tables. The rest are
//! the typed records, stock rules, offline mirror and application context
//! that feed them.

use log::warn;
use wasm_bindgen::prelude::*;

pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod forecast;
pub mod inventory;
pub mod lazy_image;
pub mod models;
pub mod session;
pub mod storage;
pub mod utils;
pub mod viewport;

pub use cache::ImageCache;
pub use forecast::{forecast, forecast_with, ForecastConfig, ForecastPoint};
pub use lazy_image::{DeferredImage, ImageFetcher, ImageLoadError, ImageState, ImageTarget, LazyImageLoader};
pub use session::AppContext;

/// Daily totals from loosely typed values: each non-numeric entry counts
/// as `0` on its own instead of spoiling the whole history.
fn lenient_history(values: &[serde_json::Value]) -> Vec<f64> {
    values
        .iter()
        .map(|v| models::lenient::as_f64(v).unwrap_or(0.0))
        .collect()
}

/// JavaScript entry point for the forecaster.
///
/// Accepts an array of daily totals (oldest first) and returns an array of
/// `horizon` projections. Entries that are not numbers count as zero;
/// anything that is not an array is treated as an empty history.
#[wasm_bindgen(js_name = ruleBasedForecast)]
pub fn rule_based_forecast(values: JsValue, horizon: usize) -> JsValue {
    let raw: Vec<serde_json::Value> = match serde_wasm_bindgen::from_value(values) {
        Ok(v) => v,
        Err(e) => {
            warn!("Forecast input is not an array: {}", e);
            Vec::new()
        }
    };
    serde_wasm_bindgen::to_value(&forecast(&lenient_history(&raw), horizon)).unwrap_or(JsValue::NULL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stray_values_count_as_zero_individually() {
        let raw = json!([10, null, 10, "12", "n/a", true, 10]);
        let history = lenient_history(raw.as_array().unwrap());
        assert_eq!(history, vec![10.0, 0.0, 10.0, 12.0, 0.0, 1.0, 10.0]);

        let messy = json!([10, null, 10, 10, null, 10, 10]);
        let clean = [10.0, 0.0, 10.0, 10.0, 0.0, 10.0, 10.0];
        assert_eq!(
            forecast(&lenient_history(messy.as_array().unwrap()), 2),
            forecast(&clean, 2)
        );
    }
}
