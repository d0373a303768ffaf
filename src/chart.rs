//! JavaScript interop for the Chart.js sales-overview chart.
//! Provides Rust bindings to chart helper functions defined in chart_helpers.js.

use backoffice_dashboard::dashboard::SalesChartSeries;
use log::warn;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/chart_helpers.js")]
extern "C" {
    #[wasm_bindgen(js_name = initSalesChart)]
    pub fn init_sales_chart(canvas_id: &str);

    #[wasm_bindgen(js_name = updateSalesChart)]
    fn update_sales_chart(series: JsValue);
}

/// Push a new set of series to the chart. Missing values go over as `null`
/// so Chart.js leaves the slot empty instead of drawing a zero bar.
pub fn render_sales_series(series: &SalesChartSeries) {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_missing_as_null(true);
    match series.serialize(&serializer) {
        Ok(value) => update_sales_chart(value),
        Err(e) => warn!("Could not hand sales series to the chart: {}", e),
    }
}
