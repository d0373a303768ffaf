//! Typed records for the back-office data the dashboard consumes.
//!
//! The REST API is loose about shapes: numbers arrive as strings, fields go
//! missing, and names vary between snake_case and camelCase. All of that is
//! absorbed here at deserialization time so the rest of the crate only sees
//! well-formed values.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Lenient field parsers used by the `deserialize_with` attributes below.
pub(crate) mod lenient {
    use super::*;
    use serde_json::Value;

    /// Finite number behind a JSON number, numeric string or boolean.
    pub(crate) fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }

    /// Number, numeric string, or anything else as `0`.
    pub fn number<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
        Ok(as_f64(&Value::deserialize(de)?).unwrap_or(0.0))
    }

    pub fn integer<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
        Ok(as_f64(&Value::deserialize(de)?)
            .map(|v| v.trunc() as i64)
            .unwrap_or(0))
    }

    /// `null` as an empty string.
    pub fn text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// Empty strings collapse to `None`.
    pub fn optional_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn truthy<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => !s.is_empty() && s != "false" && s != "0",
            _ => false,
        })
    }

    /// RFC 3339 timestamp or a bare `YYYY-MM-DD` (taken as UTC midnight);
    /// anything unparseable is `None`.
    pub fn timestamp<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
        let Value::String(raw) = Value::deserialize(de)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts));
        }
        Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().fixed_offset()))
    }

    /// Calendar day from an RFC 3339 timestamp or anything starting with
    /// `YYYY-MM-DD` (e.g. a local timestamp without offset).
    pub fn date<'de, D: Deserializer<'de>>(de: D) -> Result<Option<NaiveDate>, D::Error> {
        let Value::String(raw) = Value::deserialize(de)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.date_naive()));
        }
        Ok(raw
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()))
    }

    pub fn strings<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            _ => Vec::new(),
        })
    }
}

fn default_threshold() -> f64 {
    crate::config::DEFAULT_LOW_STOCK_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "lenient::integer")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub stock: i64,
    #[serde(
        default = "default_threshold",
        alias = "lowStockThreshold",
        deserialize_with = "lenient::number"
    )]
    pub low_stock_threshold: f64,
    #[serde(default, alias = "available_for_sale", deserialize_with = "lenient::truthy")]
    pub available: bool,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub placeholder_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Approved,
    Completed,
    Declined,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Approved => "Approved",
            OrderStatus::Completed => "Completed",
            OrderStatus::Declined => "Declined",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, deserialize_with = "lenient::integer")]
    pub id: i64,
    #[serde(default, alias = "displayId", deserialize_with = "lenient::optional_text")]
    pub order_code: Option<String>,
    #[serde(default, alias = "name", deserialize_with = "lenient::text")]
    pub customer: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub contact: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub address: String,
    #[serde(default, alias = "totalPrice", deserialize_with = "lenient::number")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub discount: f64,
    #[serde(default, alias = "netTotal", deserialize_with = "lenient::number")]
    pub net_total: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, rename = "type", deserialize_with = "lenient::optional_text")]
    pub channel: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub payment: Option<String>,
    #[serde(default, rename = "ref", deserialize_with = "lenient::optional_text")]
    pub reference: Option<String>,
    #[serde(
        default,
        alias = "createdAt",
        alias = "date",
        deserialize_with = "lenient::timestamp"
    )]
    pub created_at: Option<DateTime<FixedOffset>>,
}

impl Order {
    /// Human-facing order number: the server's code, else `ORD{id}`.
    pub fn display_id(&self) -> String {
        self.order_code
            .clone()
            .unwrap_or_else(|| format!("ORD{}", self.id))
    }

    /// Calendar day the order was placed, in its own offset.
    pub fn placed_on(&self) -> Option<NaiveDate> {
        self.created_at.map(|ts| ts.date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(default, deserialize_with = "lenient::integer")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub contact: String,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub items: Vec<String>,
    #[serde(default, alias = "lastDelivery", deserialize_with = "lenient::date")]
    pub last_delivery: Option<NaiveDate>,
}

/// One day of the sales-overview endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesDay {
    /// `None` when the server sent no usable date.
    #[serde(default, deserialize_with = "lenient::date")]
    pub day: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub online: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub instore: f64,
}

impl SalesDay {
    /// Combined total the forecaster works from.
    pub fn total(&self) -> f64 {
        self.online + self.instore
    }
}

/// Last days of sales, oldest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesOverview {
    #[serde(default)]
    pub days: Vec<SalesDay>,
}

impl SalesOverview {
    pub fn daily_totals(&self) -> Vec<f64> {
        self.days.iter().map(SalesDay::total).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardMetrics {
    #[serde(default, alias = "totalSales", deserialize_with = "lenient::number")]
    pub total_sales: f64,
    #[serde(default, alias = "totalOrders", deserialize_with = "lenient::integer")]
    pub total_orders: i64,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub customers: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub email: Option<String>,
}

impl AuthUser {
    /// Name shown in the header: name, else email, else "Admin".
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Admin")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, alias = "totalPages", deserialize_with = "lenient::integer")]
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrdersResponse {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuppliersResponse {
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LowStockResponse {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub total: i64,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub out_of_stock: i64,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub low_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, deserialize_with = "lenient::text")]
    pub token: String,
    #[serde(default)]
    pub user: AuthUser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_fields_are_defaulted_and_coerced() {
        let p: Product = serde_json::from_value(json!({
            "id": "17",
            "name": "Rice 5kg",
            "price": "249.50",
            "stock": null,
            "available_for_sale": 1,
            "image_url": ""
        }))
        .unwrap();

        assert_eq!(p.id, 17);
        assert_eq!(p.price, 249.5);
        assert_eq!(p.stock, 0);
        assert_eq!(p.low_stock_threshold, 5.0);
        assert!(p.available);
        assert_eq!(p.image_url, None);
        assert_eq!(p.category, "");
    }

    #[test]
    fn product_reads_camel_case_mirror_fields() {
        let p: Product = serde_json::from_value(json!({
            "id": 3, "name": "Soap", "lowStockThreshold": 12, "stock": 4
        }))
        .unwrap();
        assert_eq!(p.low_stock_threshold, 12.0);
    }

    #[test]
    fn order_maps_wire_names() {
        let o: Order = serde_json::from_value(json!({
            "id": 42,
            "name": "Ana Cruz",
            "totalPrice": "500",
            "discount": 50,
            "net_total": 450,
            "status": "completed",
            "type": "online",
            "ref": "GC-1234",
            "createdAt": "2024-05-03T09:15:00+08:00"
        }))
        .unwrap();

        assert_eq!(o.customer, "Ana Cruz");
        assert_eq!(o.total, 500.0);
        assert_eq!(o.net_total, 450.0);
        assert_eq!(o.status, OrderStatus::Completed);
        assert_eq!(o.channel.as_deref(), Some("online"));
        assert_eq!(o.reference.as_deref(), Some("GC-1234"));
        assert_eq!(o.display_id(), "ORD42");
        assert_eq!(o.placed_on(), NaiveDate::from_ymd_opt(2024, 5, 3));
    }

    #[test]
    fn unknown_status_and_bad_date_do_not_fail() {
        let o: Order = serde_json::from_value(json!({
            "id": 1, "status": "on-hold", "createdAt": "yesterday", "order_code": "A-9"
        }))
        .unwrap();
        assert_eq!(o.status, OrderStatus::Unknown);
        assert_eq!(o.created_at, None);
        assert_eq!(o.display_id(), "A-9");
    }

    #[test]
    fn mirror_round_trip_keeps_orders_intact() {
        let o: Order = serde_json::from_value(json!({
            "id": 7, "name": "Ben", "net_total": 99.5, "createdAt": "2024-01-02"
        }))
        .unwrap();
        let back: Order = serde_json::from_str(&serde_json::to_string(&o).unwrap()).unwrap();
        assert_eq!(back, o);
    }

    #[test]
    fn supplier_items_and_delivery() {
        let s: Supplier = serde_json::from_value(json!({
            "id": 2, "name": "Acme", "items": ["Rice", null, 5], "last_delivery": "2024-03-01"
        }))
        .unwrap();
        assert_eq!(s.items, vec!["Rice".to_string(), "5".to_string()]);
        assert_eq!(s.last_delivery, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn sales_overview_totals() {
        let overview: SalesOverview = serde_json::from_value(json!({
            "days": [
                { "day": "2024-05-01", "online": 10, "instore": "5" },
                { "day": "2024-05-02", "online": null }
            ]
        }))
        .unwrap();
        assert_eq!(overview.daily_totals(), vec![15.0, 0.0]);
    }

    #[test]
    fn sales_overview_survives_odd_days() {
        let overview: SalesOverview = serde_json::from_value(json!({
            "days": [
                { "day": "2024-05-01T00:00:00", "online": 10 },
                { "day": "last tuesday", "online": 20 },
                { "online": 30 }
            ]
        }))
        .unwrap();
        assert_eq!(overview.days.len(), 3);
        assert_eq!(overview.days[0].day, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(overview.days[1].day, None);
        assert_eq!(overview.days[2].day, None);
        assert_eq!(overview.daily_totals(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn auth_user_display_name() {
        assert_eq!(AuthUser::default().display_name(), "Admin");
        let u = AuthUser {
            name: None,
            email: Some("owner@shop.local".into()),
        };
        assert_eq!(u.display_name(), "owner@shop.local");
    }
}
