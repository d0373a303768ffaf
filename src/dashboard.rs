//! Dashboard summaries: the metric cards, the low-stock badge and the data
//! behind the sales-overview chart.

use crate::config::FORECAST_HORIZON;
use crate::forecast::project_days;
use crate::models::{Order, SalesOverview};
use crate::utils::weekday_label;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

/// Which day the metric cards and order list summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    Today,
    Day(NaiveDate),
}

impl DateFilter {
    pub fn selected_day(self, today: NaiveDate) -> NaiveDate {
        match self {
            DateFilter::Today => today,
            DateFilter::Day(day) => day,
        }
    }

    /// Header text: the day, marked when it is an explicit filter.
    pub fn header_label(self, today: NaiveDate) -> String {
        let day = self.selected_day(today).format("%m/%d/%Y");
        match self {
            DateFilter::Today => day.to_string(),
            DateFilter::Day(_) => format!("{} (filtered)", day),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DayMetrics {
    pub total_sales: f64,
    pub order_count: usize,
    pub customers: usize,
}

/// Net sales, order count and distinct customers for the filtered day.
/// Orders without a usable timestamp never match.
pub fn day_metrics(orders: &[Order], filter: DateFilter, today: NaiveDate) -> DayMetrics {
    let day = filter.selected_day(today);
    let selected: Vec<&Order> = orders
        .iter()
        .filter(|o| o.placed_on() == Some(day))
        .collect();
    let customers: HashSet<&str> = selected.iter().map(|o| o.customer.as_str()).collect();

    DayMetrics {
        total_sales: selected.iter().map(|o| o.net_total).sum(),
        order_count: selected.len(),
        customers: customers.len(),
    }
}

/// Low-stock notification badge, capped for layout.
pub fn notification_badge(count: usize) -> String {
    if count > 99 {
        "99+".to_string()
    } else {
        count.to_string()
    }
}

/// Date of the final history entry, inferred from the last entry that has
/// one when the tail came without dates.
fn anchor_day(overview: &SalesOverview) -> Option<NaiveDate> {
    let last = overview.days.len().checked_sub(1)?;
    overview
        .days
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, d)| d.day.map(|day| (i, day)))
        .and_then(|(i, day)| day.checked_add_days(Days::new((last - i) as u64)))
}

/// Data for the sales-overview bar chart.
///
/// History and projection share one label axis: the online/in-store series
/// are padded with `None` over the projected days and the prediction series
/// is `None` over history, so bars never overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesChartSeries {
    pub labels: Vec<String>,
    pub online: Vec<Option<f64>>,
    pub instore: Vec<Option<f64>>,
    pub prediction: Vec<Option<f64>>,
}

impl SalesChartSeries {
    pub fn build(overview: &SalesOverview, today: NaiveDate) -> Self {
        let history = overview.days.len();
        let last_day = anchor_day(overview).unwrap_or(today);
        let projected = project_days(&overview.daily_totals(), FORECAST_HORIZON, last_day);

        let labels = overview
            .days
            .iter()
            .enumerate()
            .map(|(i, d)| match d.day {
                Some(day) => weekday_label(day).to_string(),
                None => format!("Day {}", i + 1),
            })
            .chain(projected.iter().map(|p| weekday_label(p.day).to_string()))
            .collect();
        let pad = |values: Vec<f64>| -> Vec<Option<f64>> {
            values
                .into_iter()
                .map(Some)
                .chain(std::iter::repeat(None).take(projected.len()))
                .collect()
        };

        Self {
            labels,
            online: pad(overview.days.iter().map(|d| d.online).collect()),
            instore: pad(overview.days.iter().map(|d| d.instore).collect()),
            prediction: std::iter::repeat(None)
                .take(history)
                .chain(projected.iter().map(|p| Some(p.value)))
                .collect(),
        }
    }

    /// Static sample week shown when the overview cannot be loaded.
    pub fn placeholder() -> Self {
        let labels = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        let online = [65.0, 78.0, 80.0, 56.0, 90.0, 110.0, 130.0];
        let instore = [50.0, 60.0, 70.0, 85.0, 100.0, 95.0, 88.0];
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            online: online.into_iter().map(Some).collect(),
            instore: instore.into_iter().map(Some).collect(),
            prediction: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SalesDay;
    use chrono::DateTime;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order(customer: &str, net: f64, at: &str) -> Order {
        Order {
            customer: customer.to_string(),
            net_total: net,
            created_at: DateTime::parse_from_rfc3339(at).ok(),
            ..Order::default()
        }
    }

    #[test]
    fn metrics_cover_only_the_selected_day() {
        let orders = vec![
            order("Ana", 100.0, "2024-05-03T09:00:00+08:00"),
            order("Ben", 50.0, "2024-05-03T18:30:00+08:00"),
            order("Ana", 25.0, "2024-05-03T20:00:00+08:00"),
            order("Cy", 999.0, "2024-05-02T10:00:00+08:00"),
            Order::default(),
        ];
        let today = day(2024, 5, 3);

        let m = day_metrics(&orders, DateFilter::Today, today);
        assert_eq!(m.total_sales, 175.0);
        assert_eq!(m.order_count, 3);
        assert_eq!(m.customers, 2);

        let m = day_metrics(&orders, DateFilter::Day(day(2024, 5, 2)), today);
        assert_eq!(m.order_count, 1);
        assert_eq!(m.total_sales, 999.0);
    }

    #[test]
    fn header_marks_filtered_days() {
        let today = day(2024, 5, 3);
        assert_eq!(DateFilter::Today.header_label(today), "05/03/2024");
        assert_eq!(
            DateFilter::Day(day(2024, 4, 1)).header_label(today),
            "04/01/2024 (filtered)"
        );
    }

    #[test]
    fn badge_caps_at_99() {
        assert_eq!(notification_badge(7), "7");
        assert_eq!(notification_badge(99), "99");
        assert_eq!(notification_badge(100), "99+");
    }

    #[test]
    fn chart_series_append_two_projected_days() {
        // Mon 2024-04-29 .. Sun 2024-05-05
        let overview = SalesOverview {
            days: (0..7)
                .map(|i| SalesDay {
                    day: Some(day(2024, 4, 29) + chrono::Days::new(i)),
                    online: 6.0,
                    instore: 4.0,
                })
                .collect(),
        };
        let series = SalesChartSeries::build(&overview, day(2024, 5, 5));

        assert_eq!(
            series.labels,
            ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun", "Mon", "Tue"]
        );
        assert_eq!(series.online.len(), 9);
        assert_eq!(series.online[6], Some(6.0));
        assert_eq!(series.online[7], None);
        assert_eq!(series.instore[8], None);
        assert!(series.prediction[..7].iter().all(Option::is_none));
        for value in &series.prediction[7..] {
            let v = value.unwrap();
            assert!((v - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn undated_days_get_positional_labels() {
        let dated = |d: Option<NaiveDate>, total: f64| SalesDay {
            day: d,
            online: total,
            instore: 0.0,
        };
        // Wed, Thu, then two entries the server sent without a usable date
        let overview = SalesOverview {
            days: vec![
                dated(Some(day(2024, 5, 1)), 10.0),
                dated(Some(day(2024, 5, 2)), 10.0),
                dated(None, 10.0),
                dated(None, 10.0),
            ],
        };
        let series = SalesChartSeries::build(&overview, day(2024, 6, 30));

        assert_eq!(series.labels, ["Wed", "Thu", "Day 3", "Day 4", "Sun", "Mon"]);
        assert_eq!(series.online[3], Some(10.0));
        for value in &series.prediction[4..] {
            assert!((value.unwrap() - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_overview_projects_zeros_from_today() {
        let series = SalesChartSeries::build(&SalesOverview::default(), day(2024, 5, 3));
        assert_eq!(series.labels, ["Sat", "Sun"]);
        assert_eq!(series.prediction, vec![Some(0.0), Some(0.0)]);
        assert_eq!(series.online, vec![None, None]);
    }

    #[test]
    fn placeholder_has_no_prediction() {
        let series = SalesChartSeries::placeholder();
        assert_eq!(series.labels.len(), 7);
        assert!(series.prediction.is_empty());
    }
}
