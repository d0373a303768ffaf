//! Rule-based short-horizon sales forecaster.
//!
//! Projects the next few days by cycling the day pattern found in the history
//! window, adding a bounded recent trend, and clamping every projection to
//! `[0, 3 × average]`. The computation is pure and synchronous.
//!
//! # Algorithm
//! 1. Sanitize: negative or non-finite totals count as zero.
//! 2. Smooth with a 3-point moving average (edges reuse themselves).
//! 3. Weight each day by `smoothed / average` (`1` when the average is zero).
//! 4. Trend is the average daily change over the last three smoothed steps,
//!    capped at ±10% of the average per day.
//! 5. `value = average × weight[day mod n] + trend × (day + 1)`, clamped.
//!
//! [`ForecastConfig::weekly`] swaps step 5's cyclic index for one aligned
//! to a calendar season.

use crate::config::{CEILING_MULTIPLIER, SEASON_LENGTH, TREND_CAP_RATIO};
use chrono::{Days, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

/// Tunables for [`forecast_with`].
///
/// The default cycles the weights over the whole history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Length of the repeating demand cycle in days. `0` cycles over the
    /// whole history window instead of aligning to a calendar season.
    pub season_len: usize,
}

impl ForecastConfig {
    /// Align each future day with the same weekday in the history.
    pub fn weekly() -> Self {
        Self {
            season_len: SEASON_LENGTH,
        }
    }
}

/// One projected day, as consumed by the sales chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub day: NaiveDate,
    pub value: f64,
}

#[inline]
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Mean computed as a sum of fractions so large finite totals cannot overflow.
fn mean(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    values.iter().map(|v| v / n).sum()
}

/// 3-point moving average; the first and last elements stand in for their
/// own missing neighbour.
pub fn smooth(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    (0..n)
        .map(|i| {
            let prev = values[i.saturating_sub(1)];
            let next = values[(i + 1).min(n - 1)];
            prev / 3.0 + values[i] / 3.0 + next / 3.0
        })
        .collect()
}

/// Relative day weights against the window average.
///
/// A zero smoothed value yields a zero weight and is kept as such; only a
/// zero average falls back to `1` for every day.
pub fn day_weights(smoothed: &[f64], average: f64) -> Vec<f64> {
    smoothed
        .iter()
        .map(|&v| if average > 0.0 { v / average } else { 1.0 })
        .collect()
}

/// Average daily change across the last three smoothed steps, capped to
/// ±`TREND_CAP_RATIO` of the average.
fn recent_trend(smoothed: &[f64], average: f64) -> f64 {
    let n = smoothed.len();
    if n < 4 {
        return 0.0;
    }
    let change = (smoothed[n - 1] - smoothed[n - 4]) / 3.0;
    let cap = average * TREND_CAP_RATIO;
    if change.is_nan() {
        0.0
    } else {
        change.clamp(-cap, cap)
    }
}

/// Weight for the future day `step` (0-based, first day after the window).
///
/// Uses the most recent history day sitting at the same position of the
/// season. Falls back to `1` when the window is shorter than the season.
fn season_weight(weights: &[f64], season_len: usize, step: usize) -> f64 {
    let n = weights.len();
    if season_len == 0 {
        return weights[step % n];
    }
    let back = (step / season_len + 1) * season_len;
    match (n + step).checked_sub(back) {
        Some(j) => weights[j],
        None => 1.0,
    }
}

/// Forecast `horizon` days, cycling the day weights over the window.
pub fn forecast(history: &[f64], horizon: usize) -> Vec<f64> {
    forecast_with(&ForecastConfig::default(), history, horizon)
}

/// Forecast `horizon` days following `history` (oldest first).
///
/// Never fails: the output always has exactly `horizon` values, each within
/// `[0, 3 × average(history)]`.
pub fn forecast_with(config: &ForecastConfig, history: &[f64], horizon: usize) -> Vec<f64> {
    if history.is_empty() {
        return vec![0.0; horizon];
    }

    let values: Vec<f64> = history.iter().copied().map(sanitize).collect();
    let average = mean(&values);
    let smoothed = smooth(&values);
    let weights = day_weights(&smoothed, average);
    let trend = recent_trend(&smoothed, average);
    let ceiling = average * CEILING_MULTIPLIER;

    debug!(
        "Forecasting {} days from {} totals (avg {:.2}, trend {:.2}/day)",
        horizon,
        values.len(),
        average,
        trend
    );

    (0..horizon)
        .map(|step| {
            let weight = season_weight(&weights, config.season_len, step);
            let projected = average * weight + trend * (step + 1) as f64;
            // f64::max discards NaN, so the result is always a real number
            projected.max(0.0).min(ceiling)
        })
        .collect()
}

/// Forecast and attach the calendar day each value belongs to.
/// `last_day` is the date of the final history entry.
pub fn project_days(history: &[f64], horizon: usize, last_day: NaiveDate) -> Vec<ForecastPoint> {
    forecast(history, horizon)
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| {
            last_day
                .checked_add_days(Days::new(i as u64 + 1))
                .map(|day| ForecastPoint { day, value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_history_yields_zeros() {
        for k in [0, 1, 2, 7, 30] {
            let out = forecast(&[], k);
            assert_eq!(out.len(), k);
            assert!(out.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn zero_horizon_is_empty() {
        assert!(forecast(&[5.0, 6.0, 7.0], 0).is_empty());
    }

    #[test]
    fn flat_week_projects_flat() {
        let out = forecast(&[10.0; 7], 2);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|&v| approx(v, 10.0)));
    }

    #[test]
    fn upward_run_adds_capped_trend() {
        let history = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0];
        let out = forecast(&history, 2);
        let average = 40.0;
        let smoothed = smooth(&history);
        let day_one_base = average * (smoothed[0] / average);

        // raw trend is (66.67 - 40) / 3 = 8.9 per day, capped to 4
        assert!(out[0] > day_one_base);
        assert!(approx(out[0], day_one_base + 4.0));
        assert!(approx(out[1], smoothed[1] + 8.0));
        assert!(out.iter().all(|&v| v <= 3.0 * average));
    }

    #[test]
    fn downward_run_trend_is_capped_negative() {
        let history = [70.0, 60.0, 50.0, 40.0, 30.0, 20.0, 10.0];
        let out = forecast(&history, 1);
        let smoothed = smooth(&history);
        assert!(approx(out[0], smoothed[0] - 4.0));
    }

    #[test]
    fn spike_is_bounded_by_ceiling() {
        let history = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 700.0];
        let out = forecast(&history, 7);
        // average 100, so nothing may exceed 300
        assert!(approx(out[6], 300.0));
        assert!(out.iter().all(|&v| (0.0..=300.0).contains(&v)));
    }

    #[test]
    fn short_history_cycles_its_own_weights() {
        let out = forecast(&[10.0, 30.0, 50.0], 4);
        // fewer than 4 points: no trend, weights are smoothed / 30
        assert!(approx(out[0], 50.0 / 3.0));
        assert!(approx(out[1], 30.0));
        assert!(approx(out[2], 130.0 / 3.0));
        assert!(approx(out[3], out[0]));
    }

    #[test]
    fn long_history_cycles_from_window_start() {
        let mut history = vec![10.0; 14];
        history[0] = 40.0;
        let out = forecast(&history, 3);
        // smoothed head is 30, 20, 10 and the flat tail gives no trend
        assert!(approx(out[0], 30.0));
        assert!(approx(out[1], 20.0));
        assert!(approx(out[2], 10.0));
    }

    #[test]
    fn weekly_season_is_opt_in() {
        let out = forecast_with(&ForecastConfig::weekly(), &[10.0, 30.0, 50.0], 2);
        // window shorter than the season: no aligned day, weight 1
        assert!(out.iter().all(|&v| approx(v, 30.0)));
        assert_eq!(ForecastConfig::default().season_len, 0);
    }

    #[test]
    fn malformed_inputs_count_as_zero() {
        let dirty = [f64::NAN, -5.0, f64::INFINITY, 10.0, 10.0, 10.0, 10.0];
        let clean = [0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0];
        assert_eq!(forecast(&dirty, 4), forecast(&clean, 4));
    }

    #[test]
    fn all_zero_history_projects_zero() {
        let out = forecast(&[0.0; 7], 3);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn huge_finite_totals_stay_real() {
        let out = forecast(&[1e300; 7], 3);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn bounds_hold_across_assorted_histories() {
        let histories: [&[f64]; 5] = [
            &[1.0],
            &[3.0, 0.0, 9.0, 1.0],
            &[100.0, 5.0, 100.0, 5.0, 100.0, 5.0, 100.0],
            &[12.5, 14.0, 0.0, 0.0, 33.0, 81.0, 2.0, 9.0, 40.0, 40.0],
            &[0.0, 0.0, 0.0, 1.0],
        ];
        for history in histories {
            let average = history.iter().sum::<f64>() / history.len() as f64;
            for k in [1, 2, 9, 21] {
                let out = forecast(history, k);
                assert_eq!(out.len(), k);
                assert!(out.iter().all(|&v| v >= 0.0 && v <= 3.0 * average + 1e-9));
            }
        }
    }

    #[test]
    fn weekly_weights_repeat_past_one_week() {
        let history = [10.0, 40.0, 10.0, 10.0, 10.0, 10.0, 10.0];
        let out = forecast(&history, 14);
        for i in 0..7 {
            // flat tail: no trend, so the second week mirrors the first
            assert!(approx(out[i], out[i + 7]));
        }
    }

    #[test]
    fn longer_window_aligns_to_season() {
        // two weeks; day 0 of the forecast lines up with index 7 of the window
        let mut history = vec![10.0; 14];
        history[7] = 40.0;
        let aligned = forecast_with(&ForecastConfig::weekly(), &history, 1);
        let cycled = forecast(&history, 1);

        let smoothed = smooth(&history);
        let average = history.iter().sum::<f64>() / 14.0;
        assert!(approx(aligned[0], average * (smoothed[7] / average)));
        assert!(approx(cycled[0], average * (smoothed[0] / average)));
    }

    #[test]
    fn projected_days_follow_last_day() {
        let last = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let points = project_days(&[10.0; 7], 2, last);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].day, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(points[1].day, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
