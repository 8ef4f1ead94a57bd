//! ARIMA(p, d, q) estimation and forecasting
//!
//! Coefficients are estimated with the Hannan–Rissanen procedure: a long
//! autoregression approximates the unobserved shocks, then the ARMA
//! coefficients come from one least-squares regression on lagged values and
//! lagged shock estimates. The model has no constant term. A series whose
//! differences are all zero gets zero coefficients and forecasts its last level.

use super::linalg::least_squares;
use crate::config::ArimaOrder;
use crate::error::{Result, StockQueryError};
use tracing::debug;

/// Upper bound on the order of the long autoregression
const MAX_LONG_AR_ORDER: usize = 20;
/// Differences smaller than this count as zero when checking for a flat series
const FLAT_TOLERANCE: f64 = 1e-12;

/// A fitted model, ready to forecast
#[derive(Debug, Clone)]
pub struct ArimaFit {
    order: ArimaOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    /// Differenced series the ARMA part was fitted on
    differenced: Vec<f64>,
    /// Shock estimates aligned with `differenced`
    residuals: Vec<f64>,
    /// Last observation at each differencing level, outermost first
    anchors: Vec<f64>,
}

/// Fit an ARIMA model of the given order to `series`
pub fn fit(order: ArimaOrder, series: &[f64]) -> Result<ArimaFit> {
    let ArimaOrder { p, d, q } = order;
    if p + q == 0 {
        return Err(StockQueryError::ModelFit(
            "model needs at least one AR or MA term".to_string(),
        ));
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(StockQueryError::ModelFit(
            "series contains non-finite values".to_string(),
        ));
    }

    let mut anchors = Vec::with_capacity(d);
    let mut w = series.to_vec();
    for _ in 0..d {
        let Some(&last) = w.last() else { break };
        anchors.push(last);
        w = difference(&w);
    }

    let n = w.len();
    let long_order = (n / 4).min(MAX_LONG_AR_ORDER).max(p.max(q) + 1);
    let start = p.max(long_order + q);
    if n <= 2 * long_order || n <= start + p + q {
        return Err(StockQueryError::ModelFit(format!(
            "series of {} points is too short for ARIMA({p},{d},{q})",
            series.len()
        )));
    }

    // A series that never moves has nothing to regress on; it forecasts its last level
    if w.iter().all(|v| v.abs() < FLAT_TOLERANCE) {
        debug!(observations = series.len(), "Flat series, using zero coefficients");
        return Ok(ArimaFit {
            order,
            ar: vec![0.0; p],
            ma: vec![0.0; q],
            residuals: vec![0.0; n],
            differenced: w,
            anchors,
        });
    }

    // Stage 1: long autoregression, its residuals estimate the shocks
    let (design, targets) = lagged_design(&w, long_order, |t, design_row| {
        design_row.extend((1..=long_order).map(|lag| w[t - lag]));
    });
    let phi = least_squares(&design, &targets)?;
    let mut residuals = vec![0.0; n];
    for t in long_order..n {
        let fitted: f64 = (1..=long_order).map(|lag| phi[lag - 1] * w[t - lag]).sum();
        residuals[t] = w[t] - fitted;
    }

    // Stage 2: regress on lagged values and lagged shocks
    let (design, targets) = lagged_design(&w, start, |t, design_row| {
        design_row.extend((1..=p).map(|lag| w[t - lag]));
        design_row.extend((1..=q).map(|lag| residuals[t - lag]));
    });
    let coefficients = least_squares(&design, &targets)?;
    let (ar, ma) = coefficients.split_at(p);

    debug!(
        observations = series.len(),
        long_order,
        rows = targets.len(),
        ?ar,
        ?ma,
        "Fitted ARIMA coefficients"
    );

    Ok(ArimaFit {
        order,
        ar: ar.to_vec(),
        ma: ma.to_vec(),
        differenced: w,
        residuals,
        anchors,
    })
}

/// Regression rows for `t` in `start..w.len()`, with `w[t]` as target
fn lagged_design<F>(w: &[f64], start: usize, mut fill: F) -> (Vec<Vec<f64>>, Vec<f64>)
where
    F: FnMut(usize, &mut Vec<f64>),
{
    let rows = w.len().saturating_sub(start);
    let mut design = Vec::with_capacity(rows);
    let mut targets = Vec::with_capacity(rows);
    for (t, &target) in w.iter().enumerate().skip(start) {
        let mut row = Vec::new();
        fill(t, &mut row);
        design.push(row);
        targets.push(target);
    }
    (design, targets)
}

fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

impl ArimaFit {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma(&self) -> &[f64] {
        &self.ma
    }

    /// Point forecasts for the next `steps` observations
    ///
    /// Future shocks are taken as zero; the differenced forecasts are
    /// integrated back onto the last observed level.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>> {
        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();
        let mut predicted = Vec::with_capacity(steps);

        for _ in 0..steps {
            let len = w.len();
            let ar: f64 = self
                .ar
                .iter()
                .enumerate()
                .map(|(i, phi)| phi * w[len - 1 - i])
                .sum();
            let ma: f64 = self
                .ma
                .iter()
                .enumerate()
                .map(|(j, theta)| theta * e[len - 1 - j])
                .sum();
            let next = ar + ma;
            w.push(next);
            e.push(0.0);
            predicted.push(next);
        }

        for &anchor in self.anchors.iter().rev() {
            let mut level = anchor;
            for value in &mut predicted {
                level += *value;
                *value = level;
            }
        }

        if predicted.iter().all(|v| v.is_finite()) {
            Ok(predicted)
        } else {
            Err(StockQueryError::ModelFit(
                "forecast produced non-finite values".to_string(),
            ))
        }
    }
}
