//! Small maximum-likelihood fitting helpers.
//!
//! All functions return `None` on empty input rather than NaN.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Drop `floor(n * fraction / 2)` values from each end of an already
/// sorted slice.
pub fn trim_both(sorted: &[f64], fraction: f64) -> &[f64] {
    if fraction <= 0.0 || sorted.is_empty() {
        return sorted;
    }
    let cut = ((sorted.len() as f64 * fraction) / 2.0).floor() as usize;
    if 2 * cut >= sorted.len() {
        return &[];
    }
    &sorted[cut..sorted.len() - cut]
}

/// Uniform distribution fit: `(loc, scale)` with `loc = min`, `scale = max - min`.
pub fn fit_uniform(values: &[f64]) -> Option<(f64, f64)> {
    let (&first, rest) = values.split_first()?;
    let (lo, hi) = rest
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    Some((lo, hi - lo))
}

/// Normal distribution fit: mean and population standard deviation.
pub fn fit_normal(values: &[f64]) -> Option<(f64, f64)> {
    let mu = mean(values)?;
    let var = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some((mu, var.sqrt()))
}
