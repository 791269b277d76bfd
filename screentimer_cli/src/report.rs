//! Rendering of analysis results for stdout.

use screentimer_core::{DeviceInfo, Feature, Report, TimeUnit};
use serde_json::{Value, json};

pub fn report_text(report: &Report) -> String {
    let s = &report.summary;
    let mut out = format!(
        "Signal: {}\nMinimum Lag: {}\nMaximum Lag: {}\nMean Risetime: {}\nStddev Risetime: {}\n",
        s.signal_mean, s.lag_min, s.lag_max, s.risetime_mean, s.risetime_stddev
    );
    if !report.skipped.is_empty() {
        let skipped: Vec<String> = report.skipped.iter().map(ToString::to_string).collect();
        out.push_str(&format!("Skipped: {}\n", skipped.join(", ")));
    }
    out
}

pub fn report_json(report: &Report) -> Value {
    let s = &report.summary;
    json!({
        "unit": report.unit.label(),
        "samples": report.features.len() + report.skipped.len(),
        "skipped": report.skipped,
        "signal": s.signal_mean,
        "lag_min": s.lag_min,
        "lag_max": s.lag_max,
        "risetime_mean": s.risetime_mean,
        "risetime_stddev": s.risetime_stddev,
    })
}

pub fn feature_text(feature: &Feature, unit: TimeUnit) -> String {
    format!(
        "Signal: {}\nRisetime: {} {unit}\nChangetime: {} {unit}\n",
        feature.signal_delta, feature.risetime, feature.changetime
    )
}

pub fn feature_json(feature: &Feature, unit: TimeUnit) -> Value {
    json!({
        "unit": unit.label(),
        "signal": feature.signal_delta,
        "risetime": feature.risetime,
        "changetime": feature.changetime,
    })
}

pub fn info_text(info: &DeviceInfo) -> String {
    format!(
        "Resolution: {} ticks/s ({} us/tick)\n",
        info.resolution,
        info.us_per_tick()
    )
}

pub fn info_json(info: &DeviceInfo) -> Value {
    json!({ "resolution": info.resolution, "us_per_tick": info.us_per_tick() })
}
