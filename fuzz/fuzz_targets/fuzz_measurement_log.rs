#![no_main]
use libfuzzer_sys::fuzz_target;
use screentimer_core::{PipelineOptions, QualityPolicy, analyze_batch, read_measurement_log};

fuzz_target!(|data: &[u8]| {
    // Any byte soup must either parse or fail with a line number.
    let Ok(batch) = read_measurement_log(data) else {
        return;
    };
    // Whatever parses must analyze without panicking.
    let opts = PipelineOptions {
        quality_policy: QualityPolicy::Skip,
        ..PipelineOptions::default()
    };
    let _ = analyze_batch(&batch, None, &opts);
});
