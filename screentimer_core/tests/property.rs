use proptest::prelude::*;
use screentimer_core::decoder::decode_frames;
use screentimer_core::preprocess::{SMOOTHING_WINDOW, moving_average, preprocess};
use screentimer_core::{DeviceInfo, Sample, SignalQualityError, UniformTrace, extract, to_microseconds};

prop_compose! {
    fn frames_strategy()(frames in prop::collection::vec((any::<u16>(), any::<u16>()), 0..300)) -> Vec<(u16, u16)> {
        frames
    }
}

proptest! {
    #[test]
    fn decoded_times_are_prefix_sums_of_later_deltas(frames in frames_strategy(), variance in any::<u16>()) {
        let sample = decode_frames(variance, frames.clone());
        let mut expected = Vec::new();
        let mut ts = 0u64;
        for (d, _) in frames.iter().skip(1) {
            ts += u64::from(*d);
            expected.push(ts as f64);
        }
        prop_assert_eq!(sample.times(), expected.as_slice());
        let values: Vec<i64> = frames.iter().skip(1).map(|(_, v)| i64::from(*v)).collect();
        prop_assert_eq!(sample.values(), values.as_slice());
        prop_assert!(sample.times().windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(sample.variance(), variance);
    }

    #[test]
    fn one_mhz_conversion_is_identity(frames in frames_strategy()) {
        let sample = decode_frames(0, frames);
        let us = to_microseconds(&sample, &DeviceInfo { resolution: 1_000_000 });
        prop_assert_eq!(us.times(), sample.times());
        prop_assert_eq!(us.values(), sample.values());
    }

    #[test]
    fn conversion_is_invertible(frames in frames_strategy(), resolution in 1u32..100_000_000) {
        let sample = decode_frames(0, frames);
        let info = DeviceInfo { resolution };
        let us = to_microseconds(&sample, &info);
        let scale = info.us_per_tick();
        for (orig, conv) in sample.times().iter().zip(us.times()) {
            let back = conv / scale;
            prop_assert!((back - orig).abs() <= 1e-9 * orig.abs().max(1.0));
        }
        prop_assert_eq!(us.values(), sample.values());
    }

    #[test]
    fn moving_average_shortens_by_window_minus_one(values in prop::collection::vec(-1e6f64..1e6, SMOOTHING_WINDOW..500)) {
        let out = moving_average(&values, SMOOTHING_WINDOW);
        prop_assert_eq!(out.len(), values.len() - (SMOOTHING_WINDOW - 1));
    }

    #[test]
    fn preprocess_output_is_uniform(len in 9usize..200, step in 1u16..2000) {
        let sample = Sample::from_points(0, (0..len).map(|i| (f64::from(step) * i as f64, (i % 7) as i64)));
        let trace = preprocess(&sample).unwrap();
        prop_assert_eq!(trace.len(), len - 8);
        let dt: Vec<f64> = trace.times().windows(2).map(|w| w[1] - w[0]).collect();
        for d in &dt {
            prop_assert!((d - f64::from(step)).abs() < 1e-6);
        }
    }

    #[test]
    fn contrast_threshold_is_exact(base in -1000.0f64..1000.0, rise in 0.0f64..50.0) {
        let trace = UniformTrace::from_points([(0.0, base), (1.0, base), (2.0, base + rise)]);
        let result = extract(&trace);
        let rejected = matches!(result, Err(SignalQualityError::InsufficientContrast { .. }));
        let measured = (base + rise) - base;
        prop_assert_eq!(rejected, measured < 10.0);
    }
}
