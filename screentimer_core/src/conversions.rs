//! `From` implementations bridging `screentimer_config` types to core types.

use std::time::Duration;

use crate::pipeline::{PipelineOptions, QualityPolicy};
use crate::session::SessionCfg;

impl From<&screentimer_config::Config> for SessionCfg {
    fn from(c: &screentimer_config::Config) -> Self {
        Self {
            test_key: c.keys.test,
            reset_key: c.keys.reset,
            samples: c.acquisition.samples,
            delay: Duration::from_millis(c.acquisition.delay_ms),
            tick_conversion: c.acquisition.tick_conversion,
        }
    }
}

impl From<&screentimer_config::Config> for PipelineOptions {
    fn from(c: &screentimer_config::Config) -> Self {
        Self {
            apply_tick_conversion: c.acquisition.tick_conversion,
            trim_fraction: c.analysis.trim_fraction,
            quality_policy: if c.analysis.skip_low_contrast {
                QualityPolicy::Skip
            } else {
                QualityPolicy::Abort
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_line_up() {
        let cfg = screentimer_config::Config::default();
        assert_eq!(SessionCfg::from(&cfg), SessionCfg::default());
        assert_eq!(PipelineOptions::from(&cfg), PipelineOptions::default());
    }

    #[test]
    fn skip_flag_selects_policy() {
        let mut cfg = screentimer_config::Config::default();
        cfg.analysis.skip_low_contrast = true;
        cfg.analysis.trim_fraction = 0.2;
        let opts = PipelineOptions::from(&cfg);
        assert_eq!(opts.quality_policy, QualityPolicy::Skip);
        assert_eq!(opts.trim_fraction, 0.2);
    }
}
