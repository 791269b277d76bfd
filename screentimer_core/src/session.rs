//! One acquisition run against a device.
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use screentimer_traits::{Clock, DeviceLink};
use tracing::{info, warn};

use crate::decoder::to_microseconds;
use crate::error::Result as CoreResult;
use crate::protocol::ProtocolClient;
use crate::types::{DeviceInfo, MeasurementBatch, Sample, TimeUnit};

/// Key code sent for the test press unless configured otherwise.
pub const DEFAULT_TEST_KEY: u8 = 4;
/// Key code sent to undo the test press.
pub const DEFAULT_RESET_KEY: u8 = 42;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionCfg {
    pub test_key: u8,
    pub reset_key: u8,
    /// Number of measurements to take.
    pub samples: usize,
    /// Pause before each measurement.
    pub delay: Duration,
    /// Convert time axes from device ticks to microseconds.
    pub tick_conversion: bool,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            test_key: DEFAULT_TEST_KEY,
            reset_key: DEFAULT_RESET_KEY,
            samples: 1,
            delay: Duration::ZERO,
            tick_conversion: true,
        }
    }
}

/// Everything one acquisition run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub info: DeviceInfo,
    pub batch: MeasurementBatch,
}

impl Acquisition {
    /// True when fewer samples were taken than requested.
    pub fn is_partial(&self, cfg: &SessionCfg) -> bool {
        self.batch.len() < cfg.samples
    }
}

fn open<L: DeviceLink>(link: L, cfg: &SessionCfg) -> CoreResult<(ProtocolClient<L>, DeviceInfo)> {
    let mut client = ProtocolClient::new(link);
    client.handshake().wrap_err("handshake failed")?;
    client
        .configure_keys(cfg.test_key, cfg.reset_key)
        .wrap_err("configuring key codes failed")?;
    let info = client.query_info().wrap_err("querying device info failed")?;
    Ok((client, info))
}

/// Handshake and report the device parameters.
pub fn query_device<L: DeviceLink>(link: L, cfg: &SessionCfg) -> CoreResult<DeviceInfo> {
    let (client, info) = open(link, cfg)?;
    client.close().wrap_err("closing device link failed")?;
    Ok(info)
}

/// Record one calibration trace, in microseconds when tick conversion is on.
pub fn run_calibration<L: DeviceLink>(
    link: L,
    cfg: &SessionCfg,
) -> CoreResult<(DeviceInfo, TimeUnit, Sample)> {
    let (mut client, info) = open(link, cfg)?;
    let sample = client.calibrate().wrap_err("calibration failed")?;
    client.close().wrap_err("closing device link failed")?;
    if cfg.tick_conversion {
        Ok((info, TimeUnit::Microseconds, to_microseconds(&sample, &info)))
    } else {
        Ok((info, TimeUnit::Cycles, sample))
    }
}

/// Take `cfg.samples` measurements.
///
/// `stop` is checked before every measurement; once set, the run ends early
/// and returns what was collected so far.
pub fn run_session<L: DeviceLink>(
    link: L,
    cfg: &SessionCfg,
    clock: &dyn Clock,
    stop: &AtomicBool,
) -> CoreResult<Acquisition> {
    let (mut client, info) = open(link, cfg)?;
    let unit = if cfg.tick_conversion {
        TimeUnit::Microseconds
    } else {
        TimeUnit::Cycles
    };
    let mut batch = MeasurementBatch::new(unit);

    for index in 0..cfg.samples {
        if stop.load(Ordering::Relaxed) {
            warn!(collected = batch.len(), requested = cfg.samples, "acquisition interrupted");
            break;
        }
        clock.sleep(cfg.delay);
        let started = clock.now();
        let sample = client
            .measure()
            .wrap_err_with(|| format!("measurement {index} failed"))?;
        info!(
            index,
            points = sample.len(),
            variance = sample.variance(),
            elapsed_ms = clock.elapsed_since(started).as_millis() as u64,
            "measurement recorded"
        );
        batch.samples.push(if cfg.tick_conversion {
            to_microseconds(&sample, &info)
        } else {
            sample
        });
    }

    client.close().wrap_err("closing device link failed")?;
    Ok(Acquisition { info, batch })
}
