//! Device backend selection: simulator by default, USB serial with `hardware`.

use screentimer_traits::DeviceLink;

/// Open the link for one session.
#[cfg(not(feature = "hardware"))]
pub fn open_link(_cfg: &screentimer_config::Config) -> eyre::Result<Box<dyn DeviceLink>> {
    use screentimer_hardware::{SimFault, simulated_link};

    use crate::cli::{CliError, SIM_FAULT_ENV};

    let fault = match std::env::var(SIM_FAULT_ENV) {
        Ok(s) => s
            .parse::<SimFault>()
            .map_err(|e| CliError::Usage(format!("{SIM_FAULT_ENV}: {e}")))?,
        Err(_) => SimFault::None,
    };
    tracing::info!(?fault, "using simulated device");
    Ok(Box::new(simulated_link(fault, sim_seed())))
}

#[cfg(not(feature = "hardware"))]
fn sim_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() | 1)
        .unwrap_or(0x5eed)
}

/// Open the link for one session.
#[cfg(feature = "hardware")]
pub fn open_link(cfg: &screentimer_config::Config) -> eyre::Result<Box<dyn DeviceLink>> {
    use eyre::WrapErr;
    use screentimer_hardware::serial;
    use std::time::Duration;

    let dev = &cfg.device;
    let port = match &dev.port {
        Some(p) => p.clone(),
        None => serial::find_device(dev.usb_vid, dev.usb_pid)?,
    };
    let link = serial::open(&port, dev.baud, Duration::from_millis(dev.read_timeout_ms))
        .wrap_err_with(|| format!("open serial port {port}"))?;
    Ok(Box::new(link))
}
