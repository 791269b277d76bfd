use screentimer_config::{Config, load_file, load_toml};
use rstest::rstest;
use tempfile::tempdir;

#[test]
fn full_document_parses() {
    let toml = r#"
[device]
port = "/dev/ttyACM0"
usb_vid = 0x16C0
usb_pid = 0x047A
baud = 9600
read_timeout_ms = 2000

[keys]
test = 5
reset = 42

[acquisition]
samples = 20
delay_ms = 250
tick_conversion = false

[analysis]
trim_fraction = 0.1
skip_low_contrast = true

[logging]
file = "screentimer.log"
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.device.port.as_deref(), Some("/dev/ttyACM0"));
    assert_eq!(cfg.device.baud, 9600);
    assert_eq!(cfg.keys.test, 5);
    assert_eq!(cfg.acquisition.samples, 20);
    assert!(!cfg.acquisition.tick_conversion);
    assert!(cfg.analysis.skip_low_contrast);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}

#[test]
fn partial_sections_keep_defaults() {
    let cfg = load_toml("[acquisition]\nsamples = 3\n").expect("parse TOML");
    assert_eq!(cfg.acquisition.samples, 3);
    assert_eq!(cfg.acquisition.delay_ms, 0);
    assert!(cfg.acquisition.tick_conversion);
    assert_eq!(cfg.device, Config::default().device);
}

#[rstest]
#[case("[acquisition]\nsamples = 0\n", "acquisition.samples must be > 0")]
#[case("[device]\nbaud = 0\n", "device.baud must be > 0")]
#[case("[device]\nread_timeout_ms = 0\n", "device.read_timeout_ms must be > 0")]
#[case("[analysis]\ntrim_fraction = 0.5\n", "analysis.trim_fraction")]
#[case("[analysis]\ntrim_fraction = -0.1\n", "analysis.trim_fraction")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(needle), "{err}");
}

#[test]
fn key_codes_must_fit_a_byte() {
    assert!(load_toml("[keys]\ntest = 300\n").is_err());
}

#[test]
fn missing_file_means_defaults() {
    let dir = tempdir().unwrap();
    let cfg = load_file(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg, Config::default());
}

#[test]
fn load_file_reports_parse_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[device\n").unwrap();
    let err = load_file(&path).unwrap_err();
    assert!(format!("{err}").contains("parse config"));
}
