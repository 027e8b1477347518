use envmon::alerts::{evaluate, is_critical};
use envmon::config::{MonitorConfig, Thresholds};
use envmon::state::{AlertParameter, AlertVerdict, Reading, SensorReadings};

fn readings(temperature: Reading, humidity: Reading, light: Reading) -> SensorReadings {
    SensorReadings {
        temperature,
        humidity,
        pressure: Reading::UNAVAILABLE,
        light,
    }
}

#[test]
fn test_every_flag_combination() {
    let t = Thresholds::default();
    let nominal = (20.0, 50.0, 100.0);
    let critical = (40.0, 90.0, 10.0);

    for mask in 0u8..8 {
        let pick = |bit: u8, ok: f32, bad: f32| if mask & bit != 0 { bad } else { ok };
        let r = readings(
            Reading::valid(pick(1, nominal.0, critical.0)),
            Reading::valid(pick(2, nominal.1, critical.1)),
            Reading::valid(pick(4, nominal.2, critical.2)),
        );

        let verdict = evaluate(&r, &t);
        assert_eq!(
            verdict,
            AlertVerdict::new(mask & 1 != 0, mask & 2 != 0, mask & 4 != 0),
            "mask {mask:03b}"
        );
        assert_eq!(verdict.any_critical(), mask != 0);
        assert_eq!(verdict.critical_parameters().count(), mask.count_ones() as usize);
    }
}

#[test]
fn test_invalid_readings_are_never_critical() {
    let mut r = readings(Reading::valid(40.0), Reading::valid(90.0), Reading::valid(10.0));
    r.temperature.record_failure();
    r.humidity.record_failure();
    r.light.record_failure();

    assert_eq!(evaluate(&r, &Thresholds::default()), AlertVerdict::NONE);
}

#[test]
fn test_cold_is_critical_too() {
    let r = readings(Reading::valid(5.0), Reading::valid(50.0), Reading::valid(100.0));
    let verdict = evaluate(&r, &Thresholds::default());
    assert!(verdict.temperature_critical());
    assert_eq!(verdict.critical_parameters().collect::<Vec<_>>(), vec![AlertParameter::Temperature]);
}

#[test]
fn test_evaluation_is_deterministic() {
    let r = readings(Reading::valid(35.5), Reading::UNAVAILABLE, Reading::valid(49.0));
    let t = Thresholds::default();
    let first = evaluate(&r, &t);
    for _ in 0..10 {
        assert_eq!(evaluate(&r, &t), first);
    }
}

#[test]
fn test_configured_thresholds_apply() {
    let config = MonitorConfig::from_json_str(
        r#"{"thresholds": {"temp_max_c": 25.0, "lux_min": 5.0}}"#,
    )
    .unwrap();

    assert!(is_critical(AlertParameter::Temperature, 26.0, &config.thresholds));
    assert!(!is_critical(AlertParameter::Light, 10.0, &config.thresholds));
    // Unset fields keep their defaults
    assert_eq!(config.thresholds.temp_min_c, 15.0);
    assert_eq!(config.thresholds.humidity_max_pct, 80.0);
}
