//! End-to-end client flows over the mock transport: config-driven setup,
//! state streaming, link loss and reconnection.

use itchy::{CallbackType, Itchy, ItchyConfig, PositionQuery, QueryOptions, TactileMouseQuery};
use itchy_hid::mock::{MockConnector, MockDevice};
use itchy_protocol::{Command, DeviceState, SimulationParameters};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn state_at(x: f32, y: f32, button: u8) -> DeviceState {
    DeviceState {
        position: [x, y],
        velocity: [x * 10.0, y * 10.0],
        button,
        time: 1.0,
        ..DeviceState::default()
    }
}

fn sent_commands(device: &MockDevice) -> Vec<Command> {
    device
        .write_history()
        .iter()
        .filter_map(|report| Command::decode(report).ok().flatten())
        .collect()
}

fn fast_options() -> QueryOptions {
    QueryOptions {
        detached: false,
        timeout_ms: 5,
        connect_attempts: 3,
        connect_interval_ms: 1,
    }
}

#[test]
fn config_file_drives_device_setup() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("itchy.json");

    let config = ItchyConfig {
        simulation: Some(SimulationParameters {
            mass: 0.2,
            stiffness: 1500.0,
            damping: 20.0,
            update_rate_ms: 10,
        }),
        calibration_target: Some([0.3, 0.2]),
        ..ItchyConfig::default()
    };
    config.save_to_path(&path)?;
    let loaded = ItchyConfig::load_from_path(&path)?;
    assert_eq!(loaded, config);

    let device = MockDevice::itchy();
    let connector = Arc::new(MockConnector::with_device(device.clone()));
    let mut itchy = Itchy::with_identifier(connector, loaded.device);
    itchy.open(3, Duration::from_millis(1))?;

    if let Some(params) = loaded.simulation {
        itchy.try_set_simulation(params)?;
    }
    if let Some(target) = loaded.calibration_target {
        itchy.try_set_calibration_parameters(target)?;
    }
    assert!(itchy.save_state());

    let sent = sent_commands(&device);
    assert_eq!(sent.len(), 3);
    assert!(matches!(sent[0], Command::SimulationData(p) if p.update_rate_ms == 10));
    assert!(matches!(sent[1], Command::CalibrationData { target } if target == [0.3, 0.2]));
    assert!(matches!(sent[2], Command::SaveConfig));
    Ok(())
}

#[test]
fn query_streams_states_and_keeps_last_on_timeout() {
    let device = MockDevice::itchy();
    let connector = Arc::new(MockConnector::with_device(device.clone()));
    let mut query = TactileMouseQuery::new(connector, fast_options());
    assert!(query.initialize());

    device.queue_report(state_at(0.01, 0.02, 0).encode().to_vec());
    device.queue_timeout();
    device.queue_report(state_at(0.03, 0.04, 1).encode().to_vec());

    query.update();
    assert_eq!(query.position().x, 0.01);
    assert!(!query.button_pressed());

    query.update();
    assert_eq!(query.position().y, 0.02);

    query.update();
    assert_eq!(query.position().x, 0.03);
    assert!(query.button_pressed());
    assert!((query.velocity().length() - 0.5).abs() < 1e-5);
}

#[test]
fn read_failure_drops_link_and_reconnect_restores_it() {
    let device = MockDevice::itchy();
    let connector = Arc::new(MockConnector::with_device(device.clone()));
    let mut itchy = Itchy::new(connector);

    let connects = Arc::new(AtomicUsize::new(0));
    let disconnects = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    for (kind, counter) in [
        (CallbackType::Connected, &connects),
        (CallbackType::Disconnected, &disconnects),
        (CallbackType::CommunicationError, &errors),
    ] {
        let counter = Arc::clone(counter);
        itchy.add_callback(kind, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    assert!(itchy.try_connect());
    device.queue_report(state_at(0.05, 0.0, 0).encode().to_vec());
    assert_eq!(itchy.current_state(5).position, [0.05, 0.0]);

    device.queue_read_error();
    let cached = itchy.current_state(5);
    assert_eq!(cached.position, [0.05, 0.0]);
    assert!(!itchy.connected());
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);

    assert!(!itchy.set_color(itchy::Color::new(1, 1, 1)));

    assert!(itchy.connect_with_retry(2, Duration::from_millis(1)));
    assert_eq!(connects.load(Ordering::SeqCst), 2);
    assert!(itchy.set_color(itchy::Color::new(1, 1, 1)));
}

#[test]
fn drop_of_query_blanks_led_last() {
    let device = MockDevice::itchy();
    let connector = Arc::new(MockConnector::with_device(device.clone()));
    {
        let mut query = TactileMouseQuery::new(connector, fast_options());
        assert!(query.initialize());
        query.feedback(0, 0, 255);
    }

    let sent = sent_commands(&device);
    assert!(matches!(sent.last(), Some(Command::SetColor(c)) if *c == itchy::Color::BLACK));
    assert_eq!(device.close_count(), 1);
}
