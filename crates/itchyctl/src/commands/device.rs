//! Device configuration commands

use anyhow::Result;
use itchy::{Color, Itchy, SimulationParameters};
use itchy_protocol::Command;
use tracing::info;

use crate::error::CliError;
use crate::output;
use crate::session::Session;

/// List all matching devices
pub fn list_devices(session: &Session, json: bool) -> Result<()> {
    let backend = session.connect()?;
    let devices: Vec<_> = backend
        .connector()
        .list()
        .map_err(|e| CliError::DeviceNotFound(e.to_string()))?
        .into_iter()
        .filter(|d| d.matches(&session.config.device))
        .collect();
    output::print_device_list(&devices, json);
    Ok(())
}

pub fn set_color(session: &Session, color: Color, json: bool) -> Result<()> {
    with_device(session, |device| device.try_set_color(color))?;
    output::print_success(
        &format!("LED set to ({}, {}, {})", color.r, color.g, color.b),
        json,
    );
    Ok(())
}

pub fn set_parameters(session: &Session, params: SimulationParameters, json: bool) -> Result<()> {
    // Reject bad input before touching the device.
    params
        .validate()
        .map_err(|e| CliError::ValidationError(e.to_string()))?;

    with_device(session, |device| device.try_set_simulation(params))?;
    output::print_success(
        &format!(
            "Simulation parameters sent (mass {} kg, stiffness {} N/m, damping {} N·s/m, update {} ms)",
            params.mass, params.stiffness, params.damping, params.update_rate_ms
        ),
        json,
    );
    Ok(())
}

/// Send the calibration rectangle, given in centimetres.
pub fn set_calibration_target(
    session: &Session,
    width_cm: f32,
    height_cm: f32,
    json: bool,
) -> Result<()> {
    let target = calibration_target_metres(width_cm, height_cm)?;
    with_device(session, |device| device.try_set_calibration_parameters(target))?;
    output::print_success(
        &format!("Calibration target set to {width_cm} x {height_cm} cm"),
        json,
    );
    Ok(())
}

pub fn start_calibration(session: &Session, json: bool) -> Result<()> {
    with_device(session, |device| device.send(Command::Calibrate))?;
    output::print_success(
        "Calibration started: move horizontally across the target and press the thumb button; \
         when the LED turns yellow press it again, then move vertically and press it a third time",
        json,
    );
    Ok(())
}

pub fn save(session: &Session, json: bool) -> Result<()> {
    with_device(session, |device| device.send(Command::SaveConfig))?;
    output::print_success("Configuration saved to device", json);
    Ok(())
}

/// Push the simulation parameters and calibration target from the config file.
pub fn apply(session: &Session, json: bool) -> Result<()> {
    let config = &session.config;
    if config.simulation.is_none() && config.calibration_target.is_none() {
        output::print_success("Nothing to apply", json);
        return Ok(());
    }

    let backend = session.connect()?;
    let mut device = session.open_device(&backend)?;

    if let Some(params) = config.simulation {
        device
            .try_set_simulation(params)
            .map_err(CliError::from_command)?;
        info!(?params, "Applied simulation parameters");
    }
    if let Some(target) = config.calibration_target {
        device
            .try_set_calibration_parameters(target)
            .map_err(CliError::from_command)?;
        info!(?target, "Applied calibration target");
    }

    output::print_success("Configuration applied", json);
    Ok(())
}

fn with_device<F>(session: &Session, op: F) -> Result<()>
where
    F: FnOnce(&mut Itchy) -> itchy::ItchyResult<()>,
{
    let backend = session.connect()?;
    let mut device = session.open_device(&backend)?;
    op(&mut device).map_err(CliError::from_command)?;
    Ok(())
}

fn calibration_target_metres(width_cm: f32, height_cm: f32) -> Result<[f32; 2], CliError> {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !valid(width_cm) || !valid(height_cm) {
        return Err(CliError::ValidationError(format!(
            "Calibration target must be positive, got {width_cm} x {height_cm} cm"
        )));
    }
    Ok([width_cm / 100.0, height_cm / 100.0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_converted_to_metres() -> Result<(), CliError> {
        let target = calibration_target_metres(30.0, 20.0)?;
        assert!((target[0] - 0.3).abs() < 1e-6);
        assert!((target[1] - 0.2).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn non_positive_target_rejected() {
        assert!(calibration_target_metres(0.0, 20.0).is_err());
        assert!(calibration_target_metres(10.0, -1.0).is_err());
        assert!(calibration_target_metres(f32::NAN, 1.0).is_err());
    }
}
