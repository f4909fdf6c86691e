//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use itchy::{DeviceState, HidDeviceInfo, ItchyConfig, Vec2};
use serde_json::json;
use std::path::Path;

pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to format error as JSON: {}", e),
    }
}

pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

pub fn print_success(message: &str, json: bool) {
    if json {
        let output = json!({ "success": true, "message": message });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Failed to format result as JSON: {}", e),
        }
    } else {
        println!("{} {}", "✓".green(), message);
    }
}

pub fn print_device_list(devices: &[HidDeviceInfo], json: bool) {
    if json {
        let output = json!({
            "success": true,
            "devices": devices
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Failed to format device list as JSON: {}", e),
        }
        return;
    }

    if devices.is_empty() {
        println!("{}", "No ITCHy devices found".yellow());
        return;
    }

    println!("{}", "Connected Devices:".bold());
    for device in devices {
        println!(
            "  {} {} ({:04X}:{:04X})",
            "●".green(),
            device.display_name().bold(),
            device.vendor_id,
            device.product_id
        );
        println!("    Path: {}", device.path.dimmed());
        if let Some(serial) = &device.serial_number {
            println!("    Serial: {}", serial);
        }
    }
}

/// One state report per line.
pub fn print_state(state: &DeviceState, json: bool) {
    if json {
        match serde_json::to_string(state) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Failed to format state as JSON: {}", e),
        }
        return;
    }

    let button = if state.button_pressed() {
        "pressed".green()
    } else {
        "released".dimmed()
    };
    println!(
        "t={:>8.3}s pos={} vel={} angle={:+.4} rad ω={:+.4} rad/s button={}",
        state.time,
        Vec2::from(state.position),
        Vec2::from(state.velocity),
        state.angle,
        state.angular_velocity,
        button
    );
}

pub fn print_config(config: &ItchyConfig, path: &Path, json: bool) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(config)?;
    if json {
        println!("{}", rendered);
    } else {
        println!("{} {}", "Config:".bold(), path.display());
        println!("{}", rendered);
    }
    Ok(())
}
