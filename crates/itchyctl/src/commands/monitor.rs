//! State streaming and the interactive smoke check

use anyhow::Result;
use colored::*;
use itchy::{Color, PositionQuery};
use std::time::{Duration, Instant};

use crate::error::CliError;
use crate::output;
use crate::session::Session;

const SMOKE_COLORS: [(&str, Color); 3] = [
    ("red", Color::new(255, 0, 0)),
    ("green", Color::new(0, 255, 0)),
    ("blue", Color::new(0, 0, 255)),
];

/// Initialize, read one state and cycle the LED through red, green and blue.
pub fn smoke(session: &Session, interval: Duration) -> Result<()> {
    let backend = session.connect()?;
    let mut query = session.query(&backend, session.query_options());

    if !query.initialize() {
        return Err(CliError::DeviceNotFound(session.config.device.to_string()).into());
    }
    println!("{}", "Device initialized".green());

    query.update();
    let velocity = query.velocity();
    println!("Velocity: {}", velocity);
    println!("Velocity length: {}", velocity.length());
    println!("Button pressed: {}", query.button_pressed());

    for (name, color) in SMOKE_COLORS {
        println!("LED {}", name);
        query.feedback(color.r, color.g, color.b);
        std::thread::sleep(interval);
    }
    Ok(())
}

/// Print state reports until `duration` elapses, or forever.
pub fn monitor(session: &Session, duration: Option<Duration>, json: bool) -> Result<()> {
    let backend = session.connect()?;
    let mut device = session.open_device(&backend)?;
    let timeout_ms = session.query_options().timeout_ms;

    if !json {
        match duration {
            Some(d) => println!("Monitoring for {:.1}s", d.as_secs_f32()),
            None => println!("Monitoring (Press Ctrl+C to stop)"),
        }
    }

    let start = Instant::now();
    let mut last = device.last_state();
    while duration.is_none_or(|d| start.elapsed() < d) {
        let state = device.current_state(timeout_ms);
        if !device.connected() {
            return Err(CliError::CommandRejected("device disconnected".to_string()).into());
        }
        if state != last {
            output::print_state(&state, json);
            last = state;
        }
    }
    Ok(())
}
