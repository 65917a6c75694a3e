//! VoltLab - circuit evaluation demo
//!
//! Loads a saved circuit, assembles it, runs the engine for a number
//! of ticks, and prints the resulting readings.
//!
//! # Usage
//!
//! ```bash
//! voltlab circuit.json --ticks 120
//! ```

use std::path::PathBuf;

use clap::Parser;
use voltlab_core::{
    circuit::ComponentId,
    error::Result,
    persist, ComponentKind, Control, VoltLabError,
};

/// Circuit evaluation engine demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the saved circuit file (.json)
    #[arg(value_name = "CIRCUIT_FILE")]
    circuit_file: PathBuf,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 60)]
    ticks: u64,

    /// Registry index of the power source to assemble from
    /// (defaults to the first power source found)
    #[arg(long)]
    head: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut control = persist::load_from_path(&args.circuit_file)?;

    let head = match args.head {
        Some(index) => ComponentId(index),
        None => find_head(&control)?,
    };
    control.assemble(head)?;

    for _ in 0..args.ticks {
        control.tick()?;
    }

    print_readings(&control);
    Ok(())
}

/// First power source in registry order.
fn find_head(control: &Control) -> Result<ComponentId> {
    control
        .components()
        .iter()
        .find(|c| c.is_power_source())
        .map(|c| c.id)
        .ok_or_else(|| VoltLabError::malformed_save("no power source in saved circuit"))
}

fn print_readings(control: &Control) {
    let env = control.env();
    println!(
        "after {} ticks: temperature {:.2} C, light level {:.2}",
        env.tick, env.temperature, env.light_level
    );
    for comp in control.components() {
        print!(
            "{:>4}  {:<16} {:>10.4} V {:>10.4} A",
            comp.id.to_string(),
            comp.kind.tag(),
            comp.voltage,
            comp.current
        );
        if comp.blown {
            print!("  [blown]");
        }
        if comp.luminous {
            print!("  [lit]");
        }
        match &comp.kind {
            ComponentKind::Capacitor(_) => {
                if let Some(pct) = comp.capacitor_percentage() {
                    print!("  charge {pct:.1}%");
                }
            }
            ComponentKind::Heater(_) => {
                if let Some(t) = comp.heater_temperature() {
                    print!("  +{t:.2} C");
                }
            }
            ComponentKind::Motor(_) => {
                if let Some(a) = comp.motor_angle() {
                    print!("  angle {a:.3} rad");
                }
            }
            ComponentKind::Ammeter(_) | ComponentKind::Voltmeter(_) => {
                if let Some(r) = comp.meter_reading() {
                    print!("  reads {r:.4}");
                }
            }
            _ => {}
        }
        println!();
    }
}
