use std::path::PathBuf;

use clap::Parser;

use vm8_core::CLOCK_SPEED;

mod keymap;
mod run;

/// Runs a ROM in a window.
///
/// Keypad: 1234 / QWER / ASDF / ZXCV. Hold Space to fast-forward and Escape to rewind.
#[derive(Parser, Debug)]
#[command(name = "vm8", version)]
pub struct Args {
    /// Path to the ROM to run
    #[arg(value_name = "ROM")]
    rom: PathBuf,

    /// Instructions executed per second; the timers count down at the same rate
    #[arg(long, default_value_t = CLOCK_SPEED)]
    hz: u32,

    /// Size of each display pixel in window pixels
    #[arg(long, default_value_t = 10)]
    scale: u32,

    /// Seed for the random number generator, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    run::run(&args)
}
