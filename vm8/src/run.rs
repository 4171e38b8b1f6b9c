use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use vm8_core::constants::MAX_PROGRAM_SIZE;
use vm8_core::{Chip8, LoadError};
use vm8_display::Display;

use crate::keymap::keymap;
use crate::Args;

/// Reads a whole ROM file, checking its size before reading a byte of it
pub fn read_rom(path: &Path) -> Result<Vec<u8>, LoadError> {
    let mut file = File::open(path)?;
    let expected = file.metadata()?.len() as usize;
    read_program(&mut file, expected)
}

/// Reads exactly `expected` bytes of program from `reader`
fn read_program(reader: &mut dyn Read, expected: usize) -> Result<Vec<u8>, LoadError> {
    if expected > MAX_PROGRAM_SIZE {
        return Err(LoadError::TooLarge {
            size: expected,
            max: MAX_PROGRAM_SIZE,
        });
    }

    let mut rom = Vec::with_capacity(expected);
    reader.take(expected as u64).read_to_end(&mut rom)?;
    if rom.len() != expected {
        return Err(LoadError::ShortRead {
            expected,
            read: rom.len(),
        });
    }
    Ok(rom)
}

pub fn run(args: &Args) -> Result<()> {
    let mut chip8 = match args.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };

    // Load ROM
    let rom = read_rom(&args.rom).with_context(|| format!("loading {}", args.rom.display()))?;
    chip8.load_program(&rom)?;
    info!("loaded {} byte ROM from {}", rom.len(), args.rom.display());

    // Get SDL2 context
    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let mut display = Display::new(&sdl, "vm8", args.scale).map_err(anyhow::Error::msg)?;
    let mut events = sdl.event_pump().map_err(anyhow::Error::msg)?;

    // Set initial timing
    let cycle_time = Duration::from_secs(1) / args.hz.max(1);
    let mut last_cycle = Instant::now();

    // Whether or not the clock speed should be respected
    let mut fast_forward = false;
    // Whether the program's state should be cycled forwards or backwards
    let mut rewind = false;

    'event: loop {
        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => chip8.key_press(kc),
                    (Keycode::Space, _) => fast_forward = true,
                    (Keycode::Escape, _) => rewind = true,
                    _ => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => chip8.key_release(kc),
                    (Keycode::Space, _) => fast_forward = false,
                    (Keycode::Escape, _) => rewind = false,
                    _ => continue,
                },
                _ => continue,
            };
        }

        // Update state
        let redraw = if rewind {
            chip8.reverse()
        } else {
            chip8.step().context("halting")?
        };

        if redraw {
            display.render(chip8.frame()).map_err(anyhow::Error::msg)?;
        }

        // Handle timing
        let current_time = Instant::now();
        let elapsed_cycle_time = current_time - last_cycle;
        if !fast_forward && cycle_time > elapsed_cycle_time {
            std::thread::sleep(cycle_time - elapsed_cycle_time);
        }
        last_cycle = Instant::now();
    }

    info!("window closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    use tempfile::TempDir;

    fn scratch_file(contents: &[u8]) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rom.ch8");
        File::create(&path).unwrap().write_all(contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_read_rom() {
        let (_dir, path) = scratch_file(&[0x00, 0xE0, 0x12, 0x00]);
        assert_eq!(read_rom(&path).unwrap(), vec![0x00, 0xE0, 0x12, 0x00]);
    }

    #[test]
    fn test_read_rom_accepts_max_size() {
        let (_dir, path) = scratch_file(&vec![0; MAX_PROGRAM_SIZE]);
        assert_eq!(read_rom(&path).unwrap().len(), MAX_PROGRAM_SIZE);
    }

    #[test]
    fn test_read_rom_rejects_oversized() {
        let (_dir, path) = scratch_file(&vec![0; MAX_PROGRAM_SIZE + 1]);
        assert!(matches!(
            read_rom(&path),
            Err(LoadError::TooLarge { size: 3585, .. })
        ));
    }

    #[test]
    fn test_read_rom_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.ch8");
        assert!(matches!(read_rom(&path), Err(LoadError::Io(_))));
    }

    #[test]
    fn test_read_program_short_read() {
        let mut reader: &[u8] = &[0x00, 0xE0, 0x12];
        match read_program(&mut reader, 8) {
            Err(LoadError::ShortRead { expected, read }) => {
                assert_eq!(expected, 8);
                assert_eq!(read, 3);
            }
            other => panic!("expected ShortRead, got {:?}", other),
        }
    }

    #[test]
    fn test_read_program_reports_read_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "unplugged"))
            }
        }
        assert!(matches!(
            read_program(&mut Broken, 2),
            Err(LoadError::Io(_))
        ));
    }
}
