use crate::constants::{
    ADDRESS_MASK, DISPLAY_HEIGHT, DISPLAY_WIDTH, KEY_COUNT, MAX_PROGRAM_SIZE, MEMORY_SIZE,
    PROGRAM_START, SPRITE_SHEET, STACK_SIZE,
};
use crate::error::LoadError;
use crate::opcode::Opcode;

/// The FrameBuffer is a row-major 64x32 grid of pixels; pixel (x, y) lives at `x + y * 64`.
/// Each cell is 0 (off) or 1 (on).
pub type FrameBuffer = [u8; DISPLAY_WIDTH * DISPLAY_HEIGHT];

/// A snapshot of the machine's internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - VF doubles as the carry/borrow/collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Pointer
/// - (sp) the next free slot of the stack
///
/// Timers
/// - 2 8-bit timers (delay & sound), each decremented once per step while nonzero
/// - a nonzero sound timer means a tone should be playing
///
/// ## Memory
/// - 16 entry stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the sprite sheet
///     - 0x200.. holds the loaded program
/// - 64x32 byte frame buffer
///
/// ## Input
/// - the pressed status of keys 0..F, written by whoever drives the machine
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_SIZE],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub keys: [bool; KEY_COUNT],
}

impl State {
    pub fn new() -> Self {
        // 0x000 - 0x050 is reserved for a sprite sheet
        let mut memory = [0; MEMORY_SIZE];
        memory[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            memory,
            frame_buffer: [0; DISPLAY_WIDTH * DISPLAY_HEIGHT],
            keys: [false; KEY_COUNT],
        }
    }

    /// Puts every field back to its power-on value
    pub fn reset(&mut self) {
        *self = State::new();
    }

    /// Copies a program into memory starting at `PROGRAM_START`.
    /// Nothing else is touched, and nothing at all if the program doesn't fit.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(LoadError::TooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Reads a byte; addresses wrap around the 12-bit address space
    pub fn read(&self, addr: u16) -> u8 {
        self.memory[usize::from(addr & ADDRESS_MASK)]
    }

    /// Writes a byte; addresses wrap around the 12-bit address space
    pub fn write(&mut self, addr: u16, value: u8) {
        self.memory[usize::from(addr & ADDRESS_MASK)] = value;
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn fetch(&self) -> Opcode {
        Opcode::from_bytes(self.read(self.pc), self.read(self.pc.wrapping_add(1)))
    }

    /// Lowest-numbered key currently held down
    pub fn pressed_key(&self) -> Option<u8> {
        self.keys.iter().position(|&pressed| pressed).map(|k| k as u8)
    }

    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
