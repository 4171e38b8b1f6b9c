pub use chip8::{step, Chip8};
pub use constants::CLOCK_SPEED;
pub use error::{DecodeError, LoadError, StepError};
pub use instruction::{Effect, Instruction};
pub use opcode::Opcode;

mod chip8;
pub mod constants;
mod error;
mod instruction;
mod opcode;
mod operations;
pub mod state;
