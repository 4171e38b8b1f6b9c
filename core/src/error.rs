use std::io;

use thiserror::Error;

use crate::constants::STACK_SIZE;

/// Failures while copying a program into memory.
/// The machine is left untouched whenever one of these is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("program is {size} bytes but at most {max} bytes fit in memory")]
    TooLarge { size: usize, max: usize },

    #[error("failed to read full program: expected {expected} bytes, read {read}")]
    ShortRead { expected: usize, read: usize },

    #[error("failed to read program: {0}")]
    Io(#[from] io::Error),
}

/// A 16-bit value that isn't any known instruction
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown opcode {opcode:#06X}")]
pub struct DecodeError {
    pub opcode: u16,
}

/// Failures while stepping the machine. All of them are fatal to a running program.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    #[error("{source} at pc {pc:#05X}")]
    Decode { pc: u16, source: DecodeError },

    #[error("stack overflow at pc {pc:#05X}: more than {} nested calls", STACK_SIZE)]
    StackOverflow { pc: u16 },

    #[error("stack underflow at pc {pc:#05X}: return without a matching call")]
    StackUnderflow { pc: u16 },
}

impl StepError {
    /// The program counter at the time of the failure
    pub fn pc(&self) -> u16 {
        match *self {
            StepError::Decode { pc, .. }
            | StepError::StackOverflow { pc }
            | StepError::StackUnderflow { pc } => pc,
        }
    }
}
