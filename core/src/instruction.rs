use rand::RngCore;

use crate::error::{DecodeError, StepError};
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// Index of one of the V0..VF registers
pub type Register = u8;

/// A decoded instruction with its operands pulled out of the opcode.
/// Variant names follow the mnemonic of the operation each one runs (see `operations`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Clr,
    /// 00EE
    Rts,
    /// 1nnn
    Jump { addr: u16 },
    /// 2nnn
    Call { addr: u16 },
    /// 3xkk
    Ske { x: Register, kk: u8 },
    /// 4xkk
    Skne { x: Register, kk: u8 },
    /// 5xy0
    Skre { x: Register, y: Register },
    /// 6xkk
    Load { x: Register, kk: u8 },
    /// 7xkk
    Add { x: Register, kk: u8 },
    /// 8xy0
    Mv { x: Register, y: Register },
    /// 8xy1
    Or { x: Register, y: Register },
    /// 8xy2
    And { x: Register, y: Register },
    /// 8xy3
    Xor { x: Register, y: Register },
    /// 8xy4
    Addr { x: Register, y: Register },
    /// 8xy5
    Sub { x: Register, y: Register },
    /// 8xy6
    Shr { x: Register },
    /// 8xy7
    Subn { x: Register, y: Register },
    /// 8xyE
    Shl { x: Register },
    /// 9xy0
    Skrne { x: Register, y: Register },
    /// Annn
    Loadi { addr: u16 },
    /// Bnnn
    Jumpi { addr: u16 },
    /// Cxkk
    Rand { x: Register, kk: u8 },
    /// Dxyn
    Draw { x: Register, y: Register, n: u8 },
    /// Ex9E
    Skpr { x: Register },
    /// ExA1
    Skup { x: Register },
    /// Fx07
    Moved { x: Register },
    /// Fx0A
    Keyd { x: Register },
    /// Fx15
    Loadd { x: Register },
    /// Fx18
    Loads { x: Register },
    /// Fx1E
    Addi { x: Register },
    /// Fx29
    Ldspr { x: Register },
    /// Fx33
    Bcd { x: Register },
    /// Fx55
    Stor { x: Register },
    /// Fx65
    Read { x: Register },
}

/// What a single instruction did, as far as the step loop cares
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Nothing outside of registers and memory changed
    Continue,
    /// The frame buffer was touched
    Redraw,
    /// Waiting for a key; the pc was left where it was
    AwaitingKey,
}

impl Instruction {
    /// Selects the correct Instruction for a given Opcode
    pub fn decode(op: Opcode) -> Result<Instruction, DecodeError> {
        let (x, y, n, kk, addr) = (op.x(), op.y(), op.n(), op.kk(), op.addr());
        let instruction = match op.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => Instruction::Clr,
            (0x0, 0x0, 0xE, 0xE) => Instruction::Rts,
            (0x1, ..) => Instruction::Jump { addr },
            (0x2, ..) => Instruction::Call { addr },
            (0x3, ..) => Instruction::Ske { x, kk },
            (0x4, ..) => Instruction::Skne { x, kk },
            (0x5, ..) => Instruction::Skre { x, y },
            (0x6, ..) => Instruction::Load { x, kk },
            (0x7, ..) => Instruction::Add { x, kk },
            (0x8, .., 0x0) => Instruction::Mv { x, y },
            (0x8, .., 0x1) => Instruction::Or { x, y },
            (0x8, .., 0x2) => Instruction::And { x, y },
            (0x8, .., 0x3) => Instruction::Xor { x, y },
            (0x8, .., 0x4) => Instruction::Addr { x, y },
            (0x8, .., 0x5) => Instruction::Sub { x, y },
            (0x8, .., 0x6) => Instruction::Shr { x },
            (0x8, .., 0x7) => Instruction::Subn { x, y },
            (0x8, .., 0xE) => Instruction::Shl { x },
            (0x9, ..) => Instruction::Skrne { x, y },
            (0xA, ..) => Instruction::Loadi { addr },
            (0xB, ..) => Instruction::Jumpi { addr },
            (0xC, ..) => Instruction::Rand { x, kk },
            (0xD, ..) => Instruction::Draw { x, y, n },
            (0xE, .., 0x9, 0xE) => Instruction::Skpr { x },
            (0xE, .., 0xA, 0x1) => Instruction::Skup { x },
            (0xF, .., 0x0, 0x7) => Instruction::Moved { x },
            (0xF, .., 0x0, 0xA) => Instruction::Keyd { x },
            (0xF, .., 0x1, 0x5) => Instruction::Loadd { x },
            (0xF, .., 0x1, 0x8) => Instruction::Loads { x },
            (0xF, .., 0x1, 0xE) => Instruction::Addi { x },
            (0xF, .., 0x2, 0x9) => Instruction::Ldspr { x },
            (0xF, .., 0x3, 0x3) => Instruction::Bcd { x },
            (0xF, .., 0x5, 0x5) => Instruction::Stor { x },
            (0xF, .., 0x6, 0x5) => Instruction::Read { x },
            _ => return Err(DecodeError { opcode: op.0 }),
        };
        Ok(instruction)
    }

    /// Applies the instruction to `state`.
    /// `rng` is only consulted by `Rand`.
    pub fn execute(self, state: &mut State, rng: &mut dyn RngCore) -> Result<Effect, StepError> {
        match self {
            Instruction::Clr => {
                clr(state);
                return Ok(Effect::Redraw);
            }
            Instruction::Rts => rts(state)?,
            Instruction::Jump { addr } => jump(state, addr),
            Instruction::Call { addr } => call(state, addr)?,
            Instruction::Ske { x, kk } => ske(state, x, kk),
            Instruction::Skne { x, kk } => skne(state, x, kk),
            Instruction::Skre { x, y } => skre(state, x, y),
            Instruction::Load { x, kk } => load(state, x, kk),
            Instruction::Add { x, kk } => add(state, x, kk),
            Instruction::Mv { x, y } => mv(state, x, y),
            Instruction::Or { x, y } => or(state, x, y),
            Instruction::And { x, y } => and(state, x, y),
            Instruction::Xor { x, y } => xor(state, x, y),
            Instruction::Addr { x, y } => addr(state, x, y),
            Instruction::Sub { x, y } => sub(state, x, y),
            Instruction::Shr { x } => shr(state, x),
            Instruction::Subn { x, y } => subn(state, x, y),
            Instruction::Shl { x } => shl(state, x),
            Instruction::Skrne { x, y } => skrne(state, x, y),
            Instruction::Loadi { addr } => loadi(state, addr),
            Instruction::Jumpi { addr } => jumpi(state, addr),
            Instruction::Rand { x, kk } => rand(state, x, kk, rng),
            Instruction::Draw { x, y, n } => {
                draw(state, x, y, n);
                return Ok(Effect::Redraw);
            }
            Instruction::Skpr { x } => skpr(state, x),
            Instruction::Skup { x } => skup(state, x),
            Instruction::Moved { x } => moved(state, x),
            Instruction::Keyd { x } => {
                if !keyd(state, x) {
                    return Ok(Effect::AwaitingKey);
                }
            }
            Instruction::Loadd { x } => loadd(state, x),
            Instruction::Loads { x } => loads(state, x),
            Instruction::Addi { x } => addi(state, x),
            Instruction::Ldspr { x } => ldspr(state, x),
            Instruction::Bcd { x } => bcd(state, x),
            Instruction::Stor { x } => stor(state, x),
            Instruction::Read { x } => read(state, x),
        }
        Ok(Effect::Continue)
    }
}

#[cfg(test)]
mod test_instruction {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn decode(raw: u16) -> Result<Instruction, DecodeError> {
        Instruction::decode(Opcode(raw))
    }

    fn run(raw: u16, state: &mut State) -> Effect {
        let mut rng = StepRng::new(0, 0);
        decode(raw).unwrap().execute(state, &mut rng).unwrap()
    }

    #[test]
    fn test_decodes_fixed_opcodes() {
        assert_eq!(decode(0x00E0), Ok(Instruction::Clr));
        assert_eq!(decode(0x00EE), Ok(Instruction::Rts));
    }

    #[test]
    fn test_decodes_operands() {
        assert_eq!(decode(0x1ABC), Ok(Instruction::Jump { addr: 0xABC }));
        assert_eq!(decode(0x3A42), Ok(Instruction::Ske { x: 0xA, kk: 0x42 }));
        assert_eq!(decode(0x8125), Ok(Instruction::Sub { x: 0x1, y: 0x2 }));
        assert_eq!(decode(0x812E), Ok(Instruction::Shl { x: 0x1 }));
        assert_eq!(
            decode(0xD12F),
            Ok(Instruction::Draw {
                x: 0x1,
                y: 0x2,
                n: 0xF
            })
        );
        assert_eq!(decode(0xE39E), Ok(Instruction::Skpr { x: 0x3 }));
        assert_eq!(decode(0xF765), Ok(Instruction::Read { x: 0x7 }));
    }

    #[test]
    fn test_decodes_every_family() {
        let known = [
            0x00E0, 0x00EE, 0x1000, 0x2000, 0x3000, 0x4000, 0x5000, 0x6000, 0x7000, 0x8000,
            0x8001, 0x8002, 0x8003, 0x8004, 0x8005, 0x8006, 0x8007, 0x800E, 0x9000, 0xA000,
            0xB000, 0xC000, 0xD000, 0xE09E, 0xE0A1, 0xF007, 0xF00A, 0xF015, 0xF018, 0xF01E,
            0xF029, 0xF033, 0xF055, 0xF065,
        ];
        for raw in known.iter() {
            assert!(decode(*raw).is_ok(), "{:04X} should decode", raw);
        }
    }

    #[test]
    fn test_rejects_unknown_opcodes() {
        for raw in [0x0000, 0x0123, 0x00E1, 0x8008, 0x800F, 0xE19F, 0xF100, 0xF1FF].iter() {
            assert_eq!(decode(*raw), Err(DecodeError { opcode: *raw }));
        }
    }

    #[test]
    fn test_register_skips_ignore_low_nibble() {
        assert_eq!(decode(0x5121), Ok(Instruction::Skre { x: 0x1, y: 0x2 }));
        assert_eq!(decode(0x9121), Ok(Instruction::Skrne { x: 0x1, y: 0x2 }));

        let mut state = State::new();
        run(0x5121, &mut state);
        assert_eq!(state.pc, 0x204);

        let mut state = State::new();
        state.v[0x1] = 0x1;
        run(0x9121, &mut state);
        assert_eq!(state.pc, 0x204);

        let mut state = State::new();
        run(0x912F, &mut state);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_clr_and_draw_request_redraw() {
        let mut state = State::new();
        assert_eq!(run(0x00E0, &mut state), Effect::Redraw);
        assert_eq!(run(0xD001, &mut state), Effect::Redraw);
        assert_eq!(run(0x6001, &mut state), Effect::Continue);
    }

    #[test]
    fn test_keyd_without_key_awaits() {
        let mut state = State::new();
        assert_eq!(run(0xF10A, &mut state), Effect::AwaitingKey);
        assert_eq!(state.pc, 0x200);
        state.keys[0x9] = true;
        assert_eq!(run(0xF10A, &mut state), Effect::Continue);
        assert_eq!(state.v[0x1], 0x9);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_rand_uses_supplied_rng() {
        let mut state = State::new();
        let mut rng = StepRng::new(0xFFFF_FFFF, 0);
        Instruction::Rand { x: 0x2, kk: 0x0F }
            .execute(&mut state, &mut rng)
            .unwrap();
        assert_eq!(state.v[0x2], 0x0F);
    }

    #[test]
    fn test_stack_errors_propagate() {
        let mut state = State::new();
        let mut rng = StepRng::new(0, 0);
        assert_eq!(
            Instruction::Rts.execute(&mut state, &mut rng),
            Err(StepError::StackUnderflow { pc: 0x200 })
        );
    }
}
