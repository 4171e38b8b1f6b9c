use proptest::prelude::*;

use vm8_core::constants::{MAX_PROGRAM_SIZE, PROGRAM_START};
use vm8_core::{Chip8, LoadError};

/// Loads V0 and V1, then runs `op`
fn run_alu(v0: u8, v1: u8, op: [u8; 2]) -> Chip8 {
    let mut chip8 = Chip8::with_seed(0);
    chip8
        .load_program(&[0x60, v0, 0x61, v1, op[0], op[1]])
        .unwrap();
    for _ in 0..3 {
        chip8.step().unwrap();
    }
    chip8
}

proptest! {
    #[test]
    fn add_sets_carry_exactly_on_overflow(v0 in any::<u8>(), v1 in any::<u8>()) {
        let chip8 = run_alu(v0, v1, [0x80, 0x14]);
        let state = chip8.state();
        prop_assert_eq!(state.v[0x0], v0.wrapping_add(v1));
        prop_assert_eq!(state.v[0xF], u8::from(u16::from(v0) + u16::from(v1) > 0xFF));
    }

    #[test]
    fn sub_sets_flag_on_borrow(v0 in any::<u8>(), v1 in any::<u8>()) {
        let chip8 = run_alu(v0, v1, [0x80, 0x15]);
        let state = chip8.state();
        prop_assert_eq!(state.v[0x0], v0.wrapping_sub(v1));
        prop_assert_eq!(state.v[0xF], u8::from(v0 < v1));
    }

    #[test]
    fn subn_clears_flag_when_vx_larger(v0 in any::<u8>(), v1 in any::<u8>()) {
        let chip8 = run_alu(v0, v1, [0x80, 0x17]);
        let state = chip8.state();
        prop_assert_eq!(state.v[0x0], v1.wrapping_sub(v0));
        prop_assert_eq!(state.v[0xF], u8::from(v0 <= v1));
    }

    #[test]
    fn shifts_move_the_dropped_bit_into_vf(v0 in any::<u8>()) {
        let right = run_alu(v0, 0, [0x80, 0x16]);
        prop_assert_eq!(right.state().v[0x0], v0 >> 1);
        prop_assert_eq!(right.state().v[0xF], v0 & 0x1);

        let left = run_alu(v0, 0, [0x80, 0x1E]);
        prop_assert_eq!(left.state().v[0x0], v0 << 1);
        prop_assert_eq!(left.state().v[0xF], v0 >> 7);
    }

    #[test]
    fn bcd_digits_recombine(value in any::<u8>()) {
        let mut chip8 = Chip8::with_seed(0);
        // V0 = value; I = 0x400; store bcd
        chip8.load_program(&[0x60, value, 0xA4, 0x00, 0xF0, 0x33]).unwrap();
        for _ in 0..3 {
            chip8.step().unwrap();
        }
        let digits = &chip8.state().memory[0x400..0x403];
        prop_assert!(digits.iter().all(|&d| d < 10));
        let recombined = u16::from(digits[0]) * 100 + u16::from(digits[1]) * 10 + u16::from(digits[2]);
        prop_assert_eq!(recombined, u16::from(value));
    }

    #[test]
    fn drawing_twice_restores_a_blank_screen(x in any::<u8>(), y in 0u8..32, glyph in 0u8..16) {
        let mut chip8 = Chip8::with_seed(0);
        chip8
            .load_program(&[0x60, x, 0x61, y, 0x62, glyph, 0xF2, 0x29, 0xD0, 0x15, 0xD0, 0x15])
            .unwrap();
        for _ in 0..4 {
            chip8.step().unwrap();
        }
        prop_assert!(chip8.step().unwrap());
        let drawn = chip8.frame().iter().filter(|&&p| p == 1).count();
        prop_assert!(chip8.step().unwrap());
        prop_assert!(chip8.frame().iter().all(|&p| p == 0));
        // every lit pixel of the second draw hit a lit pixel of the first
        prop_assert_eq!(chip8.state().v[0xF], u8::from(drawn > 0));
    }

    #[test]
    fn random_bytes_respect_the_mask(seed in any::<u64>(), mask in any::<u8>()) {
        let mut chip8 = Chip8::with_seed(seed);
        chip8.load_program(&[0xC3, mask]).unwrap();
        chip8.step().unwrap();
        prop_assert_eq!(chip8.state().v[0x3] & !mask, 0);
        prop_assert_eq!(chip8.state().pc, PROGRAM_START + 2);
    }

    #[test]
    fn programs_load_only_when_they_fit(len in 0usize..4097) {
        let mut chip8 = Chip8::with_seed(0);
        let program = vec![0xA5; len];
        match chip8.load_program(&program) {
            Ok(()) => prop_assert!(len <= MAX_PROGRAM_SIZE),
            Err(LoadError::TooLarge { size, max }) => {
                prop_assert!(len > MAX_PROGRAM_SIZE);
                prop_assert_eq!(size, len);
                prop_assert_eq!(max, MAX_PROGRAM_SIZE);
            }
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }
}
