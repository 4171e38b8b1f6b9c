use rand::{Rng, RngCore};

use crate::constants::{ADDRESS_MASK, DISPLAY_WIDTH, SPRITE_HEIGHT, STACK_SIZE};
use crate::error::StepError;
use crate::instruction::Register;
use crate::state::State;

fn next(state: &mut State) {
    state.pc = state.pc.wrapping_add(0x2);
}

fn skip_if(state: &mut State, condition: bool) {
    let delta = if condition { 0x4 } else { 0x2 };
    state.pc = state.pc.wrapping_add(delta);
}

fn vx(state: &State, x: Register) -> u8 {
    state.v[usize::from(x)]
}

fn set_vx(state: &mut State, x: Register, value: u8) {
    state.v[usize::from(x)] = value;
}

/// clear
pub fn clr(state: &mut State) {
    state.frame_buffer.iter_mut().for_each(|pixel| *pixel = 0);
    next(state);
}

/// PC = STACK.pop() + 2
/// The saved address is the call itself, so step past it
pub fn rts(state: &mut State) -> Result<(), StepError> {
    if state.sp == 0 {
        return Err(StepError::StackUnderflow { pc: state.pc });
    }
    state.sp -= 1;
    state.pc = state.stack[usize::from(state.sp)];
    next(state);
    Ok(())
}

/// PC = addr
pub fn jump(state: &mut State, addr: u16) {
    state.pc = addr;
}

/// STACK.push(PC); PC = addr
pub fn call(state: &mut State, addr: u16) -> Result<(), StepError> {
    if usize::from(state.sp) >= STACK_SIZE {
        return Err(StepError::StackOverflow { pc: state.pc });
    }
    state.stack[usize::from(state.sp)] = state.pc;
    state.sp += 1;
    state.pc = addr;
    Ok(())
}

/// if Vx == kk then pc += 2
pub fn ske(state: &mut State, x: Register, kk: u8) {
    let condition = vx(state, x) == kk;
    skip_if(state, condition);
}

/// if Vx != kk then pc += 2
pub fn skne(state: &mut State, x: Register, kk: u8) {
    let condition = vx(state, x) != kk;
    skip_if(state, condition);
}

/// if Vx == Vy then pc += 2
pub fn skre(state: &mut State, x: Register, y: Register) {
    let condition = vx(state, x) == vx(state, y);
    skip_if(state, condition);
}

/// Vx = kk
pub fn load(state: &mut State, x: Register, kk: u8) {
    set_vx(state, x, kk);
    next(state);
}

/// Vx += kk
/// Overflow wraps and leaves VF alone
pub fn add(state: &mut State, x: Register, kk: u8) {
    let res = vx(state, x).wrapping_add(kk);
    set_vx(state, x, res);
    next(state);
}

/// Vx = Vy
pub fn mv(state: &mut State, x: Register, y: Register) {
    let res = vx(state, y);
    set_vx(state, x, res);
    next(state);
}

/// Vx |= Vy
pub fn or(state: &mut State, x: Register, y: Register) {
    let res = vx(state, x) | vx(state, y);
    set_vx(state, x, res);
    next(state);
}

/// Vx &= Vy
pub fn and(state: &mut State, x: Register, y: Register) {
    let res = vx(state, x) & vx(state, y);
    set_vx(state, x, res);
    next(state);
}

/// Vx ^= Vy
pub fn xor(state: &mut State, x: Register, y: Register) {
    let res = vx(state, x) ^ vx(state, y);
    set_vx(state, x, res);
    next(state);
}

/// Vx += Vy; VF = overflow
pub fn addr(state: &mut State, x: Register, y: Register) {
    let (res, over) = vx(state, x).overflowing_add(vx(state, y));
    set_vx(state, x, res);
    state.v[0xF] = u8::from(over);
    next(state);
}

/// Vx -= Vy; VF = underflow
pub fn sub(state: &mut State, x: Register, y: Register) {
    let (res, under) = vx(state, x).overflowing_sub(vx(state, y));
    set_vx(state, x, res);
    state.v[0xF] = u8::from(under);
    next(state);
}

/// VF = Vx & 1; Vx >>= 1
pub fn shr(state: &mut State, x: Register) {
    let value = vx(state, x);
    state.v[0xF] = value & 0x1;
    set_vx(state, x, value >> 1);
    next(state);
}

/// Vx = Vy - Vx; VF = !(Vx > Vy)
pub fn subn(state: &mut State, x: Register, y: Register) {
    let (before_x, before_y) = (vx(state, x), vx(state, y));
    set_vx(state, x, before_y.wrapping_sub(before_x));
    state.v[0xF] = u8::from(before_x <= before_y);
    next(state);
}

/// VF = Vx >> 7; Vx <<= 1
pub fn shl(state: &mut State, x: Register) {
    let value = vx(state, x);
    state.v[0xF] = value >> 7;
    set_vx(state, x, value << 1);
    next(state);
}

/// if Vx != Vy then pc += 2
pub fn skrne(state: &mut State, x: Register, y: Register) {
    let condition = vx(state, x) != vx(state, y);
    skip_if(state, condition);
}

/// I = addr
pub fn loadi(state: &mut State, addr: u16) {
    state.i = addr;
    next(state);
}

/// PC = V0 + addr
pub fn jumpi(state: &mut State, addr: u16) {
    state.pc = u16::from(state.v[0x0]) + addr;
}

/// Vx = rand_byte & kk
pub fn rand(state: &mut State, x: Register, kk: u8, rng: &mut dyn RngCore) {
    let rand_byte: u8 = rng.gen();
    set_vx(state, x, rand_byte & kk);
    next(state);
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the sprite in memory I..I+n onto the FrameBuffer at (Vx, Vy).
/// Pixels are addressed linearly as `x + y * 64`: a sprite running off the right edge continues
/// on the next row, and anything past the last row is dropped.
/// Sets VF if any pixels were erased
pub fn draw(state: &mut State, x: Register, y: Register, n: u8) {
    let origin_x = usize::from(vx(state, x));
    let origin_y = usize::from(vx(state, y));

    // Reset the carry flag (used for collision detection)
    state.v[0xF] = 0x0;

    for row in 0..n {
        let sprite = state.read(state.i.wrapping_add(u16::from(row)));
        let row_start = (origin_y + usize::from(row)) * DISPLAY_WIDTH + origin_x;
        for bit in 0..8 {
            if (sprite >> (7 - bit)) & 0x1 == 0 {
                continue;
            }
            if let Some(pixel) = state.frame_buffer.get_mut(row_start + bit) {
                if *pixel == 0x1 {
                    state.v[0xF] = 0x1;
                }
                *pixel ^= 0x1;
            }
        }
    }
    next(state);
}

fn key_down(state: &State, x: Register) -> bool {
    state.keys[usize::from(vx(state, x) & 0xF)]
}

/// if Vx.pressed then pc += 2
pub fn skpr(state: &mut State, x: Register) {
    let condition = key_down(state, x);
    skip_if(state, condition);
}

/// if !Vx.pressed then pc += 2
pub fn skup(state: &mut State, x: Register) {
    let condition = !key_down(state, x);
    skip_if(state, condition);
}

/// Vx = DT
pub fn moved(state: &mut State, x: Register) {
    let res = state.delay_timer;
    set_vx(state, x, res);
    next(state);
}

/// await keypress for Vx
/// Returns false without moving the pc while no key is held
pub fn keyd(state: &mut State, x: Register) -> bool {
    match state.pressed_key() {
        Some(key) => {
            set_vx(state, x, key);
            next(state);
            true
        }
        None => false,
    }
}

/// DT = Vx
pub fn loadd(state: &mut State, x: Register) {
    state.delay_timer = vx(state, x);
    next(state);
}

/// ST = Vx
pub fn loads(state: &mut State, x: Register) {
    state.sound_timer = vx(state, x);
    next(state);
}

/// I += Vx; VF = I overflowed 12 bits
pub fn addi(state: &mut State, x: Register) {
    let sum = u32::from(state.i) + u32::from(vx(state, x));
    state.v[0xF] = u8::from(sum > u32::from(ADDRESS_MASK));
    state.i = (sum & u32::from(ADDRESS_MASK)) as u16;
    next(state);
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(state: &mut State, x: Register) {
    state.i = u16::from(vx(state, x)) * SPRITE_HEIGHT;
    next(state);
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(state: &mut State, x: Register) {
    let value = vx(state, x);
    let digits = [value / 100, value / 10 % 10, value % 10];
    for (offset, digit) in (0u16..).zip(digits.iter()) {
        state.write(state.i.wrapping_add(offset), *digit);
    }
    next(state);
}

/// mem[I..=I+x] = V0..=Vx; I += x + 1
pub fn stor(state: &mut State, x: Register) {
    for reg in 0..=x {
        let value = vx(state, reg);
        state.write(state.i.wrapping_add(u16::from(reg)), value);
    }
    state.i = state.i.wrapping_add(u16::from(x) + 1) & ADDRESS_MASK;
    next(state);
}

/// V0..=Vx = mem[I..=I+x]; I += x + 1
pub fn read(state: &mut State, x: Register) {
    for reg in 0..=x {
        let value = state.read(state.i.wrapping_add(u16::from(reg)));
        set_vx(state, reg, value);
    }
    state.i = state.i.wrapping_add(u16::from(x) + 1) & ADDRESS_MASK;
    next(state);
}
