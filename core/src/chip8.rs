use std::collections::VecDeque;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::constants::{KEY_COUNT, MAX_SAVED_STATES};
use crate::error::{LoadError, StepError};
use crate::instruction::{Effect, Instruction};
use crate::state::{FrameBuffer, State};

/// Runs a single fetch-decode-execute cycle against `state`.
///
/// - fetches the opcode at the pc and decodes it
/// - executes it, which moves the pc
/// - decrements both timers, unless the instruction is still waiting on a key
///
/// Returns whether the frame buffer was touched. Nothing is modified when an error is returned.
pub fn step(state: &mut State, rng: &mut dyn RngCore) -> Result<bool, StepError> {
    let pc = state.pc;
    let op = state.fetch();
    let instruction =
        Instruction::decode(op).map_err(|source| StepError::Decode { pc, source })?;
    trace!(
        "{} v{:02X?} i{:04X} pc{:04X}",
        op,
        state.v,
        state.i,
        state.pc
    );

    let effect = instruction.execute(state, rng)?;
    if effect == Effect::AwaitingKey {
        return Ok(false);
    }
    state.tick_timers();
    Ok(effect == Effect::Redraw)
}

/// # Chip-8
/// The virtual machine as seen by whatever drives it.
///
/// Tracks:
///  - current `state`, including the keypad
///  - `previous_states` for rewinding
///  - the random number source used by `Cxkk`
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys
/// - advancing and reversing the CPU
/// - inspecting its frame buffer and sound timer
pub struct Chip8 {
    state: State,
    previous_states: VecDeque<State>,
    rng: StdRng,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A machine whose random numbers are reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Chip8 {
            state: State::new(),
            previous_states: VecDeque::with_capacity(MAX_SAVED_STATES),
            rng,
        }
    }

    /// Puts the machine back to its power-on state and forgets its history
    pub fn reset(&mut self) {
        self.state.reset();
        self.previous_states.clear();
    }

    /// Load a rom from a byte slice
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.state.load_program(program)?;
        debug!("loaded {} byte program", program.len());
        Ok(())
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// The frame buffer, for rendering by some display
    pub fn frame(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Whether a tone should currently be playing
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 4-bit representation of the key that was pressed
    pub fn key_press(&mut self, key: u8) {
        if let Some(pressed) = self.state.keys.get_mut(usize::from(key)) {
            *pressed = true;
        }
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 4-bit representation of the key that was released
    pub fn key_release(&mut self, key: u8) {
        if let Some(pressed) = self.state.keys.get_mut(usize::from(key)) {
            *pressed = false;
        }
    }

    /// Replaces the whole keypad snapshot
    pub fn set_keys(&mut self, keys: [bool; KEY_COUNT]) {
        self.state.keys = keys;
    }

    /// Advances the CPU by a single cycle, remembering where it was beforehand.
    /// Returns whether the display needs to be redrawn.
    pub fn step(&mut self) -> Result<bool, StepError> {
        let before = self.state;
        let redraw = step(&mut self.state, &mut self.rng)?;
        self.save_state(before);
        Ok(redraw)
    }

    /// Reverses the CPU by a single cycle if possible
    /// - if there are previous_states, pops the last one and restores it
    /// - keys currently held stay held
    ///
    /// Returns whether anything was restored
    pub fn reverse(&mut self) -> bool {
        match self.previous_states.pop_front() {
            Some(mut state) => {
                state.keys = self.state.keys;
                self.state = state;
                true
            }
            None => false,
        }
    }

    /// Puts a state in previous_states
    /// - if there are already MAX_SAVED_STATES saved then the oldest is dropped
    fn save_state(&mut self, state: State) {
        if self.previous_states.len() == MAX_SAVED_STATES {
            self.previous_states.pop_back();
        }
        self.previous_states.push_front(state);
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
