//! Input Capture and Recording
//!
//! Turns host input (named commands, keys, mouse buttons) into per-tick
//! `InputFrame`s, gates them with cooldowns, and records them with delta
//! compression for replay.
//!
//! Cooldowns live here rather than in the actor: the actor only knows
//! whether a transition is in flight, the caller decides how often to ask.

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::hash::{StateHash, StateHasher};
use crate::game::projectile::{CastSlot, Variant};

/// Default pause after an accepted move (ms).
pub const MOVE_COOLDOWN_MS: f64 = 200.0;

/// Default pause after a turn attempt (ms).
pub const TURN_COOLDOWN_MS: f64 = 150.0;

// =============================================================================
// COMMANDS
// =============================================================================

/// A discrete player intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Step forward (held)
    MoveForward,
    /// Step backward (held)
    MoveBackward,
    /// Strafe left (held)
    StrafeLeft,
    /// Strafe right (held)
    StrafeRight,
    /// Turn left (held)
    TurnLeft,
    /// Turn right (held)
    TurnRight,
    /// Cast a spell (one-shot)
    Cast(Variant),
    /// Toggle a torch on the wall ahead (on press)
    PlaceTorch,
}

impl Command {
    /// Parse a command name such as `moveForward` or `cast:fireball`.
    ///
    /// Unknown names log a warning and return `None`.
    pub fn parse(name: &str) -> Option<Command> {
        let command = match name {
            "moveForward" => Some(Command::MoveForward),
            "moveBackward" => Some(Command::MoveBackward),
            "strafeLeft" => Some(Command::StrafeLeft),
            "strafeRight" => Some(Command::StrafeRight),
            "turnLeft" => Some(Command::TurnLeft),
            "turnRight" => Some(Command::TurnRight),
            "placeTorch" => Some(Command::PlaceTorch),
            other => other
                .strip_prefix("cast:")
                .and_then(Variant::parse)
                .map(Command::Cast),
        };
        if command.is_none() {
            warn!(command = name, "Ignoring unknown command");
        }
        command
    }

    /// Default keyboard binding (case-insensitive key name).
    pub fn from_key(key: &str) -> Option<Command> {
        match key.to_ascii_lowercase().as_str() {
            "w" | "arrowup" => Some(Command::MoveForward),
            "s" | "arrowdown" => Some(Command::MoveBackward),
            "a" => Some(Command::StrafeLeft),
            "d" => Some(Command::StrafeRight),
            "q" | "arrowleft" => Some(Command::TurnLeft),
            "e" | "arrowright" => Some(Command::TurnRight),
            " " => Some(Command::Cast(Variant::Lightning)),
            "g" => Some(Command::Cast(Variant::GasCloud)),
            "t" => Some(Command::PlaceTorch),
            _ => None,
        }
    }

    /// Default mouse binding (0 left, 1 middle, 2 right).
    pub fn from_mouse_button(button: u8) -> Option<Command> {
        match button {
            0 => Some(Command::Cast(Variant::Fireball)),
            1 => Some(Command::Cast(Variant::GasCloud)),
            2 => Some(Command::Cast(Variant::IceArrow)),
            _ => None,
        }
    }
}

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Input state for a single tick.
///
/// NO tick field - tick is stored separately for compression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Held movement keys (packed bits)
    pub held: u8,
    /// One-shot actions this tick (packed bits)
    pub actions: u8,
}

impl InputFrame {
    /// Forward held
    pub const HELD_FORWARD: u8 = 0x01;
    /// Backward held
    pub const HELD_BACKWARD: u8 = 0x02;
    /// Strafe left held
    pub const HELD_LEFT: u8 = 0x04;
    /// Strafe right held
    pub const HELD_RIGHT: u8 = 0x08;
    /// Turn left held
    pub const HELD_TURN_LEFT: u8 = 0x10;
    /// Turn right held
    pub const HELD_TURN_RIGHT: u8 = 0x20;

    /// Cast fireball
    pub const ACTION_FIREBALL: u8 = 0x01;
    /// Cast ice arrow
    pub const ACTION_ICE_ARROW: u8 = 0x02;
    /// Cast lightning
    pub const ACTION_LIGHTNING: u8 = 0x04;
    /// Cast gas cloud
    pub const ACTION_GAS_CLOUD: u8 = 0x08;
    /// Toggle torch ahead
    pub const ACTION_PLACE_TORCH: u8 = 0x10;

    /// Idle frame.
    pub const fn new() -> Self {
        Self { held: 0, actions: 0 }
    }

    /// Frame with the given commands active.
    pub fn from_commands(commands: &[Command]) -> Self {
        let mut frame = Self::new();
        for command in commands {
            frame.set(*command, true);
        }
        frame
    }

    fn bit(command: Command) -> (bool, u8) {
        match command {
            Command::MoveForward => (true, Self::HELD_FORWARD),
            Command::MoveBackward => (true, Self::HELD_BACKWARD),
            Command::StrafeLeft => (true, Self::HELD_LEFT),
            Command::StrafeRight => (true, Self::HELD_RIGHT),
            Command::TurnLeft => (true, Self::HELD_TURN_LEFT),
            Command::TurnRight => (true, Self::HELD_TURN_RIGHT),
            Command::Cast(variant) => (false, Self::cast_bit(variant)),
            Command::PlaceTorch => (false, Self::ACTION_PLACE_TORCH),
        }
    }

    fn cast_bit(variant: Variant) -> u8 {
        match variant {
            Variant::Fireball => Self::ACTION_FIREBALL,
            Variant::IceArrow => Self::ACTION_ICE_ARROW,
            Variant::Lightning => Self::ACTION_LIGHTNING,
            Variant::GasCloud => Self::ACTION_GAS_CLOUD,
        }
    }

    /// Set or clear a command.
    #[inline]
    pub fn set(&mut self, command: Command, active: bool) {
        let (held, bit) = Self::bit(command);
        let bits = if held { &mut self.held } else { &mut self.actions };
        if active {
            *bits |= bit;
        } else {
            *bits &= !bit;
        }
    }

    /// Is a command active?
    #[inline]
    pub fn is_set(&self, command: Command) -> bool {
        let (held, bit) = Self::bit(command);
        let bits = if held { self.held } else { self.actions };
        bits & bit != 0
    }

    /// Spells requested this tick, in variant order.
    pub fn casts(&self) -> impl Iterator<Item = Variant> + '_ {
        Variant::ALL
            .into_iter()
            .filter(move |v| self.actions & Self::cast_bit(*v) != 0)
    }

    /// Torch toggle requested this tick.
    #[inline]
    pub fn place_torch(&self) -> bool {
        self.actions & Self::ACTION_PLACE_TORCH != 0
    }

    /// Clear one-shot actions, keeping held keys.
    #[inline]
    pub fn without_actions(self) -> Self {
        Self { held: self.held, actions: 0 }
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.held == 0 && self.actions == 0
    }
}

// =============================================================================
// COOLDOWNS
// =============================================================================

/// Count-down timers deciding when input may act again.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CooldownGate {
    move_remaining: f64,
    turn_remaining: f64,
    bolt_remaining: f64,
    lightning_remaining: f64,
    gas_remaining: f64,
    torch_latched: bool,
}

impl CooldownGate {
    /// All timers ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every timer down by `delta_ms`.
    pub fn tick(&mut self, delta_ms: f64) {
        self.move_remaining -= delta_ms;
        self.turn_remaining -= delta_ms;
        self.bolt_remaining -= delta_ms;
        self.lightning_remaining -= delta_ms;
        self.gas_remaining -= delta_ms;
    }

    /// Moves may be attempted.
    #[inline]
    pub fn move_ready(&self) -> bool {
        self.move_remaining <= 0.0
    }

    /// Turns may be attempted.
    #[inline]
    pub fn turn_ready(&self) -> bool {
        self.turn_remaining <= 0.0
    }

    /// Start the move timer.
    pub fn trigger_move(&mut self, ms: f64) {
        self.move_remaining = ms;
    }

    /// Start the turn timer.
    pub fn trigger_turn(&mut self, ms: f64) {
        self.turn_remaining = ms;
    }

    fn slot_mut(&mut self, slot: CastSlot) -> &mut f64 {
        match slot {
            CastSlot::Bolt => &mut self.bolt_remaining,
            CastSlot::Lightning => &mut self.lightning_remaining,
            CastSlot::Gas => &mut self.gas_remaining,
        }
    }

    /// The variant's cast slot is ready.
    pub fn cast_ready(&self, variant: Variant) -> bool {
        let remaining = match variant.profile().slot {
            CastSlot::Bolt => self.bolt_remaining,
            CastSlot::Lightning => self.lightning_remaining,
            CastSlot::Gas => self.gas_remaining,
        };
        remaining <= 0.0
    }

    /// Start the variant's cast timer.
    pub fn trigger_cast(&mut self, variant: Variant) {
        let profile = variant.profile();
        *self.slot_mut(profile.slot) = profile.cooldown_ms;
    }

    /// Report the torch key state for this tick.
    ///
    /// True only on the tick the key goes down; holding it does nothing more
    /// until it is released.
    pub fn torch_pressed(&mut self, down: bool) -> bool {
        let pressed = down && !self.torch_latched;
        self.torch_latched = down;
        pressed
    }

    /// Feed the timers into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_f64(self.move_remaining);
        hasher.update_f64(self.turn_remaining);
        hasher.update_f64(self.bolt_remaining);
        hasher.update_f64(self.lightning_remaining);
        hasher.update_f64(self.gas_remaining);
        hasher.update_bool(self.torch_latched);
    }
}

// =============================================================================
// INPUT SCRIPT
// =============================================================================

/// Delta-compressed input entry.
///
/// Only stored when input CHANGES (not every tick).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

impl InputDelta {
    /// Create new delta entry.
    pub fn new(tick: u32, frame: InputFrame) -> Self {
        Self { tick, frame }
    }
}

/// Complete input recording for one session on one level.
///
/// Used for replay and determinism checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputScript {
    /// Fingerprint of the level the script was recorded on
    pub level_hash: StateHash,

    /// Base RNG seed of the session
    pub rng_seed: u64,

    /// Fixed tick length (ms)
    pub tick_ms: f32,

    /// Starting tick (usually 0)
    pub start_tick: u32,

    /// Last recorded tick
    pub end_tick: u32,

    /// At least one tick was recorded or finalized
    recorded: bool,

    /// Only ticks where input CHANGED.
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputScript {
    /// Create an empty script.
    pub fn new(level_hash: StateHash, rng_seed: u64, tick_ms: f32) -> Self {
        Self {
            level_hash,
            rng_seed,
            tick_ms,
            start_tick: 0,
            end_tick: 0,
            recorded: false,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick.
    ///
    /// Only stores if input changed from previous frame.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = tick;
        self.recorded = true;

        if frame != self.last_frame {
            self.deltas.push(InputDelta::new(tick, frame));
            self.last_frame = frame;
        }
    }

    /// Get input at a specific tick.
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        // Binary search for the last delta at or before this tick
        let idx = self.deltas.partition_point(|d| d.tick <= tick);

        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// All deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of delta entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Number of ticks covered.
    pub fn tick_count(&self) -> u32 {
        if self.recorded {
            self.end_tick.saturating_sub(self.start_tick) + 1
        } else {
            0
        }
    }

    /// Finalize the script (call at session end).
    pub fn finalize(&mut self, end_tick: u32) {
        self.end_tick = end_tick;
        self.recorded = true;
    }

    /// Iterate every tick's input for replay.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            script: self,
            current_tick: self.start_tick,
            delta_idx: 0,
            current_frame: InputFrame::new(),
            done: self.tick_count() == 0,
        }
    }

    /// Hash of the script contents.
    pub fn hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_input_script();
        hasher.update_bytes(&self.level_hash);
        hasher.update_u64(self.rng_seed);
        hasher.update_f32(self.tick_ms);
        hasher.update_u32(self.start_tick);
        hasher.update_u32(self.end_tick);
        for delta in &self.deltas {
            hasher.update_u32(delta.tick);
            hasher.update_u8(delta.frame.held);
            hasher.update_u8(delta.frame.actions);
        }
        hasher.finalize()
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        let mut script: InputScript = bincode::deserialize(bytes)?;
        script.last_frame = script.deltas.last().map(|d| d.frame).unwrap_or_default();
        Ok(script)
    }
}

/// Iterator for replaying inputs tick-by-tick.
pub struct ReplayIterator<'a> {
    script: &'a InputScript,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
    done: bool,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.current_tick > self.script.end_tick {
            return None;
        }

        while let Some(delta) = self.script.deltas.get(self.delta_idx) {
            if delta.tick <= self.current_tick {
                self.current_frame = delta.frame;
                self.delta_idx += 1;
            } else {
                break;
            }
        }

        let result = (self.current_tick, self.current_frame);
        match self.current_tick.checked_add(1) {
            Some(next) => self.current_tick = next,
            None => self.done = true,
        }
        Some(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("moveForward"), Some(Command::MoveForward));
        assert_eq!(Command::parse("turnRight"), Some(Command::TurnRight));
        assert_eq!(Command::parse("cast:lightning"), Some(Command::Cast(Variant::Lightning)));
        assert_eq!(Command::parse("cast:ice"), Some(Command::Cast(Variant::IceArrow)));
        assert_eq!(Command::parse("placeTorch"), Some(Command::PlaceTorch));
        assert_eq!(Command::parse("cast:meteor"), None);
        assert_eq!(Command::parse("jump"), None);
    }

    #[test]
    fn test_default_bindings() {
        assert_eq!(Command::from_key("W"), Some(Command::MoveForward));
        assert_eq!(Command::from_key("ArrowLeft"), Some(Command::TurnLeft));
        assert_eq!(Command::from_key(" "), Some(Command::Cast(Variant::Lightning)));
        assert_eq!(Command::from_key("m"), None);
        assert_eq!(Command::from_mouse_button(2), Some(Command::Cast(Variant::IceArrow)));
    }

    #[test]
    fn test_input_frame_flags() {
        let mut frame = InputFrame::new();
        assert!(frame.is_idle());

        frame.set(Command::MoveForward, true);
        frame.set(Command::Cast(Variant::GasCloud), true);
        frame.set(Command::PlaceTorch, true);
        assert!(frame.is_set(Command::MoveForward));
        assert!(!frame.is_set(Command::MoveBackward));
        assert!(frame.place_torch());
        assert_eq!(frame.casts().collect::<Vec<_>>(), vec![Variant::GasCloud]);

        let held_only = frame.without_actions();
        assert!(held_only.is_set(Command::MoveForward));
        assert!(!held_only.place_torch());

        frame.set(Command::MoveForward, false);
        assert!(!frame.is_set(Command::MoveForward));
    }

    #[test]
    fn test_cooldown_gate() {
        let mut gate = CooldownGate::new();
        assert!(gate.move_ready());
        gate.trigger_move(MOVE_COOLDOWN_MS);
        gate.tick(100.0);
        assert!(!gate.move_ready());
        gate.tick(100.0);
        assert!(gate.move_ready());

        // Fireball and ice arrow share a slot
        gate.trigger_cast(Variant::Fireball);
        assert!(!gate.cast_ready(Variant::IceArrow));
        assert!(gate.cast_ready(Variant::Lightning));
        gate.tick(800.0);
        assert!(gate.cast_ready(Variant::IceArrow));
    }

    #[test]
    fn test_torch_press_is_edge_triggered() {
        let mut gate = CooldownGate::new();
        assert!(gate.torch_pressed(true));
        assert!(!gate.torch_pressed(true));
        assert!(!gate.torch_pressed(false));
        assert!(gate.torch_pressed(true));
    }

    #[test]
    fn test_script_delta_compression() {
        let mut script = InputScript::new([0u8; 32], 12345, 16.0);

        let frame = InputFrame::from_commands(&[Command::MoveForward]);
        for t in 0..4 {
            script.record(t, frame);
        }
        assert_eq!(script.delta_count(), 1);

        script.record(4, InputFrame::from_commands(&[Command::TurnLeft]));
        assert_eq!(script.delta_count(), 2);
    }

    #[test]
    fn test_script_get_at() {
        let mut script = InputScript::new([0u8; 32], 12345, 16.0);
        let f1 = InputFrame::from_commands(&[Command::MoveForward]);
        let f2 = InputFrame::from_commands(&[Command::StrafeLeft]);

        script.record(10, f1);
        script.record(20, f2);

        assert!(script.get_input_at(5).is_idle());
        assert_eq!(script.get_input_at(10), f1);
        assert_eq!(script.get_input_at(15), f1);
        assert_eq!(script.get_input_at(100), f2);
    }

    #[test]
    fn test_replay_iterator() {
        let mut script = InputScript::new([0u8; 32], 1, 16.0);
        let f1 = InputFrame::from_commands(&[Command::TurnRight]);
        let f2 = InputFrame::from_commands(&[Command::MoveBackward]);
        script.record(0, f1);
        script.record(3, f2);
        script.finalize(5);

        let frames: Vec<_> = script.replay_iter().collect();
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[2], (2, f1));
        assert_eq!(frames[3], (3, f2));
        assert_eq!(frames[5], (5, f2));
    }

    #[test]
    fn test_script_bytes_keep_hash() {
        let mut script = InputScript::new([7u8; 32], 99, 16.0);
        script.record(0, InputFrame::from_commands(&[Command::MoveForward]));
        script.record(9, InputFrame::from_commands(&[Command::Cast(Variant::Fireball)]));
        script.finalize(30);

        let bytes = script.to_bytes().unwrap();
        let decoded = InputScript::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.hash(), script.hash());
        assert_eq!(decoded.deltas(), script.deltas());
    }
}
