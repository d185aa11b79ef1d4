//! Action-level input state and the per-tick snapshot handed to the
//! simulation.
//!
//! Device handling belongs to the host; it maps its keys and buttons onto
//! [`Action`]s and forwards look deltas.

use std::collections::HashSet;

use engine_core::{PitchLimits, Transform};
use glam::{Vec2, Vec3};

/// Logical inputs the simulation understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Jump,
    Sprint,
    Crouch,
    Throw,
}

/// Player input sampled for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    /// Edge-triggered: true only on the tick the jump was pressed.
    pub jump_requested: bool,
    pub sprint_held: bool,
    pub crouch_held: bool,
    /// Edge-triggered: true only on the tick throw was pressed.
    pub throw_requested: bool,
    pub yaw: f32,
    pub pitch: f32,
}

impl InputSnapshot {
    /// Get movement input as a normalized vector (x = strafe right, y = forward).
    pub fn movement_axes(&self) -> Vec2 {
        let mut movement = Vec2::ZERO;

        if self.move_forward {
            movement.y += 1.0;
        }
        if self.move_backward {
            movement.y -= 1.0;
        }
        if self.move_left {
            movement.x -= 1.0;
        }
        if self.move_right {
            movement.x += 1.0;
        }

        movement.normalize_or_zero()
    }

    /// Horizontal world-space wish direction for the snapshot's yaw.
    /// Zero when no movement key is held.
    pub fn wish_direction(&self) -> Vec3 {
        let axes = self.movement_axes();
        let view = Transform::from_position_yaw(Vec3::ZERO, self.yaw);
        (view.flat_forward() * axes.y + view.flat_right() * axes.x).normalize_or_zero()
    }
}

/// Manages action state across frames.
#[derive(Debug)]
pub struct InputState {
    /// Actions currently held down.
    held: HashSet<Action>,
    /// Actions pressed this frame.
    pressed: HashSet<Action>,
    /// Actions released this frame.
    released: HashSet<Action>,

    yaw: f32,
    pitch: f32,
    pitch_limits: PitchLimits,
    /// Radians per unit of look delta.
    sensitivity: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            pressed: HashSet::new(),
            released: HashSet::new(),
            yaw: 0.0,
            pitch: 0.0,
            pitch_limits: PitchLimits::LOOK,
            sensitivity: 0.002,
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_pitch_limits(mut self, limits: PitchLimits) -> Self {
        self.pitch_limits = limits;
        self.pitch = limits.clamp(self.pitch);
        self
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    pub fn press(&mut self, action: Action) {
        if self.held.insert(action) {
            self.pressed.insert(action);
        }
    }

    pub fn release(&mut self, action: Action) {
        if self.held.remove(&action) {
            self.released.insert(action);
        }
    }

    /// Release everything, e.g. on focus loss.
    pub fn release_all(&mut self) {
        self.released.extend(self.held.drain());
    }

    /// Apply a look delta (mouse motion). Positive x turns right, positive
    /// y looks down.
    pub fn process_look(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.sensitivity;
        self.pitch = self.pitch_limits.clamp(self.pitch - delta.y * self.sensitivity);
    }

    /// Set view angles directly, e.g. on respawn.
    pub fn set_view(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = self.pitch_limits.clamp(pitch);
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    pub fn is_released(&self, action: Action) -> bool {
        self.released.contains(&action)
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            move_forward: self.is_held(Action::MoveForward),
            move_backward: self.is_held(Action::MoveBackward),
            move_left: self.is_held(Action::MoveLeft),
            move_right: self.is_held(Action::MoveRight),
            jump_requested: self.is_pressed(Action::Jump),
            sprint_held: self.is_held(Action::Sprint),
            crouch_held: self.is_held(Action::Crouch),
            throw_requested: self.is_pressed(Action::Throw),
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }
}
