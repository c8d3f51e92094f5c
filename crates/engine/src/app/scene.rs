use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::input::{ActionStates, InputAction, MoveAxes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Finish,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    upgrade_choice: Option<usize>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested || self.actions.is_down(InputAction::Quit)
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_upgrade_choice(mut self, upgrade_choice: Option<usize>) -> Self {
        self.upgrade_choice = upgrade_choice;
        self
    }

    pub fn upgrade_choice(&self) -> Option<usize> {
        self.upgrade_choice
    }

    /// Opposing keys cancel out on their axis.
    pub fn move_axes(&self) -> MoveAxes {
        let mut x = 0i8;
        let mut y = 0i8;
        if self.is_down(InputAction::MoveRight) {
            x += 1;
        }
        if self.is_down(InputAction::MoveLeft) {
            x -= 1;
        }
        if self.is_down(InputAction::MoveDown) {
            y += 1;
        }
        if self.is_down(InputAction::MoveUp) {
            y -= 1;
        }
        MoveAxes::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    pub fn scaled(self, factor: f32) -> Vec2 {
        Vec2 {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalized_or_zero(self) -> Vec2 {
        let len_sq = self.x * self.x + self.y * self.y;
        if len_sq > 0.0 {
            self.scaled(len_sq.sqrt().recip())
        } else {
            Vec2::ZERO
        }
    }

    pub fn from_angle(radians: f32, radius: f32) -> Vec2 {
        Vec2 {
            x: radians.cos() * radius,
            y: radians.sin() * radius,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

pub trait Scene {
    fn load(&mut self);
    fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot) -> SceneCommand;
    fn unload(&mut self);
    fn debug_title(&self) -> Option<String> {
        None
    }
}
