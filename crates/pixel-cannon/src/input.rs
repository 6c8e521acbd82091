//! Keyboard, mouse button and cursor state for the game loop.
//!
//! The window handler feeds winit events in; [`Game`](crate::app::Game)
//! callbacks read the result through [`GameContext`](crate::app::GameContext).
//! Edge state (`just_pressed` / `just_released`) lasts for exactly one
//! `update`.

use std::collections::HashSet;
use std::hash::Hash;

use glam::Vec2;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// Held and edge state for one kind of button.
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    held: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Currently held down.
    pub fn pressed(&self, button: T) -> bool {
        self.held.contains(&button)
    }

    /// Went down since the previous update.
    pub fn just_pressed(&self, button: T) -> bool {
        self.just_pressed.contains(&button)
    }

    /// Went up since the previous update.
    pub fn just_released(&self, button: T) -> bool {
        self.just_released.contains(&button)
    }

    pub fn any_pressed(&self, buttons: impl IntoIterator<Item = T>) -> bool {
        buttons.into_iter().any(|b| self.pressed(b))
    }

    /// Every button currently held, in no particular order.
    pub fn iter_pressed(&self) -> impl Iterator<Item = T> + '_ {
        self.held.iter().copied()
    }

    /// Key repeat arrives as extra presses; only the first one counts.
    pub(crate) fn press(&mut self, button: T) {
        if self.held.insert(button) {
            self.just_pressed.insert(button);
        }
    }

    pub(crate) fn release(&mut self, button: T) {
        if self.held.remove(&button) {
            self.just_released.insert(button);
        }
    }

    /// Release everything, e.g. when the window loses focus and the matching
    /// release events will never arrive.
    pub(crate) fn release_all(&mut self) {
        self.just_released.extend(self.held.drain());
    }

    pub(crate) fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Mouse cursor in window pixel coordinates (origin top-left).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cursor {
    pub position: Vec2,
    /// Whether the cursor is over the window.
    pub inside: bool,
    /// Wheel movement since the previous update, in lines.
    pub scroll: Vec2,
}

impl Cursor {
    pub(crate) fn end_frame(&mut self) {
        self.scroll = Vec2::ZERO;
    }
}
