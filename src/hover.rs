//! Hover and click inspection of plotted points.

use bevy_math::{Vec2, Vec3};

use crate::core::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    Click,
}

/// A pointer event in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    /// Cursor position, origin at the top-left corner.
    pub position: Vec2,
    /// Size of the drawing surface.
    pub viewport: Vec2,
}

impl PointerEvent {
    pub fn moved(position: Vec2, viewport: Vec2) -> Self {
        Self {
            kind: PointerKind::Move,
            position,
            viewport,
        }
    }

    pub fn clicked(position: Vec2, viewport: Vec2) -> Self {
        Self {
            kind: PointerKind::Click,
            position,
            viewport,
        }
    }

    /// Normalized device coordinates, `-1..=1` with y up.
    pub fn ndc(&self) -> Vec2 {
        Vec2::new(
            self.position.x / self.viewport.x * 2.0 - 1.0,
            -(self.position.y / self.viewport.y) * 2.0 + 1.0,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HoverPhase {
    #[default]
    Idle,
    Tracking,
    /// A click pinned the point; moves are ignored until the next click.
    Fixed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HoverState {
    pub current_point: Option<Vec3>,
    pub is_fixed: bool,
}

/// What the caller has to do after an event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HoverTransition {
    Ignored,
    /// Show the marker at this point and report it.
    Set(Vec3),
    /// Remove the marker.
    Cleared,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HoverPicker {
    phase: HoverPhase,
    current_point: Option<Vec3>,
}

impl HoverPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> HoverPhase {
        self.phase
    }

    pub fn state(&self) -> HoverState {
        HoverState {
            current_point: self.current_point,
            is_fixed: self.phase == HoverPhase::Fixed,
        }
    }

    /// False when the event would be ignored, so no ray needs casting.
    pub fn accepts(&self, kind: PointerKind) -> bool {
        !(self.phase == HoverPhase::Fixed && kind == PointerKind::Move)
    }

    /// Advance on an event; `hit` is the picked point on a curve, if any.
    pub fn handle(&mut self, kind: PointerKind, hit: Option<Vec3>) -> HoverTransition {
        if !self.accepts(kind) {
            return HoverTransition::Ignored;
        }
        match hit {
            Some(point) => {
                self.phase = match kind {
                    PointerKind::Move => HoverPhase::Tracking,
                    PointerKind::Click => HoverPhase::Fixed,
                };
                self.current_point = Some(point);
                HoverTransition::Set(point)
            }
            None => {
                self.reset();
                HoverTransition::Cleared
            }
        }
    }

    pub fn reset(&mut self) {
        self.phase = HoverPhase::Idle;
        self.current_point = None;
    }
}

/// Sphere drawn at the inspected point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverMarker {
    pub position: Vec3,
    pub radius: f32,
    pub color: Rgb,
}

impl HoverMarker {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius,
            color: Rgb::BLACK,
        }
    }
}
