use bevy::prelude::*;

use crate::scene::ObjectHandle;
use crate::viewport::LabelStyle;

/// Marker for the camera mirrored from the session.
#[derive(Component)]
pub struct GraphCamera;

/// Damped orbit around the session camera's target.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct OrbitView {
    /// Pending rotation about the up axis, in radians.
    pub yaw_delta: f32,
    /// Pending rotation towards or away from the poles.
    pub pitch_delta: f32,
    /// Pending dolly factor; 1 keeps the distance.
    pub scale: f32,
}

impl OrbitView {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            ..default()
        }
    }
}

/// Entity drawn for a scene object.
#[derive(Component, Clone, Copy, Debug)]
pub struct SceneObjectTag(pub ObjectHandle);

/// UI text pinned to a point in graph space.
#[derive(Component, Clone, Copy, Debug)]
pub struct SceneLabel {
    pub world: Vec3,
    pub style: LabelStyle,
}

/// Text showing the inspected point and the heat-map range.
#[derive(Component)]
pub struct HoverReadout;
