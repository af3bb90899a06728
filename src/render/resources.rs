use std::collections::HashMap;

use bevy::prelude::*;

use crate::core::{BoundingBox, Rgb};
use crate::pick::{LineTopology, PickIndex};
use crate::scene::ObjectHandle;
use crate::session::GraphSession;
use crate::viewport::{ClippingPlane, ZoomDirection};

/// The session, held as a non-send resource because evaluators and callbacks
/// need not be `Send`.
pub struct SessionRes(pub GraphSession);

impl SessionRes {
    pub fn new(session: GraphSession) -> Self {
        Self(session)
    }
}

/// Requests the front end applies to the session on the next frame.
#[derive(Message, Clone, Debug, PartialEq)]
pub enum GraphCommand {
    Zoom(ZoomDirection),
    SetAxes(bool),
    SetLabels(bool),
    Resize(BoundingBox),
    Clear,
}

/// World-space lines kept so meshes can be rebuilt when clipping changes.
#[derive(Clone, Debug)]
pub struct LineSource {
    pub topology: LineTopology,
    pub points: Vec<Vec3>,
    pub colors: Vec<Rgb>,
}

/// Maps scene handles to entities and assets.
#[derive(Resource)]
pub struct SceneRegistry {
    pub(crate) next_id: u64,
    pub entities: HashMap<ObjectHandle, Entity>,
    pub meshes: HashMap<ObjectHandle, Handle<Mesh>>,
    pub lines: HashMap<ObjectHandle, LineSource>,
    pub picks: PickIndex,
    pub planes: Vec<ClippingPlane>,
    pub labels_visible: bool,
    pub line_material: Option<Handle<StandardMaterial>>,
    pub marker_material: Option<Handle<StandardMaterial>>,
}

impl SceneRegistry {
    pub fn new(pick_threshold: f32) -> Self {
        Self {
            next_id: 0,
            entities: HashMap::new(),
            meshes: HashMap::new(),
            lines: HashMap::new(),
            picks: PickIndex::new(pick_threshold),
            planes: vec![],
            labels_visible: false,
            line_material: None,
            marker_material: None,
        }
    }

    pub(crate) fn next_handle(&mut self) -> ObjectHandle {
        let handle = ObjectHandle(self.next_id);
        self.next_id += 1;
        handle
    }
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Left-button drag distance, used to tell clicks from orbits.
#[derive(Resource, Default)]
pub struct PointerDrag {
    pub travel: f32,
}
