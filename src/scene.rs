//! The seam between a graph session and whatever draws it.

use std::collections::{BTreeMap, BTreeSet};

use bevy_math::Vec3;

use crate::core::Curve;
use crate::hover::HoverMarker;
use crate::pick::{LineTopology, PickIndex, PickRay, RayHit};
use crate::viewport::{AxesIndicator, ClippingPlane, Label};

/// Opaque id of an object added to a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Curve,
    Axes,
    Label,
    HoverMarker,
}

/// Borrowed description of something to draw.
#[derive(Clone, Copy, Debug)]
pub enum SceneObject<'a> {
    Curve(&'a Curve),
    Axes(&'a AxesIndicator),
    Label(&'a Label),
    HoverMarker(&'a HoverMarker),
}

impl SceneObject<'_> {
    pub fn kind(&self) -> ObjectKind {
        match self {
            SceneObject::Curve(_) => ObjectKind::Curve,
            SceneObject::Axes(_) => ObjectKind::Axes,
            SceneObject::Label(_) => ObjectKind::Label,
            SceneObject::HoverMarker(_) => ObjectKind::HoverMarker,
        }
    }

    /// World-space lines a pick ray can hit, if the object has any.
    ///
    /// Labels are overlay text and the marker is taken out before every cast,
    /// so neither is pickable.
    pub fn pick_lines(&self) -> Option<(LineTopology, Vec<Vec3>)> {
        match self {
            SceneObject::Curve(curve) => Some((LineTopology::Strip, curve.world_points())),
            SceneObject::Axes(axes) => Some((LineTopology::Segments, axes.world_points())),
            SceneObject::Label(_) | SceneObject::HoverMarker(_) => None,
        }
    }
}

/// What a rendering engine must offer a session.
pub trait SceneBackend {
    fn add_object(&mut self, object: SceneObject<'_>) -> ObjectHandle;

    /// Take an object out of the scene. Unknown handles are ignored.
    fn remove_object(&mut self, handle: ObjectHandle);

    /// Release GPU-side geometry of an object.
    fn dispose_geometry(&mut self, handle: ObjectHandle);

    /// Nearest object hit by the ray, of any kind.
    fn cast_ray(&self, ray: &PickRay) -> Option<RayHit>;

    fn set_label_layer_visible(&mut self, visible: bool);

    fn set_clipping_planes(&mut self, planes: &[ClippingPlane]);
}

/// Owned copy of an object held by [`HeadlessScene`].
#[derive(Clone, Debug, PartialEq)]
pub enum StoredObject {
    Curve(Curve),
    Axes(AxesIndicator),
    Label(Label),
    HoverMarker(HoverMarker),
}

impl StoredObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            StoredObject::Curve(_) => ObjectKind::Curve,
            StoredObject::Axes(_) => ObjectKind::Axes,
            StoredObject::Label(_) => ObjectKind::Label,
            StoredObject::HoverMarker(_) => ObjectKind::HoverMarker,
        }
    }
}

impl From<SceneObject<'_>> for StoredObject {
    fn from(object: SceneObject<'_>) -> Self {
        match object {
            SceneObject::Curve(c) => StoredObject::Curve(c.clone()),
            SceneObject::Axes(a) => StoredObject::Axes(a.clone()),
            SceneObject::Label(l) => StoredObject::Label(l.clone()),
            SceneObject::HoverMarker(m) => StoredObject::HoverMarker(*m),
        }
    }
}

/// In-memory scene with CPU picking.
#[derive(Debug)]
pub struct HeadlessScene {
    next_id: u64,
    objects: BTreeMap<ObjectHandle, StoredObject>,
    disposed: BTreeSet<ObjectHandle>,
    picks: PickIndex,
    label_layer_visible: bool,
    clipping_planes: Vec<ClippingPlane>,
}

impl HeadlessScene {
    pub fn new(pick_threshold: f32) -> Self {
        Self {
            next_id: 0,
            objects: BTreeMap::new(),
            disposed: BTreeSet::new(),
            picks: PickIndex::new(pick_threshold),
            label_layer_visible: false,
            clipping_planes: vec![],
        }
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&StoredObject> {
        self.objects.get(&handle)
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.objects.contains_key(&handle)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectHandle, &StoredObject)> {
        self.objects.iter().map(|(h, o)| (*h, o))
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.values().filter(|o| o.kind() == kind).count()
    }

    /// Curves in insertion order.
    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.objects.values().filter_map(|o| match o {
            StoredObject::Curve(c) => Some(c),
            _ => None,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.objects.values().filter_map(|o| match o {
            StoredObject::Label(l) => Some(l),
            _ => None,
        })
    }

    pub fn hover_marker(&self) -> Option<&HoverMarker> {
        self.objects.values().find_map(|o| match o {
            StoredObject::HoverMarker(m) => Some(m),
            _ => None,
        })
    }

    pub fn is_disposed(&self, handle: ObjectHandle) -> bool {
        self.disposed.contains(&handle)
    }

    pub fn disposed_count(&self) -> usize {
        self.disposed.len()
    }

    pub fn label_layer_visible(&self) -> bool {
        self.label_layer_visible
    }

    pub fn clipping_planes(&self) -> &[ClippingPlane] {
        &self.clipping_planes
    }
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SceneBackend for HeadlessScene {
    fn add_object(&mut self, object: SceneObject<'_>) -> ObjectHandle {
        let handle = ObjectHandle(self.next_id);
        self.next_id += 1;
        if let Some((topology, points)) = object.pick_lines() {
            self.picks.insert(handle, object.kind(), topology, points);
        }
        self.objects.insert(handle, object.into());
        handle
    }

    fn remove_object(&mut self, handle: ObjectHandle) {
        self.objects.remove(&handle);
        self.picks.remove(handle);
    }

    fn dispose_geometry(&mut self, handle: ObjectHandle) {
        self.disposed.insert(handle);
    }

    fn cast_ray(&self, ray: &PickRay) -> Option<RayHit> {
        self.picks.cast(ray)
    }

    fn set_label_layer_visible(&mut self, visible: bool) {
        self.label_layer_visible = visible;
    }

    fn set_clipping_planes(&mut self, planes: &[ClippingPlane]) {
        self.clipping_planes = planes.to_vec();
    }
}
