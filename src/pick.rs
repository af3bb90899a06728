//! CPU ray picking against polylines.

use bevy_math::Vec3;

use crate::scene::{ObjectHandle, ObjectKind};

/// World-space ray; `direction` is unit length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl PickRay {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Nearest intersection reported by a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub handle: ObjectHandle,
    pub kind: ObjectKind,
    /// Point on the picked line.
    pub point: Vec3,
    /// Distance from the ray origin to its closest approach.
    pub distance: f32,
}

impl RayHit {
    pub fn is_curve(&self) -> bool {
        self.kind == ObjectKind::Curve
    }
}

/// Closest approach between a ray and the segment `a..b`.
///
/// Returns `(point_on_segment, ray_parameter, squared_distance)`.
pub fn ray_segment_closest(ray: &PickRay, a: Vec3, b: Vec3) -> (Vec3, f32, f32) {
    let d1 = ray.direction;
    let d2 = b - a;
    let r = ray.origin - a;
    let e = d2.length_squared();
    let c = d1.dot(r);

    let (t, s) = if e <= f32::EPSILON {
        ((-c).max(0.0), 0.0)
    } else {
        let f = d2.dot(r);
        let bb = d1.dot(d2);
        let denom = e - bb * bb;
        let mut t = if denom > f32::EPSILON {
            ((bb * f - c * e) / denom).max(0.0)
        } else {
            0.0
        };
        let mut s = (bb * t + f) / e;
        if s < 0.0 {
            s = 0.0;
            t = (-c).max(0.0);
        } else if s > 1.0 {
            s = 1.0;
            t = (bb - c).max(0.0);
        }
        (t, s)
    };

    let on_segment = a + d2 * s;
    let on_ray = ray.at(t);
    (on_segment, t, on_ray.distance_squared(on_segment))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineTopology {
    /// Consecutive points are joined.
    Strip,
    /// Points pair up as independent segments.
    Segments,
}

#[derive(Clone, Debug)]
struct PickEntry {
    handle: ObjectHandle,
    kind: ObjectKind,
    topology: LineTopology,
    points: Vec<Vec3>,
}

impl PickEntry {
    fn segments(&self) -> Box<dyn Iterator<Item = (Vec3, Vec3)> + '_> {
        match self.topology {
            LineTopology::Strip => Box::new(self.points.windows(2).map(|w| (w[0], w[1]))),
            LineTopology::Segments => {
                Box::new(self.points.chunks_exact(2).map(|w| (w[0], w[1])))
            }
        }
    }
}

/// Pickable world-space lines of a scene.
#[derive(Clone, Debug)]
pub struct PickIndex {
    threshold: f32,
    entries: Vec<PickEntry>,
}

impl PickIndex {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            entries: vec![],
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn insert(
        &mut self,
        handle: ObjectHandle,
        kind: ObjectKind,
        topology: LineTopology,
        points: Vec<Vec3>,
    ) {
        self.remove(handle);
        self.entries.push(PickEntry {
            handle,
            kind,
            topology,
            points,
        });
    }

    pub fn remove(&mut self, handle: ObjectHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nearest line within the threshold, whatever its kind.
    pub fn cast(&self, ray: &PickRay) -> Option<RayHit> {
        if ray.direction == Vec3::ZERO || !ray.direction.is_finite() {
            return None;
        }
        let threshold_sq = self.threshold * self.threshold;
        let mut best: Option<RayHit> = None;

        for entry in &self.entries {
            for (a, b) in entry.segments() {
                if !a.is_finite() || !b.is_finite() {
                    continue;
                }
                let (point, t, dist_sq) = ray_segment_closest(ray, a, b);
                // NaN distances from a degenerate ray are misses.
                if dist_sq.is_nan() || dist_sq > threshold_sq {
                    continue;
                }
                let distance = ray.origin.distance(ray.at(t));
                if best.is_none_or(|h| distance < h.distance) {
                    best = Some(RayHit {
                        handle: entry.handle,
                        kind: entry.kind,
                        point,
                        distance,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_z(x: f32, y: f32) -> PickRay {
        PickRay::new(Vec3::new(x, y, 10.0), Vec3::NEG_Z)
    }

    #[test]
    fn closest_point_lies_on_segment() {
        let ray = down_z(0.5, 0.2);
        let (p, t, d2) = ray_segment_closest(&ray, Vec3::ZERO, Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-5));
        assert!((t - 10.0).abs() < 1e-4);
        assert!((d2 - 0.04).abs() < 1e-5);
    }

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let ray = down_z(3.0, 0.0);
        let (p, _, d2) = ray_segment_closest(&ray, Vec3::ZERO, Vec3::X);
        assert_eq!(p, Vec3::X);
        assert!((d2 - 4.0).abs() < 1e-4);
    }

    #[test]
    fn nearest_line_wins() {
        let mut index = PickIndex::new(1.0);
        index.insert(
            ObjectHandle(1),
            ObjectKind::Curve,
            LineTopology::Strip,
            vec![Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)],
        );
        index.insert(
            ObjectHandle(2),
            ObjectKind::Axes,
            LineTopology::Segments,
            vec![Vec3::new(-5.0, 0.0, 4.0), Vec3::new(5.0, 0.0, 4.0)],
        );
        let hit = index.cast(&down_z(1.0, 0.5)).unwrap();
        assert_eq!(hit.handle, ObjectHandle(2));
        assert!(!hit.is_curve());

        index.remove(ObjectHandle(2));
        let hit = index.cast(&down_z(1.0, 0.5)).unwrap();
        assert_eq!(hit.handle, ObjectHandle(1));
        assert!(hit.is_curve());
        assert!(hit.point.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn misses_outside_threshold_and_skips_infinite_points() {
        let mut index = PickIndex::new(0.5);
        index.insert(
            ObjectHandle(7),
            ObjectKind::Curve,
            LineTopology::Strip,
            vec![
                Vec3::new(f32::INFINITY, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 3.0, 0.0),
            ],
        );
        assert!(index.cast(&down_z(2.0, 1.0)).is_none());
        assert!(index.cast(&down_z(5.0, 0.0)).is_none());
        assert!(index.cast(&down_z(0.2, 1.0)).is_some());
    }

    #[test]
    fn degenerate_ray_hits_nothing() {
        let mut index = PickIndex::new(1.0);
        index.insert(
            ObjectHandle(3),
            ObjectKind::Curve,
            LineTopology::Strip,
            vec![Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)],
        );
        let origin = Vec3::new(0.0, 0.0, 0.5);
        assert!(index.cast(&PickRay::new(origin, Vec3::NAN)).is_none());
        let nan = PickRay {
            origin,
            direction: Vec3::NAN,
        };
        assert!(index.cast(&nan).is_none());
    }
}
