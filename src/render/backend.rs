use bevy::color::{ColorToComponents, Mix};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::PrimitiveTopology;

use super::components::{SceneLabel, SceneObjectTag};
use super::resources::{LineSource, SceneRegistry};
use crate::core::Rgb;
use crate::pick::{LineTopology, PickRay, RayHit};
use crate::scene::{ObjectHandle, SceneBackend, SceneObject};
use crate::viewport::{ClippingPlane, LabelStyle, clip_segment};

/// [`SceneBackend`] over the ECS world.
///
/// Lines are meshed in graph space with their clipped segments only, since
/// the standard material has no user clip planes.
#[derive(SystemParam)]
pub struct BevyScene<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    registry: ResMut<'w, SceneRegistry>,
}

impl BevyScene<'_, '_> {
    fn line_material(&mut self) -> Handle<StandardMaterial> {
        if let Some(mat) = &self.registry.line_material {
            return mat.clone();
        }
        // Vertex colors are multiplied into the white base.
        let mat = self.materials.add(StandardMaterial {
            base_color: Color::WHITE,
            unlit: true,
            ..default()
        });
        self.registry.line_material = Some(mat.clone());
        mat
    }

    fn marker_material(&mut self) -> Handle<StandardMaterial> {
        if let Some(mat) = &self.registry.marker_material {
            return mat.clone();
        }
        let mat = self.materials.add(StandardMaterial {
            base_color: Rgb::BLACK.into(),
            unlit: true,
            ..default()
        });
        self.registry.marker_material = Some(mat.clone());
        mat
    }

    fn spawn_lines(&mut self, handle: ObjectHandle, source: LineSource) -> Entity {
        let mesh = self
            .meshes
            .add(line_mesh(&source, &self.registry.planes));
        let material = self.line_material();
        let entity = self
            .commands
            .spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material),
                Transform::IDENTITY,
                SceneObjectTag(handle),
            ))
            .id();
        self.registry.meshes.insert(handle, mesh);
        self.registry.lines.insert(handle, source);
        entity
    }

    fn spawn_label(&mut self, handle: ObjectHandle, text: &str, world: Vec3, style: LabelStyle) -> Entity {
        let font_size = match style {
            LabelStyle::Strong => 18.0,
            LabelStyle::Tick => 13.0,
        };
        let visibility = if self.registry.labels_visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        self.commands
            .spawn((
                Text::new(text),
                TextFont {
                    font_size,
                    ..default()
                },
                TextColor(Color::srgb(0.1, 0.1, 0.1)),
                Node {
                    position_type: PositionType::Absolute,
                    ..default()
                },
                visibility,
                SceneLabel { world, style },
                SceneObjectTag(handle),
            ))
            .id()
    }
}

impl SceneBackend for BevyScene<'_, '_> {
    fn add_object(&mut self, object: SceneObject<'_>) -> ObjectHandle {
        let handle = self.registry.next_handle();
        if let Some((topology, points)) = object.pick_lines() {
            self.registry
                .picks
                .insert(handle, object.kind(), topology, points);
        }

        let entity = match object {
            SceneObject::Curve(curve) => self.spawn_lines(
                handle,
                LineSource {
                    topology: LineTopology::Strip,
                    points: curve.world_points(),
                    colors: curve.colors.clone(),
                },
            ),
            SceneObject::Axes(axes) => {
                let points = axes.world_points();
                let colors = vec![axes.color; points.len()];
                self.spawn_lines(
                    handle,
                    LineSource {
                        topology: LineTopology::Segments,
                        points,
                        colors,
                    },
                )
            }
            SceneObject::Label(label) => {
                self.spawn_label(handle, &label.text, label.position, label.style)
            }
            SceneObject::HoverMarker(marker) => {
                let mesh = self.meshes.add(Sphere::new(marker.radius));
                let material = self.marker_material();
                self.registry.meshes.insert(handle, mesh.clone());
                self.commands
                    .spawn((
                        Mesh3d(mesh),
                        MeshMaterial3d(material),
                        Transform::from_translation(marker.position),
                        SceneObjectTag(handle),
                    ))
                    .id()
            }
        };
        self.registry.entities.insert(handle, entity);
        handle
    }

    fn remove_object(&mut self, handle: ObjectHandle) {
        if let Some(entity) = self.registry.entities.remove(&handle) {
            self.commands.entity(entity).despawn();
        }
        self.registry.lines.remove(&handle);
        self.registry.picks.remove(handle);
    }

    fn dispose_geometry(&mut self, handle: ObjectHandle) {
        if let Some(mesh) = self.registry.meshes.remove(&handle) {
            self.meshes.remove(&mesh);
        }
    }

    fn cast_ray(&self, ray: &PickRay) -> Option<RayHit> {
        self.registry.picks.cast(ray)
    }

    fn set_label_layer_visible(&mut self, visible: bool) {
        self.registry.labels_visible = visible;
    }

    fn set_clipping_planes(&mut self, planes: &[ClippingPlane]) {
        self.registry.planes = planes.to_vec();
        let rebuilt: Vec<(ObjectHandle, Mesh)> = self
            .registry
            .lines
            .iter()
            .map(|(handle, source)| (*handle, line_mesh(source, planes)))
            .collect();
        for (handle, mesh) in rebuilt {
            let Some(&entity) = self.registry.entities.get(&handle) else {
                continue;
            };
            if let Some(old) = self.registry.meshes.remove(&handle) {
                self.meshes.remove(&old);
            }
            let mesh = self.meshes.add(mesh);
            self.commands.entity(entity).insert(Mesh3d(mesh.clone()));
            self.registry.meshes.insert(handle, mesh);
        }
    }
}

/// Line-list mesh of the parts of `source` inside every plane.
pub fn line_mesh(source: &LineSource, planes: &[ClippingPlane]) -> Mesh {
    let mut positions: Vec<[f32; 3]> = vec![];
    let mut colors: Vec<[f32; 4]> = vec![];

    let pairs: Vec<(usize, usize)> = match source.topology {
        LineTopology::Strip => (1..source.points.len()).map(|i| (i - 1, i)).collect(),
        LineTopology::Segments => (0..source.points.len() / 2)
            .map(|i| (2 * i, 2 * i + 1))
            .collect(),
    };

    for (i, j) in pairs {
        let (a, b) = (source.points[i], source.points[j]);
        let Some((ca, cb)) = clip_segment(planes, a, b) else {
            continue;
        };
        let color_a = vertex_color(source.colors.get(i).copied());
        let color_b = vertex_color(source.colors.get(j).copied());
        let length = a.distance(b);
        let at = |p: Vec3| {
            let t = if length > 0.0 { a.distance(p) / length } else { 0.0 };
            color_a.mix(&color_b, t).to_f32_array()
        };
        positions.extend([ca.to_array(), cb.to_array()]);
        colors.extend([at(ca), at(cb)]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh
}

fn vertex_color(rgb: Option<Rgb>) -> LinearRgba {
    Color::from(rgb.unwrap_or(Rgb::BLACK)).to_linear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BoundingBox;
    use crate::viewport::clipping_planes;
    use bevy_mesh::VertexAttributeValues;

    fn positions(mesh: &Mesh) -> Vec<[f32; 3]> {
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(v)) => v.clone(),
            _ => vec![],
        }
    }

    #[test]
    fn strip_becomes_clipped_segments() {
        let source = LineSource {
            topology: LineTopology::Strip,
            points: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(5.0, 0.0, 0.0),
                Vec3::new(f32::INFINITY, 0.0, 0.0),
                Vec3::new(20.0, 0.0, 0.0),
            ],
            colors: vec![Rgb::GREEN; 4],
        };
        let mesh = line_mesh(&source, &clipping_planes(&BoundingBox::default(), 0.5));
        // Only the first segment survives; the others touch infinity.
        assert_eq!(positions(&mesh), vec![[0.0, 0.0, 0.0], [5.0, 0.0, 0.0]]);
    }

    #[test]
    fn segments_are_cut_at_the_box() {
        let source = LineSource {
            topology: LineTopology::Segments,
            points: vec![Vec3::ZERO, Vec3::new(30.0, 0.0, 0.0)],
            colors: vec![Rgb::BLACK; 2],
        };
        let mesh = line_mesh(&source, &clipping_planes(&BoundingBox::default(), 0.5));
        let pos = positions(&mesh);
        assert_eq!(pos.len(), 2);
        assert!((pos[1][0] - 10.5).abs() < 1e-4);
    }
}
