use std::f32::consts::PI;

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow};
use bevy_camera::{PerspectiveProjection, Projection};

use super::backend::BevyScene;
use super::components::*;
use super::resources::*;
use crate::viewport::ZoomDirection;

/// Drag below this many pixels still counts as a click.
const CLICK_SLOP: f32 = 4.0;

pub fn setup_graph_camera(mut commands: Commands, session: NonSend<SessionRes>) {
    let cam = session.0.camera();
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: cam.fov.to_radians(),
            near: cam.near,
            far: cam.far,
            ..default()
        }),
        Transform::from_translation(cam.position).looking_at(cam.target, cam.up),
        GraphCamera,
        OrbitView::new(),
    ));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(0.15, 0.15, 0.15)),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(12.0),
            ..default()
        },
        HoverReadout,
    ));
}

/// Draw decorations and the remembered function, if any.
pub fn plot_on_startup(mut session: NonSendMut<SessionRes>, mut scene: BevyScene) {
    let session = &mut session.0;
    session.initialize(&mut scene);
    if let Err(report) = session.replot(&mut scene) {
        error!("initial plot failed: {report:?}");
    }
}

pub fn keyboard_shortcuts(
    keys: Res<ButtonInput<KeyCode>>,
    session: NonSend<SessionRes>,
    mut out: MessageWriter<GraphCommand>,
) {
    if keys.just_pressed(KeyCode::Equal) {
        out.write(GraphCommand::Zoom(ZoomDirection::In));
    }
    if keys.just_pressed(KeyCode::Minus) {
        out.write(GraphCommand::Zoom(ZoomDirection::Out));
    }
    let viewport = session.0.viewport();
    if keys.just_pressed(KeyCode::KeyA) {
        out.write(GraphCommand::SetAxes(!viewport.axes_enabled()));
    }
    if keys.just_pressed(KeyCode::KeyL) {
        out.write(GraphCommand::SetLabels(!viewport.labels_enabled()));
    }
}

pub fn apply_graph_commands(
    mut commands_in: MessageReader<GraphCommand>,
    mut session: NonSendMut<SessionRes>,
    mut scene: BevyScene,
) {
    let session = &mut session.0;
    for command in commands_in.read() {
        match command {
            GraphCommand::Zoom(direction) => {
                session.zoom(*direction);
            }
            GraphCommand::SetAxes(on) => session.set_axes(*on, &mut scene),
            GraphCommand::SetLabels(on) => session.set_labels(*on, &mut scene),
            GraphCommand::Clear => session.clear(&mut scene),
            GraphCommand::Resize(bounds) => {
                if let Err(report) = session.resize_graph_space(*bounds, &mut scene) {
                    error!("resize failed: {report:?}");
                }
            }
        }
    }
}

/// Accumulate drag and wheel input into the orbit, then apply it with damping.
pub fn orbit_camera(
    mouse: Res<ButtonInput<MouseButton>>,
    mut motion: MessageReader<MouseMotion>,
    mut wheel: MessageReader<MouseWheel>,
    mut drag: ResMut<PointerDrag>,
    mut session: NonSendMut<SessionRes>,
    mut views: Query<&mut OrbitView, With<GraphCamera>>,
) {
    let Ok(mut view) = views.single_mut() else {
        return;
    };
    let controls = session.0.config().controls;

    if mouse.just_pressed(MouseButton::Left) {
        drag.travel = 0.0;
    }
    let mut delta = Vec2::ZERO;
    for event in motion.read() {
        delta += event.delta;
    }
    if mouse.pressed(MouseButton::Left) && delta != Vec2::ZERO {
        drag.travel += delta.length();
        view.yaw_delta -= delta.x * controls.rotate_speed;
        view.pitch_delta -= delta.y * controls.rotate_speed;
    }

    let scroll: f32 = wheel.read().map(|e| e.y).sum();
    if controls.enable_zoom && scroll != 0.0 {
        view.scale *= 0.95_f32.powf(scroll);
    }

    let damping = controls.damping_factor.clamp(0.01, 1.0);
    let cam = session.0.camera_mut();
    let offset = cam.position - cam.target;
    let radius = offset.length();
    if radius <= f32::EPSILON {
        return;
    }
    let mut theta = offset.x.atan2(offset.z);
    let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
    theta += view.yaw_delta * damping;
    phi = (phi + view.pitch_delta * damping).clamp(1e-3, PI - 1e-3);
    let radius = radius * (1.0 + (view.scale - 1.0) * damping);

    cam.position = cam.target
        + radius * Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos());

    view.yaw_delta *= 1.0 - damping;
    view.pitch_delta *= 1.0 - damping;
    view.scale = 1.0 + (view.scale - 1.0) * (1.0 - damping);
}

/// Copy the session camera onto the Bevy camera and keep its aspect current.
pub fn sync_graph_camera(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut session: NonSendMut<SessionRes>,
    mut cameras: Query<(&mut Transform, &mut Projection), With<GraphCamera>>,
) {
    if let Ok(window) = windows.single() {
        session.0.resize_viewport(window.width(), window.height());
    }
    let cam = *session.0.camera();
    for (mut transform, mut projection) in cameras.iter_mut() {
        *transform = Transform::from_translation(cam.position).looking_at(cam.target, cam.up);
        if let Projection::Perspective(p) = projection.as_mut() {
            p.fov = cam.fov.to_radians();
            p.near = cam.near;
            p.far = cam.far;
        }
    }
}

pub fn pick_under_cursor(
    windows: Query<&Window, With<PrimaryWindow>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut moved: MessageReader<CursorMoved>,
    drag: Res<PointerDrag>,
    mut session: NonSendMut<SessionRes>,
    mut scene: BevyScene,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let size = Vec2::new(window.width(), window.height());

    if let Some(last) = moved.read().last() {
        session.0.on_move(last.position, size, &mut scene);
    }

    let Some(cursor) = window.cursor_position() else {
        return;
    };
    if mouse.just_released(MouseButton::Left) && drag.travel < CLICK_SLOP {
        session.0.on_click(cursor, size, &mut scene);
    }
}

/// Project labels onto the screen.
pub fn place_labels(
    registry: Res<SceneRegistry>,
    cameras: Query<(&Camera, &GlobalTransform), With<GraphCamera>>,
    mut labels: Query<(&SceneLabel, &mut Node, &mut Visibility)>,
) {
    let Ok((camera, cam_transform)) = cameras.single() else {
        return;
    };
    for (label, mut node, mut visibility) in labels.iter_mut() {
        let projected = camera.world_to_viewport(cam_transform, label.world).ok();
        match projected {
            Some(pos) if registry.labels_visible => {
                node.left = Val::Px(pos.x);
                node.top = Val::Px(pos.y);
                *visibility = Visibility::Inherited;
            }
            _ => *visibility = Visibility::Hidden,
        }
    }
}

pub fn update_hover_readout(
    session: NonSend<SessionRes>,
    mut readouts: Query<&mut Text, With<HoverReadout>>,
) {
    let session = &session.0;
    let mut text = String::new();
    if let Some(range) = session.heat_map_range() {
        text.push_str(&format!("Im range [{:.2}, {:.2}]", range.min, range.max));
    }
    let hover = session.hover_state();
    if let Some(p) = hover.current_point {
        let pin = if hover.is_fixed { " (fixed)" } else { "" };
        text.push_str(&format!(
            "\nU {:.2}  Y {:.2}  X {:.2}{pin}",
            p.x, p.y, p.z
        ));
    }
    for mut readout in readouts.iter_mut() {
        if readout.0 != text {
            readout.0.clone_from(&text);
        }
    }
}
