use std::cell::Cell;
use std::rc::Rc;

use bevy_math::Vec3;
use heatcurves::prelude::*;

fn session() -> (GraphSession, HeadlessScene) {
    let mut scene = HeadlessScene::default();
    let mut session = GraphSession::new(GraphConfig::default()).unwrap();
    session.initialize(&mut scene);
    (session, scene)
}

fn curve_at(session: &GraphSession, row: f64) -> &Curve {
    &session
        .curves()
        .iter()
        .find(|c| c.curve.row == row)
        .unwrap()
        .curve
}

#[test]
fn identity_over_the_default_box() {
    let (mut session, mut scene) = session();
    session.plot(from_complex_fn(|z| z), &mut scene).unwrap();

    assert_eq!(session.heat_map_range(), Some(HeatMapRange::new(-10.0, 10.0)));
    assert_eq!(session.curves().len(), 21);
    assert_eq!(scene.count(ObjectKind::Curve), 21);

    // Row 0 sits at t = 0.5, hue 120.
    assert!(curve_at(&session, 0.0).colors.iter().all(|&c| c == Rgb::GREEN));
    assert!(curve_at(&session, 10.0).colors.iter().all(|&c| c == Rgb::new(255, 0, 0)));

    let row3 = curve_at(&session, 3.0);
    assert_eq!(row3.position, Vec3::new(0.0, 3.0, 0.0));
    assert_eq!(row3.geometry[0], Vec3::new(-10.0, -10.0, 0.0));
    assert_eq!(row3.world_points()[0], Vec3::new(-10.0, 3.0, -10.0));
}

#[test]
fn plotting_is_idempotent() {
    let f = |z: num_complex::Complex64| (z * z).exp() / (z + 1.5);
    let (mut a, mut scene_a) = session();
    let (mut b, mut scene_b) = session();
    a.plot(from_complex_fn(f), &mut scene_a).unwrap();
    b.plot(from_complex_fn(f), &mut scene_b).unwrap();

    assert_eq!(a.heat_map_range(), b.heat_map_range());
    for (x, y) in a.curves().iter().zip(b.curves()) {
        let bits = |c: &Curve| -> Vec<u32> {
            c.position_buffer().iter().map(|v| v.to_bits()).collect()
        };
        assert_eq!(bits(&x.curve), bits(&y.curve));
        assert_eq!(x.curve.color_buffer(), y.curve.color_buffer());
    }
}

#[test]
fn nan_only_function_plots_at_infinity_in_green() {
    let (mut session, mut scene) = session();
    session
        .plot(FnEvaluator(|_: &EvalInputs| f64::NAN), &mut scene)
        .unwrap();

    assert_eq!(session.heat_map_range(), Some(HeatMapRange::new(0.0, 0.0)));
    for committed in session.curves() {
        let curve = &committed.curve;
        assert!(curve.geometry.iter().all(|p| p.x == f32::INFINITY));
        assert!(curve.world_points().iter().all(|p| p.x == f32::INFINITY));
        assert!(curve.colors.iter().all(|&c| c == Rgb::GREEN));
    }
}

#[test]
fn real_only_function_is_all_green() {
    let (mut session, mut scene) = session();
    session
        .plot(FnEvaluator(|i: &EvalInputs| i.x * i.y), &mut scene)
        .unwrap();
    assert!(
        session
            .curves()
            .iter()
            .flat_map(|c| c.curve.colors.iter())
            .all(|&c| c == Rgb::GREEN)
    );
}

#[test]
fn failing_evaluator_commits_nothing() {
    let (mut session, mut scene) = session();
    let done = Rc::new(Cell::new(0));
    let seen = done.clone();
    session.set_on_plot_complete(move || seen.set(seen.get() + 1));

    let err = session
        .plot(
            TryFnEvaluator(|i: &EvalInputs| {
                if i.y > 5.0 { Err("pole") } else { Ok(i.z) }
            }),
            &mut scene,
        )
        .unwrap_err();

    assert_eq!(*err.current_context(), GraphError::Evaluation);
    assert!(session.curves().is_empty());
    assert_eq!(scene.count(ObjectKind::Curve), 0);
    assert_eq!(session.heat_map_range(), None);
    assert_eq!(done.get(), 0);
}

#[test]
fn completion_is_signalled_once_per_plot() {
    let (mut session, mut scene) = session();
    let done = Rc::new(Cell::new(0));
    let seen = done.clone();
    session.set_on_plot_complete(move || seen.set(seen.get() + 1));
    session.plot(from_complex_fn(|z| z), &mut scene).unwrap();
    assert_eq!(done.get(), 1);
}

#[test]
fn resize_from_20_to_40_units() {
    let (mut session, mut scene) = session();
    session.plot(from_complex_fn(|z| z), &mut scene).unwrap();
    let old: Vec<ObjectHandle> = session.curves().iter().map(|c| c.handle).collect();

    session
        .resize_graph_space(BoundingBox::symmetric(20.0), &mut scene)
        .unwrap();

    for handle in old {
        assert!(scene.is_disposed(handle));
        assert!(!scene.contains(handle));
    }
    assert_eq!(session.curves().len(), 41);
    assert_eq!(scene.count(ObjectKind::Curve), 41);
    assert_eq!(session.heat_map_range(), Some(HeatMapRange::new(-20.0, 20.0)));

    let cam = session.camera();
    assert_eq!(cam.position, Vec3::new(-20.0, 20.0, -60.0));
    assert_eq!(cam.target, Vec3::new(20.0, -20.0, 20.0));
    assert_eq!(scene.clipping_planes()[0].constant, 20.5);

    // Decorations follow the new box.
    assert_eq!(scene.count(ObjectKind::Axes), 1);
    assert!(scene.labels().any(|l| l.text == "-20"));
}

#[test]
fn resize_rejects_malformed_bounds_without_touching_the_plot() {
    let (mut session, mut scene) = session();
    session.plot(from_complex_fn(|z| z), &mut scene).unwrap();
    let bad = BoundingBox::default().with_interval_y(-1.0);

    let err = session.resize_graph_space(bad, &mut scene).unwrap_err();
    assert_eq!(*err.current_context(), GraphError::Configuration);
    assert_eq!(session.curves().len(), 21);
    assert_eq!(*session.bounds(), BoundingBox::default());
}

#[test]
fn clear_removes_curves_and_rebuilds_decorations() {
    let (mut session, mut scene) = session();
    session.plot(from_complex_fn(|z| z), &mut scene).unwrap();
    let old: Vec<ObjectHandle> = session.curves().iter().map(|c| c.handle).collect();

    session.clear(&mut scene);

    assert!(session.curves().is_empty());
    assert_eq!(scene.count(ObjectKind::Curve), 0);
    assert!(old.iter().all(|&h| scene.is_disposed(h)));
    assert_eq!(scene.count(ObjectKind::Axes), 1);
    assert_eq!(scene.count(ObjectKind::Label), 12);
    assert!(scene.label_layer_visible());
}

#[test]
fn clear_rebuilds_decorations_even_when_turned_off() {
    let (mut session, mut scene) = session();
    session.set_axes(false, &mut scene);
    session.set_labels(false, &mut scene);
    session.clear(&mut scene);

    assert_eq!(scene.count(ObjectKind::Axes), 1);
    assert_eq!(scene.count(ObjectKind::Label), 12);
    assert!(scene.label_layer_visible());
    assert!(session.viewport().axes_enabled());
    assert!(session.viewport().labels_enabled());
}

#[test]
fn axes_toggle_is_idempotent() {
    let (mut session, mut scene) = session();
    let first = session.viewport().axes_handle().unwrap();
    session.set_axes(true, &mut scene);
    assert_eq!(session.viewport().axes_handle(), Some(first));

    session.set_axes(false, &mut scene);
    assert!(scene.is_disposed(first));
    assert_eq!(scene.count(ObjectKind::Axes), 0);
    session.set_axes(false, &mut scene);
    assert_eq!(scene.count(ObjectKind::Axes), 0);
}

#[test]
fn labels_hide_without_duplicating() {
    let (mut session, mut scene) = session();
    session.set_labels(false, &mut scene);
    assert!(!scene.label_layer_visible());
    assert_eq!(scene.count(ObjectKind::Label), 12);

    session.set_labels(true, &mut scene);
    assert!(scene.label_layer_visible());
    assert_eq!(scene.count(ObjectKind::Label), 12);
}

#[test]
fn zoom_steps_and_clamps() {
    let (mut session, _) = session();
    assert_eq!(session.zoom(ZoomDirection::In), 70.0);
    for _ in 0..20 {
        session.zoom(ZoomDirection::In);
    }
    assert_eq!(session.camera().fov, 20.0);
    for _ in 0..40 {
        session.zoom(ZoomDirection::Out);
    }
    assert_eq!(session.camera().fov, 175.0);
}

#[test]
fn resize_rejects_steps_too_small_to_advance() {
    let (mut session, mut scene) = session();
    let flat = BoundingBox {
        min_z: 1e17,
        max_z: 1e17,
        ..BoundingBox::default()
    };
    let err = session.resize_graph_space(flat, &mut scene).unwrap_err();
    assert_eq!(*err.current_context(), GraphError::Configuration);
    assert_eq!(*session.bounds(), BoundingBox::default());
}

#[test]
fn config_file_drives_the_session() {
    let cfg = GraphConfig::from_json(
        r#"{ "bounds": { "min_y": 0, "max_y": 2, "interval_y": 0.5 }, "draw_axes": false }"#,
    )
    .unwrap();
    let mut scene = HeadlessScene::default();
    let mut session = GraphSession::new(cfg).unwrap();
    session.initialize(&mut scene);
    session.plot(from_complex_fn(|z| z), &mut scene).unwrap();

    assert_eq!(scene.count(ObjectKind::Axes), 0);
    assert_eq!(session.curves().len(), 5);
    assert_eq!(session.heat_map_range(), Some(HeatMapRange::new(0.0, 2.0)));
}
