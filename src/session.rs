//! A plotted graph: bounds, committed curves, hover state and viewport.

use bevy_math::{Vec2, Vec3};
use tracing::{debug, info, warn};

use crate::config::GraphConfig;
use crate::core::{BoundingBox, Curve, HeatMapRange};
use crate::eval::Evaluator;
use crate::hover::{HoverMarker, HoverPicker, HoverState, HoverTransition, PointerEvent, PointerKind};
use crate::pick::RayHit;
use crate::pipeline::{PlotOutcome, PlotPipeline};
use crate::scene::{ObjectHandle, SceneBackend, SceneObject};
use crate::viewport::{PerspectiveCamera, ViewportController, ZoomDirection};

/// A curve that lives in the scene under `handle`.
#[derive(Clone, Debug, PartialEq)]
pub struct CommittedCurve {
    pub handle: ObjectHandle,
    pub curve: Curve,
}

type HoverCallback = Box<dyn FnMut(Vec3)>;
type PlotCallback = Box<dyn FnMut()>;

/// Owns everything about one graph except the pixels.
///
/// Every operation that touches the scene takes it as an argument, so the
/// same session drives the Bevy front end, the wasm bridge and tests.
pub struct GraphSession {
    config: GraphConfig,
    bounds: BoundingBox,
    evaluator: Option<Box<dyn Evaluator>>,
    curves: Vec<CommittedCurve>,
    heat_map_range: Option<HeatMapRange>,
    viewport: ViewportController,
    picker: HoverPicker,
    marker: Option<ObjectHandle>,
    on_hover_point: Option<HoverCallback>,
    on_plot_complete: Option<PlotCallback>,
}

impl GraphSession {
    pub fn new(config: GraphConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            bounds: config.bounds,
            viewport: ViewportController::new(&config),
            config,
            evaluator: None,
            curves: vec![],
            heat_map_range: None,
            picker: HoverPicker::new(),
            marker: None,
            on_hover_point: None,
            on_plot_complete: None,
        })
    }

    /// Draw the decorations the config asks for.
    pub fn initialize<S: SceneBackend + ?Sized>(&mut self, scene: &mut S) {
        self.viewport
            .apply_axes(self.config.draw_axes, &self.bounds, scene);
        self.viewport
            .apply_labels(self.config.draw_labels, &self.bounds, scene);
        self.viewport.apply_clipping(&self.bounds, scene);
    }

    pub fn set_on_hover_point(&mut self, callback: impl FnMut(Vec3) + 'static) {
        self.on_hover_point = Some(Box::new(callback));
    }

    pub fn set_on_plot_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_plot_complete = Some(Box::new(callback));
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn curves(&self) -> &[CommittedCurve] {
        &self.curves
    }

    /// `[min, max]` of the last successful plot.
    pub fn heat_map_range(&self) -> Option<HeatMapRange> {
        self.heat_map_range
    }

    pub fn hover_state(&self) -> HoverState {
        self.picker.state()
    }

    pub fn has_evaluator(&self) -> bool {
        self.evaluator.is_some()
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        self.viewport.camera()
    }

    /// Orbit controls move the camera through this.
    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        self.viewport.camera_mut()
    }

    /// Track the drawing surface's aspect ratio.
    pub fn resize_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.viewport.camera_mut().aspect = width / height;
        }
    }

    /// Plot `evaluator` over the current bounds and remember it for resizes.
    ///
    /// The new curves are added to whatever is already committed. On error
    /// nothing is committed.
    pub fn plot<E, S>(&mut self, evaluator: E, scene: &mut S) -> crate::Result<()>
    where
        E: Evaluator + 'static,
        S: SceneBackend + ?Sized,
    {
        self.evaluator = Some(Box::new(evaluator));
        self.replot(scene)
    }

    /// Remember `evaluator` without plotting; the next [`Self::replot`] draws it.
    pub fn set_evaluator(&mut self, evaluator: impl Evaluator + 'static) {
        self.evaluator = Some(Box::new(evaluator));
    }

    /// Plot the remembered evaluator again. A no-op before the first plot.
    pub fn replot<S: SceneBackend + ?Sized>(&mut self, scene: &mut S) -> crate::Result<()> {
        let Some(evaluator) = self.evaluator.as_deref() else {
            debug!("no function to plot yet");
            return Ok(());
        };
        let outcome = PlotPipeline::new(&self.bounds).run(evaluator)?;
        self.commit(outcome, scene);
        Ok(())
    }

    fn commit<S: SceneBackend + ?Sized>(&mut self, outcome: PlotOutcome, scene: &mut S) {
        let PlotOutcome { curves, range } = outcome;
        for curve in curves {
            let handle = scene.add_object(SceneObject::Curve(&curve));
            self.curves.push(CommittedCurve { handle, curve });
        }
        self.heat_map_range = Some(range);
        info!(
            curves = self.curves.len(),
            min = range.min,
            max = range.max,
            "plot committed"
        );
        if let Some(done) = self.on_plot_complete.as_mut() {
            done();
        }
    }

    /// Remove every curve and label, then rebuild axes and labels from scratch.
    ///
    /// Both decorations are switched on afterwards, even if they were off.
    pub fn clear<S: SceneBackend + ?Sized>(&mut self, scene: &mut S) {
        self.viewport.apply_axes(false, &self.bounds, scene);
        self.viewport.apply_labels(false, &self.bounds, scene);

        for committed in &self.curves {
            scene.dispose_geometry(committed.handle);
        }
        for committed in self.curves.drain(..) {
            scene.remove_object(committed.handle);
        }
        self.viewport.remove_labels(scene);
        self.remove_marker(scene);
        self.picker.reset();

        self.viewport.apply_axes(true, &self.bounds, scene);
        self.viewport.apply_labels(true, &self.bounds, scene);
        debug!("graph cleared");
    }

    /// Switch to `bounds`, rebuild everything and re-plot the last function.
    ///
    /// Invalid bounds are rejected before anything changes.
    pub fn resize_graph_space<S: SceneBackend + ?Sized>(
        &mut self,
        bounds: BoundingBox,
        scene: &mut S,
    ) -> crate::Result<()> {
        bounds
            .validate()
            .inspect_err(|e| warn!("resize rejected: {e:?}"))?;
        info!(
            rows = bounds.row_count(),
            cols = bounds.col_count(),
            "resizing graph space"
        );
        self.bounds = bounds;
        self.clear(scene);
        self.viewport.apply_clipping(&self.bounds, scene);
        self.viewport.camera_mut().frame(&self.bounds);
        self.replot(scene)
    }

    pub fn set_axes<S: SceneBackend + ?Sized>(&mut self, on: bool, scene: &mut S) {
        self.viewport.apply_axes(on, &self.bounds, scene);
    }

    pub fn set_labels<S: SceneBackend + ?Sized>(&mut self, on: bool, scene: &mut S) {
        self.viewport.apply_labels(on, &self.bounds, scene);
    }

    /// Step the field of view; returns the new value in degrees.
    pub fn zoom(&mut self, direction: ZoomDirection) -> f32 {
        self.viewport.zoom(direction)
    }

    pub fn on_move<S: SceneBackend + ?Sized>(
        &mut self,
        position: Vec2,
        viewport: Vec2,
        scene: &mut S,
    ) -> HoverTransition {
        self.on_pointer(&PointerEvent::moved(position, viewport), scene)
    }

    pub fn on_click<S: SceneBackend + ?Sized>(
        &mut self,
        position: Vec2,
        viewport: Vec2,
        scene: &mut S,
    ) -> HoverTransition {
        self.on_pointer(&PointerEvent::clicked(position, viewport), scene)
    }

    pub fn on_pointer<S: SceneBackend + ?Sized>(
        &mut self,
        event: &PointerEvent,
        scene: &mut S,
    ) -> HoverTransition {
        self.handle_pointer(event.kind, event.ndc(), scene)
    }

    /// Cast a ray through `ndc` and advance the hover state.
    pub fn handle_pointer<S: SceneBackend + ?Sized>(
        &mut self,
        kind: PointerKind,
        ndc: Vec2,
        scene: &mut S,
    ) -> HoverTransition {
        if !self.picker.accepts(kind) {
            return HoverTransition::Ignored;
        }
        self.remove_marker(scene);

        // A zero-sized surface yields a non-finite position; treat it as a miss.
        let hit = if ndc.is_finite() {
            let ray = self.viewport.camera().ray_from_ndc(ndc);
            scene
                .cast_ray(&ray)
                .filter(RayHit::is_curve)
                .map(|h| h.point)
        } else {
            None
        };

        let transition = self.picker.handle(kind, hit);
        if let HoverTransition::Set(point) = transition {
            let marker = HoverMarker::new(point, self.config.marker_radius);
            self.marker = Some(scene.add_object(SceneObject::HoverMarker(&marker)));
            debug!(?kind, x = point.x, y = point.y, z = point.z, "hover point");
            if let Some(report) = self.on_hover_point.as_mut() {
                report(point);
            }
        }
        transition
    }

    fn remove_marker<S: SceneBackend + ?Sized>(&mut self, scene: &mut S) {
        if let Some(handle) = self.marker.take() {
            scene.remove_object(handle);
            scene.dispose_geometry(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::from_complex_fn;
    use crate::scene::{HeadlessScene, ObjectKind};

    #[test]
    fn initialize_draws_decorations() {
        let mut scene = HeadlessScene::default();
        let mut session = GraphSession::new(GraphConfig::default()).unwrap();
        session.initialize(&mut scene);
        assert_eq!(scene.count(ObjectKind::Axes), 1);
        assert_eq!(scene.count(ObjectKind::Label), 12);
        assert!(scene.label_layer_visible());
        assert_eq!(scene.clipping_planes().len(), 3);
    }

    #[test]
    fn replot_without_function_is_a_no_op() {
        let mut scene = HeadlessScene::default();
        let mut session = GraphSession::new(GraphConfig::default()).unwrap();
        session.replot(&mut scene).unwrap();
        assert!(session.curves().is_empty());
        assert_eq!(session.heat_map_range(), None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = GraphConfig::default();
        cfg.bounds.interval_y = 0.0;
        assert!(GraphSession::new(cfg).is_err());
    }

    #[test]
    fn plot_appends_to_committed_curves() {
        let mut scene = HeadlessScene::default();
        let mut session = GraphSession::new(GraphConfig::default()).unwrap();
        session.plot(from_complex_fn(|z| z), &mut scene).unwrap();
        session.plot(from_complex_fn(|z| z * 2.0), &mut scene).unwrap();
        assert_eq!(session.curves().len(), 42);
        assert_eq!(scene.count(ObjectKind::Curve), 42);
        assert_eq!(session.heat_map_range(), Some(HeatMapRange::new(-20.0, 20.0)));
    }

    #[test]
    fn aspect_follows_the_surface() {
        let mut session = GraphSession::new(GraphConfig::default()).unwrap();
        session.resize_viewport(800.0, 400.0);
        assert_eq!(session.camera().aspect, 2.0);
        session.resize_viewport(0.0, 400.0);
        assert_eq!(session.camera().aspect, 2.0);
    }
}
