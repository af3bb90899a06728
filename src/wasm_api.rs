//! JavaScript bindings.
//!
//! `JsGraph` runs a session against a headless scene so a page can plot,
//! pick and read back curve buffers without a Bevy window. `start` hands the
//! same configuration and function to the Bevy front end on a canvas.

#![cfg(target_arch = "wasm32")]

use std::sync::Arc;

use bevy_math::{Vec2, Vec3};
use error_stack::Report;
use js_sys::{Function, Object, Reflect};
use parking_lot::Mutex;
use wasm_bindgen::prelude::*;

use crate::GraphError;
use crate::config::GraphConfig;
use crate::core::BoundingBox;
use crate::eval::{EvalInputs, EvalOutput, Evaluator};
use crate::hover::HoverTransition;
use crate::runtime::run_graph;
use crate::scene::HeadlessScene;
use crate::session::GraphSession;
use crate::viewport::ZoomDirection;

/// Calls a JS `f({ z: { re, im }, y, x })` returning a number or `{ re, im }`.
#[derive(Clone)]
struct JsEvaluator(Function);

fn js_failure(e: JsValue) -> Report<GraphError> {
    Report::new(GraphError::Evaluation).attach(format!("{e:?}"))
}

fn set(target: &Object, key: &str, value: JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), &value).map(|_| ())
}

fn js_inputs(inputs: &EvalInputs) -> Result<JsValue, JsValue> {
    let z = Object::new();
    set(&z, "re", inputs.z.re.into())?;
    set(&z, "im", inputs.z.im.into())?;
    let arg = Object::new();
    set(&arg, "z", z.into())?;
    set(&arg, "y", inputs.y.into())?;
    set(&arg, "x", inputs.x.into())?;
    Ok(arg.into())
}

fn read_output(value: &JsValue) -> crate::Result<EvalOutput> {
    if let Some(re) = value.as_f64() {
        return Ok(EvalOutput::Real(re));
    }
    let field = |key: &str| {
        Reflect::get(value, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_f64())
    };
    match field("re") {
        Some(re) => Ok(EvalOutput::Complex { re, im: field("im") }),
        None => Err(Report::new(GraphError::Evaluation)
            .attach(format!("expected a number or {{ re, im }}, got {value:?}"))),
    }
}

impl Evaluator for JsEvaluator {
    fn evaluate(&self, inputs: &EvalInputs) -> crate::Result<EvalOutput> {
        let arg = js_inputs(inputs).map_err(js_failure)?;
        let out = self.0.call1(&JsValue::NULL, &arg).map_err(js_failure)?;
        read_output(&out)
    }
}

fn to_js(report: Report<GraphError>) -> JsValue {
    JsValue::from_str(&format!("{report:?}"))
}

#[wasm_bindgen]
pub struct JsGraph {
    config: GraphConfig,
    function: Option<Function>,
    session: GraphSession,
    scene: HeadlessScene,
    /// Last point reported by the session, kept for polling callers.
    last_point: Arc<Mutex<Option<Vec3>>>,
    on_hover: Arc<Mutex<Option<Function>>>,
}

#[wasm_bindgen]
impl JsGraph {
    /// Create a graph from an optional JSON `GraphConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<JsGraph, JsValue> {
        let config = match config_json {
            Some(json) => GraphConfig::from_json(&json).map_err(to_js)?,
            None => GraphConfig::default(),
        };
        let mut session = GraphSession::new(config.clone()).map_err(to_js)?;
        let mut scene = HeadlessScene::new(config.pick_threshold);
        session.initialize(&mut scene);

        let last_point = Arc::new(Mutex::new(None));
        let on_hover: Arc<Mutex<Option<Function>>> = Arc::new(Mutex::new(None));
        {
            let last_point = last_point.clone();
            let on_hover = on_hover.clone();
            session.set_on_hover_point(move |p: Vec3| {
                *last_point.lock() = Some(p);
                if let Some(f) = on_hover.lock().as_ref() {
                    let point = js_sys::Float32Array::from(&p.to_array()[..]);
                    if let Err(e) = f.call1(&JsValue::NULL, &point) {
                        web_sys::console::error_1(&e);
                    }
                }
            });
        }

        Ok(JsGraph {
            config,
            function: None,
            session,
            scene,
            last_point,
            on_hover,
        })
    }

    /// Sample `f` over the current bounds and commit the curves.
    pub fn plot(&mut self, f: Function) -> Result<(), JsValue> {
        self.function = Some(f.clone());
        self.session
            .plot(JsEvaluator(f), &mut self.scene)
            .map_err(to_js)
    }

    pub fn clear(&mut self) {
        self.session.clear(&mut self.scene);
        *self.last_point.lock() = None;
    }

    /// Resize to a JSON `BoundingBox` and re-plot.
    pub fn resize_graph_space(&mut self, bounds_json: &str) -> Result<(), JsValue> {
        let bounds: BoundingBox = serde_json::from_str(bounds_json)
            .map_err(|e| JsValue::from_str(&format!("invalid bounds: {e}")))?;
        self.session
            .resize_graph_space(bounds, &mut self.scene)
            .map_err(to_js)
    }

    /// Returns the new field of view in degrees.
    pub fn zoom(&mut self, out: bool) -> f32 {
        let direction = if out { ZoomDirection::Out } else { ZoomDirection::In };
        self.session.zoom(direction)
    }

    /// Returns true when the hover point was set.
    pub fn on_move(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        let t = self
            .session
            .on_move(Vec2::new(x, y), Vec2::new(width, height), &mut self.scene);
        self.track(t)
    }

    pub fn on_click(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        let t = self
            .session
            .on_click(Vec2::new(x, y), Vec2::new(width, height), &mut self.scene);
        self.track(t)
    }

    pub fn set_on_hover_point(&mut self, f: Option<Function>) {
        *self.on_hover.lock() = f;
    }

    pub fn set_on_plot_complete(&mut self, f: Function) {
        self.session.set_on_plot_complete(move || {
            if let Err(e) = f.call0(&JsValue::NULL) {
                web_sys::console::error_1(&e);
            }
        });
    }

    pub fn set_axes(&mut self, on: bool) {
        self.session.set_axes(on, &mut self.scene);
    }

    pub fn set_labels(&mut self, on: bool) {
        self.session.set_labels(on, &mut self.scene);
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.session.resize_viewport(width, height);
    }

    pub fn curve_count(&self) -> usize {
        self.session.curves().len()
    }

    /// Graph-space `xyz` triples of curve `index`.
    pub fn curve_positions(&self, index: usize) -> Option<Vec<f32>> {
        self.session.curves().get(index).map(|c| {
            c.curve
                .world_points()
                .iter()
                .flat_map(|p| p.to_array())
                .collect()
        })
    }

    /// `rgb` bytes of curve `index`, one triple per vertex.
    pub fn curve_colors(&self, index: usize) -> Option<Vec<u8>> {
        self.session
            .curves()
            .get(index)
            .map(|c| c.curve.color_buffer())
    }

    pub fn curve_row(&self, index: usize) -> Option<f64> {
        self.session.curves().get(index).map(|c| c.curve.row)
    }

    /// `[min, max]` of the last plot.
    pub fn heat_map_range(&self) -> Option<Vec<f64>> {
        self.session.heat_map_range().map(|r| r.to_array().to_vec())
    }

    pub fn hover_point(&self) -> Option<Vec<f32>> {
        (*self.last_point.lock()).map(|p| p.to_array().to_vec())
    }

    pub fn is_fixed(&self) -> bool {
        self.session.hover_state().is_fixed
    }

    pub fn fov(&self) -> f32 {
        self.session.camera().fov
    }

    /// Run the Bevy front end on `canvas_id` with this config and the last
    /// plotted function.
    pub fn start(&self, canvas_id: &str) -> Result<(), JsValue> {
        let mut config = self.config.clone();
        config.bounds = *self.session.bounds();
        let mut session = GraphSession::new(config).map_err(to_js)?;
        if let Some(f) = &self.function {
            session.set_evaluator(JsEvaluator(f.clone()));
        }
        run_graph(session, canvas_id);
        Ok(())
    }
}

impl JsGraph {
    fn track(&self, transition: HoverTransition) -> bool {
        match transition {
            HoverTransition::Set(_) => true,
            HoverTransition::Cleared => {
                *self.last_point.lock() = None;
                false
            }
            HoverTransition::Ignored => false,
        }
    }
}
