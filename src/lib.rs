pub mod config;
pub mod core;
pub mod curve;
pub mod eval;
pub mod heatmap;
pub mod hover;
pub mod pick;
pub mod pipeline;
pub mod render;
pub mod runtime;
pub mod sampler;
pub mod scene;
pub mod session;
pub mod viewport;
pub mod wasm_api;

use std::fmt;

/// Error contexts reported by the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// The evaluator failed or returned a value that could not be read.
    Evaluation,
    /// A bounding box or setting was rejected before any work started.
    Configuration,
    /// A configuration file could not be read or parsed.
    ConfigLoad,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Evaluation => write!(f, "function evaluation failed"),
            GraphError::Configuration => write!(f, "invalid graph configuration"),
            GraphError::ConfigLoad => write!(f, "failed to load graph configuration"),
        }
    }
}

impl std::error::Error for GraphError {}

pub type Result<T> = std::result::Result<T, error_stack::Report<GraphError>>;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

pub mod prelude {
    pub use crate::config::*;
    pub use crate::core::*;
    pub use crate::eval::*;
    pub use crate::hover::*;
    pub use crate::render::GraphRenderPlugin;
    pub use crate::runtime::*;
    pub use crate::scene::*;
    pub use crate::session::*;
    pub use crate::viewport::{ClippingPlane, PerspectiveCamera, ZoomDirection};
    pub use crate::{GraphError, Result};
}
