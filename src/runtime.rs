use bevy::prelude::*;

use crate::render::{GraphRenderPlugin, SceneRegistry, SessionRes};
use crate::session::GraphSession;

fn graph_app(session: GraphSession) -> App {
    let bg = session.config().background;
    let threshold = session.config().pick_threshold;
    let mut app = App::new();
    app.insert_resource(ClearColor(bg.into()))
        .insert_resource(SceneRegistry::new(threshold))
        .insert_non_send_resource(SessionRes::new(session));
    app
}

/// Open a window and draw `session`.
///
/// A function set with [`GraphSession::set_evaluator`] is plotted on startup.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_graph(session: GraphSession) {
    graph_app(session)
        .add_plugins((DefaultPlugins, GraphRenderPlugin))
        .run();
}

#[cfg(target_arch = "wasm32")]
pub fn run_graph(session: GraphSession, canvas_id: &str) {
    graph_app(session)
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    canvas: Some(format!("#{}", canvas_id)),
                    fit_canvas_to_parent: true,
                    ..default()
                }),
                ..default()
            }),
            GraphRenderPlugin,
        ))
        .run();
}
