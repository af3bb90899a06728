pub mod backend;
pub mod components;
pub mod resources;
pub mod systems;

pub use backend::*;
pub use components::*;
pub use resources::*;
use systems::*;

use bevy::prelude::*;

/// Draws a [`SessionRes`] and forwards pointer, orbit and keyboard input to it.
///
/// The session must be inserted as a non-send resource before the app runs.
#[derive(Default)]
pub struct GraphRenderPlugin;

impl Plugin for GraphRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneRegistry>()
            .init_resource::<PointerDrag>()
            .add_message::<GraphCommand>()
            .add_systems(Startup, (setup_graph_camera, plot_on_startup).chain())
            .add_systems(
                Update,
                (
                    keyboard_shortcuts,
                    apply_graph_commands,
                    orbit_camera,
                    sync_graph_camera,
                    pick_under_cursor,
                    place_labels,
                    update_hover_readout,
                )
                    .chain(),
            );
    }
}
