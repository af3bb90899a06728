use heatcurves::prelude::*;

fn main() {
    let config = GraphConfig {
        bounds: BoundingBox::symmetric(10.0).with_interval_y(0.5),
        ..GraphConfig::default()
    };
    let mut session = match GraphSession::new(config) {
        Ok(session) => session,
        Err(report) => {
            eprintln!("{report:?}");
            return;
        }
    };

    // f(z) = z² / 10, so the real part stays inside the box.
    session.set_evaluator(from_complex_fn(|z| z * z / 10.0));
    session.set_on_hover_point(|p| println!("U = {:.3} at y = {}, x = {}", p.x, p.y, p.z));

    #[cfg(not(target_arch = "wasm32"))]
    run_graph(session);
}
