use glam::{UVec2, Vec2};
use map_viewport::prelude::*;
use map_viewport_examples::{init_tracing, PngFrame, TerrainPool};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let screen = UVec2::new(800, 600);
    let config = ViewportConfig::new(screen).with_zoom(0.25);
    let fragment_size = config.fragment_size();
    let viewport = Viewport::new(TerrainPool::new(42, fragment_size), config)?;

    // Frame 0: initial view centered on the world origin.
    render(&viewport, screen, 0.0, "viewport-pan-0.png")?;

    // Drag a little over two fragments to the left and up.
    for step in 1..=6 {
        viewport.move_by(Vec2::new(-50.0, -20.0))?;
        render(&viewport, screen, step as f32 * 0.1, &format!("viewport-pan-{step}.png"))?;
    }

    // Zoom in toward the mouse position.
    let anchor = Vec2::new(600.0, 150.0);
    let (old_zoom, new_zoom) = (viewport.zoom(), 0.5);
    let delta = viewport.scaled_pan(old_zoom, new_zoom, anchor);
    viewport.set_zoom(new_zoom)?;
    viewport.move_by(delta)?;
    render(&viewport, screen, 1.0, "viewport-zoomed.png")?;

    if let Some(object) = viewport.nearest_object_at(anchor, 64.0) {
        info!("Nearest to the cursor: {} on layer {}", object.label, object.layer.0);
    }
    info!(
        "Generated {} fragments over {} frames.",
        viewport.with_pool(|pool| pool.generated),
        viewport.frame_count()
    );
    Ok(())
}

fn render(
    viewport: &Viewport<TerrainPool>,
    screen: UVec2,
    time: f32,
    out_path: &str,
) -> anyhow::Result<()> {
    let mut frame = PngFrame::new(screen, viewport.fragment_size());
    let summary = viewport.draw(&mut frame, time)?;
    info!(
        "{}: {}x{} fragments, pan ({:.1}, {:.1}).",
        out_path, summary.grid.x, summary.grid.y, summary.pan.x, summary.pan.y
    );
    frame.save(out_path)
}
