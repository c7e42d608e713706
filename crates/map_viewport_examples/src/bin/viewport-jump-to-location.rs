use std::sync::Arc;
use std::thread;

use glam::{IVec2, UVec2, Vec2};
use map_viewport::prelude::*;
use map_viewport_examples::{init_tracing, BiomeClassifier, PngFrame, TerrainPool, VILLAGE_LAYER};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let screen = UVec2::new(640, 480);
    let config = ViewportConfig::new(screen).with_zoom(0.5);
    let fragment_size = config.fragment_size();
    let viewport = Arc::new(Viewport::new(TerrainPool::new(7, fragment_size), config)?);
    let classifier = BiomeClassifier { fragment_size };

    // A render thread draws continuously while the main thread jumps around.
    let renderer = {
        let viewport = Arc::clone(&viewport);
        thread::spawn(move || -> anyhow::Result<()> {
            for frame in 0..120 {
                let mut target = PngFrame::new(screen, viewport.fragment_size()).with_grid_lines(false);
                viewport.draw(&mut target, frame as f32 / 60.0)?;
            }
            Ok(())
        })
    };

    for target in [IVec2::new(1000, 1000), IVec2::new(-20_000, 4_500), IVec2::new(3, -7)] {
        viewport.center_on(target)?;
        info!(
            "Jumped to ({}, {}): fragment {:?}, biome {} ({}).",
            target.x,
            target.y,
            viewport.fragment_index_of(target),
            viewport.classify_at(target, &classifier),
            viewport.classify_alias_at(target, &classifier)
        );
        thread::yield_now();
    }
    renderer
        .join()
        .map_err(|_| anyhow::anyhow!("render thread panicked"))??;

    // Hide villages, regenerate content and write the final frame.
    viewport.set_layer_visible(VILLAGE_LAYER, false);
    viewport.refresh_fragments();
    let mut frame = PngFrame::new(screen, fragment_size);
    viewport.draw(&mut frame, 2.0)?;
    frame.save("viewport-jump.png")?;

    let center = Vec2::new(screen.x as f32, screen.y as f32) * 0.5;
    if let Some(world) = viewport.screen_to_world(center) {
        info!("Screen center shows world ({:.0}, {:.0}).", world.x, world.y);
    }

    viewport.dispose();
    info!(
        "Disposed; pool generated {} fragments in total.",
        viewport.with_pool(|pool| pool.generated)
    );
    Ok(())
}
