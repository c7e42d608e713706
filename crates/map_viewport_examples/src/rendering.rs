use std::path::Path;

use glam::{Affine2, IVec2, UVec2, Vec2};
use image::{Rgba, RgbaImage};
use map_viewport::prelude::*;
use tracing::info;

use crate::terrain::{TerrainFragment, BIOME_RESOLUTION, STRONGHOLD_LAYER};

/// Initializes a fmt subscriber honouring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,map_viewport=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Software frame target rasterizing one frame into an RGBA image.
pub struct PngFrame {
    image: RgbaImage,
    fragment_size: i32,
    marker_radius: i32,
    grid_lines: bool,
}

impl PngFrame {
    /// Creates a black frame of `screen` pixels for fragments of `fragment_size` world units.
    pub fn new(screen: UVec2, fragment_size: i32) -> Self {
        Self {
            image: RgbaImage::from_pixel(screen.x.max(1), screen.y.max(1), Rgba([0, 0, 0, 255])),
            fragment_size,
            marker_radius: 4,
            grid_lines: true,
        }
    }

    pub fn with_grid_lines(mut self, grid_lines: bool) -> Self {
        self.grid_lines = grid_lines;
        self
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.image.save(path)?;
        info!("Wrote {}", path.display());
        Ok(())
    }

    fn fill_rect(&mut self, min: Vec2, max: Vec2, color: [u8; 3]) {
        let (w, h) = self.image.dimensions();
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(w);
        let y1 = (max.y.ceil().max(0.0) as u32).min(h);
        for y in y0..y1 {
            for x in x0..x1 {
                self.image
                    .put_pixel(x, y, Rgba([color[0], color[1], color[2], 255]));
            }
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 3], alpha: f32) {
        let (w, h) = self.image.dimensions();
        if x < 0 || y < 0 || x as u32 >= w || y as u32 >= h {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        for (channel, &target) in pixel.0.iter_mut().zip(color.iter()) {
            *channel = (*channel as f32 * (1.0 - alpha) + target as f32 * alpha) as u8;
        }
    }
}

impl FrameTarget<TerrainFragment> for PngFrame {
    fn draw_fragment(
        &mut self,
        pass: LayerPass,
        fragment: &TerrainFragment,
        transform: Affine2,
        time: f32,
    ) {
        let cell_world = self.fragment_size as f32 / BIOME_RESOLUTION as f32;
        match pass {
            LayerPass::Image => {
                for cell_y in 0..BIOME_RESOLUTION {
                    for cell_x in 0..BIOME_RESOLUTION {
                        let local = Vec2::new(cell_x as f32, cell_y as f32) * cell_world;
                        let min = transform.transform_point2(local);
                        let max = transform.transform_point2(local + Vec2::splat(cell_world));
                        self.fill_rect(min, max, fragment.biome_at_cell(cell_x, cell_y).color());
                    }
                }
            }
            LayerPass::Live => {
                if !self.grid_lines {
                    return;
                }
                let top_left = transform.translation.as_ivec2();
                let extent = transform
                    .transform_vector2(Vec2::splat(self.fragment_size as f32))
                    .x as i32;
                let alpha = if fragment.refreshed_at == time {
                    0.25 + 0.15 * (time * 2.0).sin()
                } else {
                    0.1
                };
                for i in 0..extent {
                    self.blend_pixel(top_left.x + i, top_left.y, [255, 255, 255], alpha);
                    self.blend_pixel(top_left.x, top_left.y + i, [255, 255, 255], alpha);
                }
            }
        }
    }

    fn draw_marker(&mut self, object: &MapObject, position: Vec2) {
        let color = if object.layer == STRONGHOLD_LAYER {
            [200, 30, 30]
        } else {
            [250, 220, 40]
        };
        let center = position.round().as_ivec2();
        let r = self.marker_radius;
        for dy in -r..=r {
            for dx in -r..=r {
                if IVec2::new(dx, dy).length_squared() <= r * r {
                    self.blend_pixel(center.x + dx, center.y + dy, color, 1.0);
                }
            }
        }
    }
}
