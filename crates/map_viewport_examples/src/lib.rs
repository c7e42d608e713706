#![forbid(unsafe_code)]

mod rendering;
mod terrain;

pub use rendering::{init_tracing, PngFrame};
pub use terrain::{
    Biome, BiomeClassifier, TerrainFragment, TerrainPool, BIOME_RESOLUTION, STRONGHOLD_LAYER,
    VILLAGE_LAYER,
};
