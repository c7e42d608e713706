//! Procedural fragment content for the demos.
use glam::IVec2;
use map_viewport::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Biome cells per fragment side.
pub const BIOME_RESOLUTION: usize = 16;

pub const VILLAGE_LAYER: LayerId = LayerId(0);
pub const STRONGHOLD_LAYER: LayerId = LayerId(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Biome {
    Ocean,
    Plains,
    Forest,
    Desert,
    Mountains,
}

impl Biome {
    const ALL: [Biome; 5] = [
        Biome::Ocean,
        Biome::Plains,
        Biome::Forest,
        Biome::Desert,
        Biome::Mountains,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Biome::Ocean => "Ocean",
            Biome::Plains => "Plains",
            Biome::Forest => "Forest",
            Biome::Desert => "Desert",
            Biome::Mountains => "Extreme Hills",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            Biome::Mountains => "Mountains",
            other => other.name(),
        }
    }

    pub fn color(self) -> [u8; 3] {
        match self {
            Biome::Ocean => [40, 70, 160],
            Biome::Plains => [140, 190, 90],
            Biome::Forest => [40, 110, 50],
            Biome::Desert => [220, 200, 130],
            Biome::Mountains => [130, 130, 130],
        }
    }
}

pub struct TerrainFragment {
    origin: IVec2,
    objects: Vec<MapObject>,
    biomes: Vec<Biome>,
    /// Seconds at which the live layer was last regenerated.
    pub refreshed_at: f32,
}

impl TerrainFragment {
    pub fn biome_at_cell(&self, cell_x: usize, cell_y: usize) -> Biome {
        self.biomes[cell_y * BIOME_RESOLUTION + cell_x]
    }
}

impl Fragment for TerrainFragment {
    fn origin(&self) -> IVec2 {
        self.origin
    }

    fn objects(&self) -> &[MapObject] {
        &self.objects
    }
}

/// Deterministic, seed-driven content generator with a free list.
pub struct TerrainPool {
    seed: u64,
    fragment_size: i32,
    free: Vec<TerrainFragment>,
    pub generated: usize,
}

impl TerrainPool {
    pub fn new(seed: u64, fragment_size: i32) -> Self {
        Self {
            seed,
            fragment_size,
            free: Vec::new(),
            generated: 0,
        }
    }

    fn rng_for(&self, origin: IVec2) -> StdRng {
        let mixed = self.seed
            ^ (origin.x as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (origin.y as i64 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        StdRng::seed_from_u64(mixed)
    }

    fn generate(&mut self, fragment: &mut TerrainFragment) {
        let mut rng = self.rng_for(fragment.origin);
        fragment.biomes.clear();
        for _ in 0..BIOME_RESOLUTION * BIOME_RESOLUTION {
            fragment
                .biomes
                .push(Biome::ALL[rng.random_range(0..Biome::ALL.len())]);
        }
        fragment.objects.clear();
        if rng.random::<f32>() < 0.4 {
            let position = IVec2::new(
                rng.random_range(0..self.fragment_size),
                rng.random_range(0..self.fragment_size),
            );
            fragment
                .objects
                .push(MapObject::new(VILLAGE_LAYER, position, "Village"));
        }
        if rng.random::<f32>() < 0.05 {
            let position = IVec2::splat(self.fragment_size / 2);
            fragment
                .objects
                .push(MapObject::new(STRONGHOLD_LAYER, position, "Stronghold"));
        }
        self.generated += 1;
    }
}

impl FragmentPool for TerrainPool {
    type Fragment = TerrainFragment;

    fn allocate(&mut self, origin: IVec2) -> TerrainFragment {
        let mut fragment = self.free.pop().unwrap_or_else(|| TerrainFragment {
            origin,
            objects: Vec::new(),
            biomes: Vec::with_capacity(BIOME_RESOLUTION * BIOME_RESOLUTION),
            refreshed_at: 0.0,
        });
        fragment.origin = origin;
        self.generate(&mut fragment);
        fragment
    }

    fn reclaim(&mut self, fragment: TerrainFragment) {
        self.free.push(fragment);
    }

    fn refresh_all(
        &mut self,
        fragments: &mut dyn Iterator<Item = &mut TerrainFragment>,
        time: f32,
    ) {
        for fragment in fragments {
            fragment.refreshed_at = time;
        }
    }

    fn refresh_fragment(&mut self, fragment: &mut TerrainFragment) {
        debug!(
            "Regenerating fragment ({}, {}).",
            fragment.origin.x, fragment.origin.y
        );
        self.generate(fragment);
    }
}

/// Names the biome under a fragment-local offset.
pub struct BiomeClassifier {
    pub fragment_size: i32,
}

impl BiomeClassifier {
    fn biome(&self, fragment: &TerrainFragment, local: IVec2) -> Biome {
        let cell = (local * BIOME_RESOLUTION as i32 / self.fragment_size)
            .clamp(IVec2::ZERO, IVec2::splat(BIOME_RESOLUTION as i32 - 1));
        fragment.biome_at_cell(cell.x as usize, cell.y as usize)
    }
}

impl Classifier<TerrainFragment> for BiomeClassifier {
    fn name_at(&self, fragment: &TerrainFragment, local: IVec2) -> String {
        self.biome(fragment, local).name().to_string()
    }

    fn alias_at(&self, fragment: &TerrainFragment, local: IVec2) -> String {
        self.biome(fragment, local).alias().to_string()
    }
}
