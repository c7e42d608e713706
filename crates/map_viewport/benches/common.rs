use std::time::Duration;

use criterion::{Criterion, Throughput};
use glam::{Affine2, IVec2, Vec2};
use map_viewport::prelude::*;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn fragments_throughput(fragments: usize) -> Throughput {
    Throughput::Elements(fragments.max(1) as u64)
}

pub struct BenchFragment {
    origin: IVec2,
    objects: Vec<MapObject>,
}

impl Fragment for BenchFragment {
    fn origin(&self) -> IVec2 {
        self.origin
    }

    fn objects(&self) -> &[MapObject] {
        &self.objects
    }
}

/// Recycles fragments through a free list and seeds `objects_per_fragment`
/// markers on a diagonal.
pub struct BenchPool {
    free: Vec<BenchFragment>,
    objects_per_fragment: i32,
}

impl BenchPool {
    pub fn new(objects_per_fragment: i32) -> Self {
        Self {
            free: Vec::new(),
            objects_per_fragment,
        }
    }
}

impl FragmentPool for BenchPool {
    type Fragment = BenchFragment;

    fn allocate(&mut self, origin: IVec2) -> BenchFragment {
        let mut fragment = self.free.pop().unwrap_or(BenchFragment {
            origin,
            objects: Vec::new(),
        });
        fragment.origin = origin;
        fragment.objects.clear();
        for i in 0..self.objects_per_fragment {
            fragment
                .objects
                .push(MapObject::new(LayerId((i % 4) as u16), IVec2::splat(i * 7), "poi"));
        }
        fragment
    }

    fn reclaim(&mut self, fragment: BenchFragment) {
        self.free.push(fragment);
    }

    fn refresh_all(&mut self, fragments: &mut dyn Iterator<Item = &mut BenchFragment>, _time: f32) {
        for fragment in fragments {
            std::hint::black_box(&fragment.origin);
        }
    }

    fn refresh_fragment(&mut self, _fragment: &mut BenchFragment) {}
}

/// Accumulates translations so draw calls are not optimized away.
#[derive(Default)]
pub struct SinkTarget {
    pub acc: Vec2,
}

impl FrameTarget<BenchFragment> for SinkTarget {
    fn draw_fragment(
        &mut self,
        _pass: LayerPass,
        _fragment: &BenchFragment,
        transform: Affine2,
        _time: f32,
    ) {
        self.acc += transform.translation;
    }

    fn draw_marker(&mut self, _object: &MapObject, position: Vec2) {
        self.acc += position;
    }
}
