//! In-memory pool used by unit tests.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::IVec2;

use crate::fragment::{Classifier, Fragment, FragmentPool, LayerId, MapObject};

#[derive(Debug)]
pub(crate) struct TestFragment {
    pub origin: IVec2,
    pub objects: Vec<MapObject>,
    pub refreshes: usize,
    pub layer_refreshes: Vec<LayerId>,
}

impl Fragment for TestFragment {
    fn origin(&self) -> IVec2 {
        self.origin
    }

    fn objects(&self) -> &[MapObject] {
        &self.objects
    }
}

/// Records every allocation and reclaim; objects are seeded per fragment origin.
#[derive(Debug, Default)]
pub(crate) struct TestPool {
    pub allocated: Vec<IVec2>,
    pub reclaimed: Vec<IVec2>,
    pub frames_refreshed: usize,
    pub objects: HashMap<IVec2, Vec<MapObject>>,
    /// Live fragment count readable after the pool has been moved or dropped.
    pub shared_live: Arc<AtomicUsize>,
}

impl TestPool {
    pub fn with_object(mut self, origin: IVec2, object: MapObject) -> Self {
        self.objects.entry(origin).or_default().push(object);
        self
    }

    pub fn live(&self) -> usize {
        self.allocated.len() - self.reclaimed.len()
    }
}

impl FragmentPool for TestPool {
    type Fragment = TestFragment;

    fn allocate(&mut self, origin: IVec2) -> TestFragment {
        self.allocated.push(origin);
        self.shared_live.fetch_add(1, Ordering::SeqCst);
        TestFragment {
            origin,
            objects: self.objects.get(&origin).cloned().unwrap_or_default(),
            refreshes: 0,
            layer_refreshes: Vec::new(),
        }
    }

    fn reclaim(&mut self, fragment: TestFragment) {
        self.reclaimed.push(fragment.origin);
        self.shared_live.fetch_sub(1, Ordering::SeqCst);
    }

    fn refresh_all(&mut self, fragments: &mut dyn Iterator<Item = &mut TestFragment>, _time: f32) {
        self.frames_refreshed += 1;
        for fragment in fragments {
            fragment.refreshes += 1;
        }
    }

    fn refresh_fragment(&mut self, fragment: &mut TestFragment) {
        fragment.refreshes += 1;
    }

    fn refresh_fragment_layer(&mut self, fragment: &mut TestFragment, layer: LayerId) {
        fragment.layer_refreshes.push(layer);
    }
}

/// Classifies by quadrant of the fragment-local offset.
pub(crate) struct QuadrantClassifier;

impl Classifier<TestFragment> for QuadrantClassifier {
    fn name_at(&self, fragment: &TestFragment, local: IVec2) -> String {
        format!(
            "{},{}:{}{}",
            fragment.origin.x,
            fragment.origin.y,
            if local.y < 128 { "north" } else { "south" },
            if local.x < 128 { "west" } else { "east" },
        )
    }

    fn alias_at(&self, _fragment: &TestFragment, local: IVec2) -> String {
        format!("q{}{}", local.x / 128, local.y / 128)
    }
}
