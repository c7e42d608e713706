//! The viewport: an owned, shareable context tying grid, camera and pool together.
//!
//! [`Viewport`] keeps a [`TileGrid`] sized so that it always covers the screen with
//! one fragment of slack, slides it under the camera as the pan offset moves, and
//! draws it once per frame.
//!
//! Locking:
//! - The frame lock serializes [`Viewport::draw`] and [`Viewport::dispose`].
//! - The structural lock (a read/write lock) guards the grid, the camera and the
//!   pool. Every structural mutation takes it for writing; queries take it for
//!   reading.
//!
//! The acquisition order is always frame lock, then structural lock. A frame
//! releases the structural lock between individual grid steps, so a concurrent
//! [`Viewport::center_on`] or resize from another thread lands at the next step
//! instead of waiting for the whole frame.
use std::cmp::Ordering;
use std::collections::HashSet;

use glam::{I64Vec2, IVec2, UVec2, Vec2};
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, trace, warn};

use crate::config::ViewportConfig;
use crate::error::{Error, Result};
use crate::fragment::{
    fragment_index, fragment_origin_containing, fragment_size, Classifier, Fragment,
    FragmentPool, LayerId, MapObject, UNKNOWN_CLASSIFICATION,
};
use crate::grid::{offset_origin, Axis, Edge, TileGrid};
use crate::render::{FrameSummary, FrameTarget, LayerPass};
use crate::transform::{pan_shift, required_tiles, scaled_pan, tile_pixel_size, Camera, Projection};

struct FrameState {
    frames: u64,
}

struct ViewState<P: FragmentPool> {
    pool: P,
    grid: TileGrid<P::Fragment>,
    camera: Camera,
    hidden_layers: HashSet<LayerId>,
    /// Set until the view has been centered once, and again after disposal.
    needs_centering: bool,
}

impl<P: FragmentPool> ViewState<P> {
    fn center_on(&mut self, world: IVec2, shift: u32) -> Result<()> {
        let origin = fragment_origin_containing(world, shift);
        let pan = self
            .camera
            .centered_pan(world - origin, fragment_size(shift))?;
        self.grid.add_start(&mut self.pool, origin);
        self.camera.pan = pan;
        self.needs_centering = false;
        debug!(
            "Centered on ({}, {}) in fragment ({}, {}).",
            world.x, world.y, origin.x, origin.y
        );
        Ok(())
    }

    fn len_along(&self, axis: Axis) -> usize {
        match axis {
            Axis::Column => self.grid.width(),
            Axis::Row => self.grid.height(),
        }
    }

    fn pan_along(&mut self, axis: Axis) -> &mut f32 {
        match axis {
            Axis::Column => &mut self.camera.pan.x,
            Axis::Row => &mut self.camera.pan.y,
        }
    }

    fn grow(&mut self, axis: Axis, edge: Edge) -> Result<()> {
        match axis {
            Axis::Column => self.grid.add_column(&mut self.pool, edge),
            Axis::Row => self.grid.add_row(&mut self.pool, edge),
        }
    }

    fn shrink(&mut self, axis: Axis, edge: Edge) -> Result<()> {
        match axis {
            Axis::Column => self.grid.remove_column(&mut self.pool, edge),
            Axis::Row => self.grid.remove_row(&mut self.pool, edge),
        }
    }

    /// Slides the window one fragment toward `edge` and compensates the pan offset.
    fn shift(&mut self, axis: Axis, edge: Edge, tile_px: f32) -> Result<()> {
        self.grow(axis, edge)?;
        self.shrink(axis, edge.opposite())?;
        *self.pan_along(axis) += match edge {
            Edge::Leading => -tile_px,
            Edge::Trailing => tile_px,
        };
        Ok(())
    }

    /// Moves the window `steps` fragments toward `edge` in one go, rebuilding
    /// the grid at its current size. Used when the pan offset has run further
    /// than the grid is long, where shifting step by step would only allocate
    /// fragments to throw them away again.
    ///
    /// The target window is checked against the `i32` world before anything is
    /// released, so an [`Error::OutOfWorld`] leaves the grid as it was.
    fn jump(&mut self, axis: Axis, edge: Edge, steps: i32, tile_px: f32) -> Result<()> {
        let dims = self.grid.dims();
        let size = self.grid.fragment_size();
        let first = self.grid.first().map(Fragment::origin).ok_or(Error::EmptyGrid)?;
        let offset = match edge {
            Edge::Leading => steps.checked_neg(),
            Edge::Trailing => Some(steps),
        }
        .and_then(|steps| steps.checked_mul(size))
        .ok_or(Error::OutOfWorld { axis })?;
        let origin = match axis {
            Axis::Column => offset_origin(first, IVec2::new(offset, 0), axis)?,
            Axis::Row => offset_origin(first, IVec2::new(0, offset), axis)?,
        };
        let far = origin.as_i64vec2() + (dims.as_i64vec2() - I64Vec2::ONE) * size as i64;
        if far.cmpgt(I64Vec2::splat(i32::MAX as i64)).any() {
            return Err(Error::OutOfWorld { axis });
        }

        self.grid.add_start(&mut self.pool, origin);
        for _ in 1..dims.x {
            self.grid.add_column(&mut self.pool, Edge::Trailing)?;
        }
        for _ in 1..dims.y {
            self.grid.add_row(&mut self.pool, Edge::Trailing)?;
        }

        let pan = self.pan_along(axis);
        *pan += match edge {
            Edge::Leading => -(steps as f32) * tile_px,
            Edge::Trailing => steps as f32 * tile_px,
        };
        if pan_shift(*pan, tile_px).is_some() {
            *pan = 0.0;
        }
        Ok(())
    }
}

/// Objects on visible layers with their screen positions, in grid order.
///
/// The single source of marker placement for both drawing and hit-testing.
fn visible_objects<'a, F: Fragment>(
    grid: &'a TileGrid<F>,
    hidden_layers: &'a HashSet<LayerId>,
    projection: Projection,
) -> impl Iterator<Item = (&'a MapObject, Vec2)> + 'a {
    grid.cells().flat_map(move |(cell, fragment)| {
        fragment
            .objects()
            .iter()
            .filter(move |object| !hidden_layers.contains(&object.layer))
            .map(move |object| (object, projection.local_to_screen(cell, object.position)))
    })
}

/// Scrollable, zoomable window onto an unbounded grid of fragments.
///
/// All methods take `&self`; share a viewport between threads with an `Arc`.
pub struct Viewport<P: FragmentPool> {
    frame: Mutex<FrameState>,
    state: RwLock<ViewState<P>>,
    fragment_shift: u32,
}

impl<P: FragmentPool> Viewport<P> {
    /// Creates a viewport seeded with a single fragment at the world origin.
    pub fn new(mut pool: P, config: ViewportConfig) -> Result<Self> {
        config.validate()?;
        let mut grid = TileGrid::new(config.fragment_size());
        grid.add_start(&mut pool, IVec2::ZERO);
        Ok(Self {
            frame: Mutex::new(FrameState { frames: 0 }),
            state: RwLock::new(ViewState {
                pool,
                grid,
                camera: Camera::new(config.zoom, config.screen_size),
                hidden_layers: HashSet::new(),
                needs_centering: true,
            }),
            fragment_shift: config.fragment_shift,
        })
    }

    /// Side length of a fragment in world units.
    pub fn fragment_size(&self) -> i32 {
        fragment_size(self.fragment_shift)
    }

    /// Grid-index coordinate of the fragment containing `world`.
    pub fn fragment_index_of(&self, world: IVec2) -> IVec2 {
        fragment_index(world, self.fragment_shift)
    }

    /// Renders one frame.
    ///
    /// Resizes the grid to cover the screen, normalizes the pan offset into
    /// `(-tile_px, 0]`, then draws image layers, lets the pool refresh its
    /// caches, draws live layers and finally object markers.
    ///
    /// The first call centers the view on the world origin, except when
    /// [`Viewport::center_on`] was called before it: that explicit target is
    /// kept instead of being overridden. [`Viewport::dispose`] re-arms the
    /// centering for the next frame.
    ///
    /// Fails with [`Error::OutOfWorld`] when covering the screen would need
    /// fragments beyond the `i32` world; the grid stays well formed and the
    /// camera can be moved back.
    pub fn draw<T>(&self, target: &mut T, time: f32) -> Result<FrameSummary>
    where
        T: FrameTarget<P::Fragment> + ?Sized,
    {
        let mut frame = self.frame.lock();
        let required = {
            let mut state = self.state.write();
            if state.needs_centering {
                state.center_on(IVec2::ZERO, self.fragment_shift)?;
            }
            let tile_px = tile_pixel_size(self.fragment_size(), state.camera.zoom)?;
            required_tiles(state.camera.screen, tile_px)
        };
        self.fit(Axis::Column, required.x as usize)?;
        self.fit(Axis::Row, required.y as usize)?;
        self.normalize(Axis::Column)?;
        self.normalize(Axis::Row)?;

        let summary = self.render(target, time)?;
        frame.frames += 1;
        trace!(
            "Frame {}: {}x{} fragments at {} px, {} markers.",
            frame.frames,
            summary.grid.x,
            summary.grid.y,
            summary.tile_px,
            summary.markers_drawn
        );
        Ok(summary)
    }

    /// Number of frames drawn so far.
    pub fn frame_count(&self) -> u64 {
        self.frame.lock().frames
    }

    fn fit(&self, axis: Axis, target: usize) -> Result<()> {
        let mut changed = false;
        loop {
            let mut state = self.state.write();
            match state.len_along(axis).cmp(&target) {
                Ordering::Less => state.grow(axis, Edge::Trailing)?,
                Ordering::Greater => state.shrink(axis, Edge::Trailing)?,
                Ordering::Equal => break,
            }
            changed = true;
        }
        if changed {
            debug!("Resized fragment grid to {} per {}.", target, axis);
        }
        Ok(())
    }

    fn normalize(&self, axis: Axis) -> Result<()> {
        loop {
            let mut state = self.state.write();
            let tile_px = tile_pixel_size(self.fragment_size(), state.camera.zoom)? as f32;
            let pan = *state.pan_along(axis);
            let Some(edge) = pan_shift(pan, tile_px) else {
                break;
            };
            let steps = match edge {
                Edge::Leading => (pan / tile_px).ceil(),
                Edge::Trailing => (-pan / tile_px).floor(),
            };
            if steps > state.len_along(axis) as f32 {
                debug!("Pan ran {} fragments past the grid; rebuilding along {}.", steps, axis);
                state.jump(axis, edge, steps.min(i32::MAX as f32) as i32, tile_px)?;
            } else {
                state.shift(axis, edge, tile_px)?;
            }
        }
        Ok(())
    }

    fn render<T>(&self, target: &mut T, time: f32) -> Result<FrameSummary>
    where
        T: FrameTarget<P::Fragment> + ?Sized,
    {
        let mut state = self.state.write();
        let projection = state.camera.projection(self.fragment_size())?;
        let ViewState {
            pool,
            grid,
            hidden_layers,
            ..
        } = &mut *state;

        let mut fragments_drawn = 0;
        for (cell, fragment) in grid.cells() {
            target.draw_fragment(LayerPass::Image, fragment, projection.cell_transform(cell), time);
            fragments_drawn += 1;
        }

        pool.refresh_all(&mut grid.iter_mut(), time);

        for (cell, fragment) in grid.cells() {
            target.draw_fragment(LayerPass::Live, fragment, projection.cell_transform(cell), time);
            fragments_drawn += 1;
        }

        let mut markers_drawn = 0;
        for (object, position) in visible_objects(grid, hidden_layers, projection) {
            target.draw_marker(object, position);
            markers_drawn += 1;
        }

        Ok(FrameSummary {
            grid: grid.dims(),
            tile_px: projection.tile_px as u32,
            pan: projection.pan,
            fragments_drawn,
            markers_drawn,
        })
    }

    /// Collapses the grid to the fragment containing `world` and pans so that
    /// `world` sits at the centre of the screen.
    pub fn center_on(&self, world: IVec2) -> Result<()> {
        self.state.write().center_on(world, self.fragment_shift)
    }

    /// Replaces the grid with a single fragment at `origin`.
    pub fn add_start(&self, origin: IVec2) {
        let mut state = self.state.write();
        let ViewState { pool, grid, .. } = &mut *state;
        grid.add_start(pool, origin);
    }

    /// Inserts a column of fragments at `edge`.
    pub fn add_column(&self, edge: Edge) -> Result<()> {
        self.structural(|state| state.grow(Axis::Column, edge))
    }

    /// Removes the column of fragments at `edge`.
    pub fn remove_column(&self, edge: Edge) -> Result<()> {
        self.structural(|state| state.shrink(Axis::Column, edge))
    }

    /// Inserts a row of fragments at `edge`.
    pub fn add_row(&self, edge: Edge) -> Result<()> {
        self.structural(|state| state.grow(Axis::Row, edge))
    }

    /// Removes the row of fragments at `edge`.
    pub fn remove_row(&self, edge: Edge) -> Result<()> {
        self.structural(|state| state.shrink(Axis::Row, edge))
    }

    fn structural(&self, op: impl FnOnce(&mut ViewState<P>) -> Result<()>) -> Result<()> {
        let mut state = self.state.write();
        op(&mut *state).inspect_err(|e| warn!("Rejected grid change: {}.", e))
    }

    /// Grid dimensions `(tile_width, tile_height)`.
    pub fn tile_size(&self) -> UVec2 {
        self.state.read().grid.dims()
    }

    /// World origins of all live fragments, row-major.
    pub fn fragment_origins(&self) -> Vec<IVec2> {
        self.state.read().grid.origins()
    }

    /// Checks the row/column layout of the grid.
    pub fn is_well_formed(&self) -> bool {
        self.state.read().grid.is_well_formed()
    }

    pub fn zoom(&self) -> f32 {
        self.state.read().camera.zoom
    }

    /// Sets the zoom factor. Rejects zooms at which a fragment covers less than a pixel.
    pub fn set_zoom(&self, zoom: f32) -> Result<()> {
        tile_pixel_size(self.fragment_size(), zoom)?;
        self.state.write().camera.zoom = zoom;
        Ok(())
    }

    /// Pan offset adjustment keeping `anchor` fixed across a zoom change.
    ///
    /// Apply it with [`Viewport::move_by`] after [`Viewport::set_zoom`].
    pub fn scaled_pan(&self, old_zoom: f32, new_zoom: f32, anchor: Vec2) -> Vec2 {
        scaled_pan(self.pan(), old_zoom, new_zoom, anchor)
    }

    pub fn pan(&self) -> Vec2 {
        self.state.read().camera.pan
    }

    /// Sets the pan offset. Rejects non-finite components.
    pub fn set_pan(&self, pan: Vec2) -> Result<()> {
        if !pan.is_finite() {
            return Err(Error::InvalidPan { pan });
        }
        self.state.write().camera.pan = pan;
        Ok(())
    }

    /// Moves the pan offset by `delta` screen pixels. The grid follows on the next frame.
    ///
    /// Rejects deltas that are non-finite or would make the offset non-finite.
    pub fn move_by(&self, delta: Vec2) -> Result<()> {
        let mut state = self.state.write();
        let pan = state.camera.pan + delta;
        if !pan.is_finite() {
            return Err(Error::InvalidPan { pan });
        }
        state.camera.pan = pan;
        Ok(())
    }

    pub fn screen_size(&self) -> UVec2 {
        self.state.read().camera.screen
    }

    /// Sets the screen size in pixels. The grid is resized on the next frame.
    pub fn set_screen_size(&self, screen: UVec2) {
        self.state.write().camera.screen = screen;
    }

    pub fn set_layer_visible(&self, layer: LayerId, visible: bool) {
        let mut state = self.state.write();
        if visible {
            state.hidden_layers.remove(&layer);
        } else {
            state.hidden_layers.insert(layer);
        }
    }

    pub fn is_layer_visible(&self, layer: LayerId) -> bool {
        !self.state.read().hidden_layers.contains(&layer)
    }

    /// Fragment whose grid-index coordinate is `index`, if loaded.
    ///
    /// The returned guard holds the structural lock for reading.
    pub fn fragment_at(&self, index: IVec2) -> Option<MappedRwLockReadGuard<'_, P::Fragment>> {
        let shift = self.fragment_shift;
        RwLockReadGuard::try_map(self.state.read(), |state| {
            state
                .grid
                .iter()
                .find(|fragment| fragment_index(fragment.origin(), shift) == index)
        })
        .ok()
    }

    /// Fragment containing the world point `world`, if loaded.
    pub fn fragment_containing(
        &self,
        world: IVec2,
    ) -> Option<MappedRwLockReadGuard<'_, P::Fragment>> {
        self.fragment_at(self.fragment_index_of(world))
    }

    /// Nearest object on a visible layer strictly within `max_range` screen pixels of `screen`.
    pub fn nearest_object_at(&self, screen: Vec2, max_range: f32) -> Option<MapObject> {
        let state = self.state.read();
        let projection = state.camera.projection(self.fragment_size()).ok()?;
        let mut closest = None;
        let mut closest_distance = max_range;
        for (object, position) in visible_objects(&state.grid, &state.hidden_layers, projection) {
            let distance = position.distance(screen);
            if distance < closest_distance {
                closest_distance = distance;
                closest = Some(object);
            }
        }
        closest.cloned()
    }

    /// World position under a screen point. `None` when the grid is empty.
    pub fn screen_to_world(&self, screen: Vec2) -> Option<Vec2> {
        let state = self.state.read();
        let first = state.grid.first()?.origin();
        let projection = state.camera.projection(self.fragment_size()).ok()?;
        Some(projection.screen_to_world(screen, first))
    }

    /// Screen position of a world point under the current pan and zoom.
    pub fn world_to_screen(&self, world: Vec2) -> Option<Vec2> {
        let state = self.state.read();
        let first = state.grid.first()?.origin();
        let projection = state.camera.projection(self.fragment_size()).ok()?;
        Some(projection.world_to_screen(world, first))
    }

    /// Terrain name at `world`, or [`UNKNOWN_CLASSIFICATION`] outside the loaded window.
    pub fn classify_at<C>(&self, world: IVec2, classifier: &C) -> String
    where
        C: Classifier<P::Fragment> + ?Sized,
    {
        self.classify_with(world, |fragment, local| classifier.name_at(fragment, local))
    }

    /// Terrain alias at `world`, or [`UNKNOWN_CLASSIFICATION`] outside the loaded window.
    pub fn classify_alias_at<C>(&self, world: IVec2, classifier: &C) -> String
    where
        C: Classifier<P::Fragment> + ?Sized,
    {
        self.classify_with(world, |fragment, local| classifier.alias_at(fragment, local))
    }

    fn classify_with(
        &self,
        world: IVec2,
        classify: impl FnOnce(&P::Fragment, IVec2) -> String,
    ) -> String {
        let size = self.fragment_size();
        let state = self.state.read();
        let hit = state.grid.iter().find(|fragment| {
            let local = world.as_i64vec2() - fragment.origin().as_i64vec2();
            local.cmpge(I64Vec2::ZERO).all() && local.cmplt(I64Vec2::splat(size as i64)).all()
        });
        match hit {
            Some(fragment) => classify(fragment, world - fragment.origin()),
            None => UNKNOWN_CLASSIFICATION.to_string(),
        }
    }

    /// Asks the pool to regenerate every live fragment.
    pub fn refresh_fragments(&self) {
        let mut state = self.state.write();
        let ViewState { pool, grid, .. } = &mut *state;
        for fragment in grid.iter_mut() {
            pool.refresh_fragment(fragment);
        }
    }

    /// Asks the pool to regenerate `layer` of every live fragment.
    pub fn refresh_layer(&self, layer: LayerId) {
        let mut state = self.state.write();
        let ViewState { pool, grid, .. } = &mut *state;
        for fragment in grid.iter_mut() {
            pool.refresh_fragment_layer(fragment, layer);
        }
    }

    /// Runs `f` with exclusive access to the pool.
    pub fn with_pool<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(&mut self.state.write().pool)
    }

    /// Returns every live fragment to the pool. The next frame starts over
    /// centered on the world origin unless [`Viewport::center_on`] is called first.
    pub fn dispose(&self) {
        let _frame = self.frame.lock();
        let mut state = self.state.write();
        let ViewState {
            pool,
            grid,
            needs_centering,
            ..
        } = &mut *state;
        let released = grid.len();
        grid.clear(pool);
        *needs_centering = true;
        debug!("Disposed viewport; returned {} fragments to the pool.", released);
    }
}

impl<P: FragmentPool> Drop for Viewport<P> {
    fn drop(&mut self) {
        let ViewState { pool, grid, .. } = self.state.get_mut();
        grid.clear(pool);
    }
}
