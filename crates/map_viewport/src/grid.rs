//! Rectangular window of checked-out fragments.
//!
//! [`TileGrid`] stores live fragments as rows of columns, row-major, addressed by
//! `(column, row)` cell coordinates. It grows and shrinks one row or column at a
//! time at either [`Edge`], allocating new fragments from a [`FragmentPool`] and
//! handing removed ones back to it. Neighbouring cells always hold fragments whose
//! origins differ by exactly one fragment size along the neighbouring axis.
use std::collections::VecDeque;
use std::fmt;

use glam::{IVec2, UVec2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fragment::{Fragment, FragmentPool};

/// Side of the grid a structural operation applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Edge {
    /// Left for columns, top for rows.
    Leading,
    /// Right for columns, bottom for rows.
    Trailing,
}

impl Edge {
    /// The other edge along the same axis.
    pub fn opposite(self) -> Self {
        match self {
            Edge::Leading => Edge::Trailing,
            Edge::Trailing => Edge::Leading,
        }
    }
}

/// Grid axis named in structural errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

/// Index-addressed grid of fragments covering a rectangular block of the world.
pub struct TileGrid<F> {
    rows: VecDeque<VecDeque<F>>,
    width: usize,
    fragment_size: i32,
}

impl<F: Fragment> TileGrid<F> {
    /// Creates an empty grid for fragments of `fragment_size` world units.
    pub fn new(fragment_size: i32) -> Self {
        debug_assert!(fragment_size > 0, "fragment_size must be > 0");
        Self {
            rows: VecDeque::new(),
            width: 0,
            fragment_size,
        }
    }

    /// Number of columns (`tile_width`).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows (`tile_height`).
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Grid dimensions as `(columns, rows)`.
    pub fn dims(&self) -> UVec2 {
        UVec2::new(self.width as u32, self.rows.len() as u32)
    }

    /// Number of live fragments.
    pub fn len(&self) -> usize {
        self.width * self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn fragment_size(&self) -> i32 {
        self.fragment_size
    }

    /// Fragment in the first row and column.
    pub fn first(&self) -> Option<&F> {
        self.rows.front().and_then(|row| row.front())
    }

    /// Fragment at `(column, row)`.
    pub fn get(&self, cell: UVec2) -> Option<&F> {
        self.rows
            .get(cell.y as usize)
            .and_then(|row| row.get(cell.x as usize))
    }

    /// Iterates fragments row-major together with their `(column, row)` cell.
    pub fn cells(&self) -> impl Iterator<Item = (UVec2, &F)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, fragment)| (UVec2::new(x as u32, y as u32), fragment))
        })
    }

    /// Iterates fragments row-major.
    pub fn iter(&self) -> impl Iterator<Item = &F> + '_ {
        self.rows.iter().flat_map(|row| row.iter())
    }

    /// Iterates fragments row-major, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut F> + '_ {
        self.rows.iter_mut().flat_map(|row| row.iter_mut())
    }

    /// World origins of all fragments, row-major.
    pub fn origins(&self) -> Vec<IVec2> {
        self.iter().map(Fragment::origin).collect()
    }

    /// Replaces the grid with a single fragment at `origin`.
    pub fn add_start<P>(&mut self, pool: &mut P, origin: IVec2)
    where
        P: FragmentPool<Fragment = F>,
    {
        self.clear(pool);
        let mut row = VecDeque::with_capacity(1);
        row.push_back(pool.allocate(origin));
        self.rows.push_back(row);
        self.width = 1;
    }

    /// Returns every fragment to `pool`, leaving the grid empty.
    pub fn clear<P>(&mut self, pool: &mut P)
    where
        P: FragmentPool<Fragment = F>,
    {
        for row in self.rows.drain(..) {
            for fragment in row {
                pool.reclaim(fragment);
            }
        }
        self.width = 0;
    }

    /// Inserts one fragment at `edge` of every row.
    ///
    /// Fails with [`Error::OutOfWorld`] when the new column's origins would
    /// leave the `i32` world; the grid is unchanged in that case.
    pub fn add_column<P>(&mut self, pool: &mut P, edge: Edge) -> Result<()>
    where
        P: FragmentPool<Fragment = F>,
    {
        if self.is_empty() {
            return Err(Error::EmptyGrid);
        }
        let step = match edge {
            Edge::Leading => -self.fragment_size,
            Edge::Trailing => self.fragment_size,
        };
        let origins = self
            .rows
            .iter()
            .map(|row| {
                let neighbour = match edge {
                    Edge::Leading => row.front(),
                    Edge::Trailing => row.back(),
                }
                .ok_or(Error::EmptyGrid)?;
                offset_origin(neighbour.origin(), IVec2::new(step, 0), Axis::Column)
            })
            .collect::<Result<Vec<_>>>()?;

        for (row, origin) in self.rows.iter_mut().zip(origins) {
            let fragment = pool.allocate(origin);
            match edge {
                Edge::Leading => row.push_front(fragment),
                Edge::Trailing => row.push_back(fragment),
            }
        }
        self.width += 1;
        Ok(())
    }

    /// Removes the fragment at `edge` of every row and reclaims it.
    ///
    /// A single-column grid is rejected at both edges.
    pub fn remove_column<P>(&mut self, pool: &mut P, edge: Edge) -> Result<()>
    where
        P: FragmentPool<Fragment = F>,
    {
        if self.is_empty() {
            return Err(Error::EmptyGrid);
        }
        if self.width <= 1 {
            return Err(Error::GridUnderflow { axis: Axis::Column });
        }
        for row in self.rows.iter_mut() {
            let removed = match edge {
                Edge::Leading => row.pop_front(),
                Edge::Trailing => row.pop_back(),
            };
            if let Some(fragment) = removed {
                pool.reclaim(fragment);
            }
        }
        self.width -= 1;
        Ok(())
    }

    /// Builds a full row of fresh fragments above (`Leading`) or below (`Trailing`) the grid.
    ///
    /// Fails with [`Error::OutOfWorld`] when the new row's origins would leave
    /// the `i32` world; the grid is unchanged in that case.
    pub fn add_row<P>(&mut self, pool: &mut P, edge: Edge) -> Result<()>
    where
        P: FragmentPool<Fragment = F>,
    {
        let neighbour = match edge {
            Edge::Leading => self.rows.front(),
            Edge::Trailing => self.rows.back(),
        }
        .and_then(|row| row.front())
        .ok_or(Error::EmptyGrid)?;
        let step = match edge {
            Edge::Leading => -self.fragment_size,
            Edge::Trailing => self.fragment_size,
        };
        let start = offset_origin(neighbour.origin(), IVec2::new(0, step), Axis::Row)?;
        // The row spans the same columns as the existing ones, which already fit.
        let origins: Vec<IVec2> = (0..self.width as i32)
            .map(|column| IVec2::new(start.x + column * self.fragment_size, start.y))
            .collect();

        let row: VecDeque<F> = origins
            .into_iter()
            .map(|origin| pool.allocate(origin))
            .collect();
        match edge {
            Edge::Leading => self.rows.push_front(row),
            Edge::Trailing => self.rows.push_back(row),
        }
        Ok(())
    }

    /// Removes the row at `edge` and reclaims its fragments.
    pub fn remove_row<P>(&mut self, pool: &mut P, edge: Edge) -> Result<()>
    where
        P: FragmentPool<Fragment = F>,
    {
        if self.is_empty() {
            return Err(Error::EmptyGrid);
        }
        if self.rows.len() <= 1 {
            return Err(Error::GridUnderflow { axis: Axis::Row });
        }
        let removed = match edge {
            Edge::Leading => self.rows.pop_front(),
            Edge::Trailing => self.rows.pop_back(),
        };
        for fragment in removed.into_iter().flatten() {
            pool.reclaim(fragment);
        }
        Ok(())
    }

    /// Checks that every row has `width` fragments laid out one fragment size apart.
    pub fn is_well_formed(&self) -> bool {
        let Some(first) = self.first() else {
            return self.width == 0;
        };
        let base = first.origin();
        self.rows.iter().all(|row| row.len() == self.width)
            && self.cells().all(|(cell, fragment)| {
                fragment.origin() == base + cell.as_ivec2() * self.fragment_size
            })
    }
}

/// `origin + offset`, or [`Error::OutOfWorld`] if either component overflows.
pub(crate) fn offset_origin(origin: IVec2, offset: IVec2, axis: Axis) -> Result<IVec2> {
    match (
        origin.x.checked_add(offset.x),
        origin.y.checked_add(offset.y),
    ) {
        (Some(x), Some(y)) => Ok(IVec2::new(x, y)),
        _ => Err(Error::OutOfWorld { axis }),
    }
}
