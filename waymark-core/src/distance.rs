//! Distances and sparse distance matrices.

use std::collections::HashMap;
use std::ops::{Add, AddAssign};
use std::time::Duration;

use crate::LatLng;

/// Travel time and road length between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Distance {
    /// Travel time.
    pub duration: Duration,
    /// Road length in metres.
    pub length_meters: i64,
}

impl Distance {
    /// The distance from a point to itself.
    pub const ZERO: Self = Self {
        duration: Duration::ZERO,
        length_meters: 0,
    };

    /// Construct a distance.
    #[must_use]
    pub const fn new(duration: Duration, length_meters: i64) -> Self {
        Self {
            duration,
            length_meters,
        }
    }
}

impl Add for Distance {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            duration: self.duration.saturating_add(rhs.duration),
            length_meters: self.length_meters.saturating_add(rhs.length_meters),
        }
    }
}

impl AddAssign for Distance {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Distances from one origin, keyed by destination.
pub type DistanceRow = HashMap<LatLng, Distance>;

/// Sparse origin → destination → [`Distance`] mapping.
///
/// The matrix is neither assumed square nor symmetric. Providers can report a
/// non-zero distance from a point to itself, so every matrix that leaves this
/// library passes through [`DistanceMatrix::with_zero_diagonal`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use waymark_core::{Distance, DistanceMatrix, LatLng};
///
/// let a = LatLng::from_e6(0, 0);
/// let b = LatLng::from_e6(0, 1);
/// let mut matrix = DistanceMatrix::new();
/// matrix.insert(a, a, Distance::new(Duration::from_secs(3), 7));
/// matrix.insert(a, b, Distance::new(Duration::from_secs(60), 500));
///
/// let matrix = matrix.with_zero_diagonal();
/// assert_eq!(matrix.get(a, a), Some(Distance::ZERO));
/// assert_eq!(matrix.get(a, b), Some(Distance::new(Duration::from_secs(60), 500)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistanceMatrix {
    rows: HashMap<LatLng, DistanceRow>,
}

impl DistanceMatrix {
    /// An empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A matrix with an empty row for every origin.
    #[must_use]
    pub fn with_origins(origins: &[LatLng]) -> Self {
        let rows = origins
            .iter()
            .map(|origin| (*origin, DistanceRow::new()))
            .collect();
        Self { rows }
    }

    /// Set the distance for a cell, returning the value it replaced.
    pub fn insert(
        &mut self,
        origin: LatLng,
        destination: LatLng,
        distance: Distance,
    ) -> Option<Distance> {
        self.rows
            .entry(origin)
            .or_default()
            .insert(destination, distance)
    }

    /// Distance for one cell, if present.
    #[must_use]
    pub fn get(&self, origin: LatLng, destination: LatLng) -> Option<Distance> {
        self.rows
            .get(&origin)
            .and_then(|row| row.get(&destination))
            .copied()
    }

    /// All distances from `origin`.
    #[must_use]
    pub fn row(&self, origin: LatLng) -> Option<&DistanceRow> {
        self.rows.get(&origin)
    }

    /// Origins present in the matrix, including those with empty rows.
    pub fn origins(&self) -> impl Iterator<Item = LatLng> + '_ {
        self.rows.keys().copied()
    }

    /// Number of origin rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of populated cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(HashMap::len).sum()
    }

    /// Iterate over every populated cell.
    pub fn iter(&self) -> impl Iterator<Item = (LatLng, LatLng, Distance)> + '_ {
        self.rows.iter().flat_map(|(origin, row)| {
            row.iter()
                .map(move |(destination, distance)| (*origin, *destination, *distance))
        })
    }

    /// Copy every row and cell of `other` into `self`; `other` wins on
    /// overlapping cells.
    pub fn absorb(&mut self, other: Self) {
        for (origin, row) in other.rows {
            self.rows.entry(origin).or_default().extend(row);
        }
    }

    /// Union a list of partial matrices. Later matrices overwrite earlier ones
    /// for the cells they share.
    #[must_use]
    pub fn merge<I>(matrices: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        matrices.into_iter().fold(Self::new(), |mut merged, matrix| {
            merged.absorb(matrix);
            merged
        })
    }

    /// Force `matrix[x][x]` to [`Distance::ZERO`] for every `x` present as
    /// both origin and destination. Cells are overwritten, never created.
    #[must_use]
    pub fn with_zero_diagonal(mut self) -> Self {
        for (origin, row) in &mut self.rows {
            if let Some(cell) = row.get_mut(origin) {
                *cell = Distance::ZERO;
            }
        }
        self
    }
}

impl FromIterator<(LatLng, LatLng, Distance)> for DistanceMatrix {
    fn from_iter<T: IntoIterator<Item = (LatLng, LatLng, Distance)>>(iter: T) -> Self {
        let mut matrix = Self::new();
        for (origin, destination, distance) in iter {
            matrix.insert(origin, destination, distance);
        }
        matrix
    }
}
