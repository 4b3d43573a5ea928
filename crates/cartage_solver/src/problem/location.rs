use serde::Serialize;

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

/// A matrix rank plus the coordinates it was announced with, if any.
/// Coordinates are advisory: they are echoed back in the output document and
/// never consulted by the engine, which only ever reads ranks.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    rank: usize,
    coordinates: Option<[f64; 2]>,
}

impl Location {
    pub fn new(rank: usize, coordinates: Option<[f64; 2]>) -> Self {
        Location { rank, coordinates }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// `[lon, lat]` as provided by the input document.
    pub fn coordinates(&self) -> Option<[f64; 2]> {
        self.coordinates
    }
}
