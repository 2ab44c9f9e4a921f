pub(crate) mod dirs;
pub(crate) mod err;
pub mod ext;
pub(crate) mod grid;
pub(crate) mod oracle;
#[cfg(feature = "profiling")]
pub mod perf;
pub(crate) mod rng;
pub(crate) mod solver;
pub(crate) mod util;

use ext::MaybeSerde;
use std::{fmt::Debug, hash::Hash};

pub use strum;

pub mod prelude {
  pub use super::{
    Tile,
    dirs::Direction,
    err::Error,
    grid::{Grid, Wrap},
    oracle::{Adjacency, CompatibilityOracle},
    rng::{MinSampler, RngSampler, Sampler},
    solver::{CancelToken, Observation, Solver, SolverBuilder, Superposition},
    util::{Pos, Size},
  };
}

pub use prelude::*;

/// Anything a grid cell can hold. Equality and hashing are structural,
/// which is what lets the oracle and the distinct-tile scan deduplicate by
/// value.
pub trait Tile: Debug + Eq + Hash + Ord + Clone + MaybeSerde {}

impl<T> Tile for T where T: Debug + Eq + Hash + Ord + Clone + MaybeSerde {}
