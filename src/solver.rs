use crate::{
  Tile,
  dirs::Direction,
  err::Error,
  grid::{Grid, Wrap},
  oracle::{Adjacency, CompatibilityOracle},
  rng::Sampler,
  util::{Pos, Size},
};
use derive_more::derive::{Deref, DerefMut, From};
use itertools::Itertools;
use ordermap::OrderSet;
use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};
use strum::{EnumCount, IntoEnumIterator};

const STEP_RETRIES: usize = 10;
const RUN_RETRIES: usize = 5;

/// The candidate values a position may still take, in first-observed order.
/// One candidate left means the cell is collapsed. The only code allowed to
/// produce an empty superposition is the contradiction check inside
/// propagation, and it never commits the result.
#[derive(Debug, Clone, PartialEq, Eq, Deref, DerefMut, From)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Superposition<T: Tile>(OrderSet<T>);

impl<T: Tile> Superposition<T> {
  pub fn collapsed(&self) -> bool {
    self.0.len() == 1
  }

  /// The single remaining candidate, if collapsed.
  pub fn sole(&self) -> Option<&T> {
    self.collapsed().then(|| self.0.iter().next()).flatten()
  }
}

impl<T: Tile> FromIterator<T> for Superposition<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    Self(OrderSet::from_iter(iter))
  }
}

/// Cooperative cancellation for `run`. Clone the token, hand one clone to
/// the builder and trip the other from wherever the caller watches time.
#[derive(Default, Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  pub fn cancelled(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Observation {
  /// A cell was collapsed and its consequences propagated.
  Incomplete(Pos),
  /// Every cell already holds exactly one candidate.
  Complete,
}

impl Observation {
  pub fn complete(&self) -> bool {
    *self == Self::Complete
  }

  pub fn last_collapsed(&self) -> Option<Pos> {
    match self {
      Self::Incomplete(pos) => Some(*pos),
      Self::Complete => None,
    }
  }
}

/// Configures a [`Solver`]. Either learn everything from a sample grid or
/// supply a tile set and oracle by hand.
pub struct SolverBuilder<T: Tile> {
  size: Size,
  wrap: Wrap,
  tiles: Vec<T>,
  oracle: CompatibilityOracle<T>,
  seeds: Vec<(Pos, T)>,
  step_retries: usize,
  run_retries: usize,
  cancel: Option<CancelToken>,
}

impl<T: Tile> SolverBuilder<T> {
  pub fn new(size: impl Into<Size>) -> Self {
    Self {
      size: size.into(),
      wrap: Wrap::default(),
      tiles: Vec::new(),
      oracle: CompatibilityOracle::default(),
      seeds: Vec::new(),
      step_retries: STEP_RETRIES,
      run_retries: RUN_RETRIES,
      cancel: None,
    }
  }

  /// Learns the oracle and the distinct tile set from `sample`. The target
  /// size and edge policy default to the sample's; override them with
  /// [`size`](Self::size) and [`wrap`](Self::wrap).
  #[profiling::function]
  pub fn from_sample(sample: &Grid<T>) -> Self {
    let mut builder = Self::new(sample.size());
    builder.wrap = sample.wrap();
    builder.oracle = CompatibilityOracle::from_grid(sample);
    builder.tiles = sample
      .iter()
      .map(|(_, cell)| cell.clone())
      .unique()
      .collect();
    builder
  }

  pub fn size(mut self, size: impl Into<Size>) -> Self {
    self.size = size.into();
    self
  }

  pub fn wrap(mut self, wrap: Wrap) -> Self {
    self.wrap = wrap;
    self
  }

  pub fn tiles(mut self, tiles: impl IntoIterator<Item = T>) -> Self {
    self.tiles = tiles.into_iter().unique().collect();
    self
  }

  pub fn oracle(mut self, oracle: CompatibilityOracle<T>) -> Self {
    self.oracle = oracle;
    self
  }

  /// Pre-collapses a cell before solving starts. Seeds are propagated at
  /// build time, so an inconsistent seed fails `build` with a
  /// contradiction. Positions must lie inside a bounded grid.
  pub fn seed(mut self, pos: impl Into<Pos>, tile: T) -> Self {
    self.seeds.push((pos.into(), tile));
    self
  }

  /// Contradiction rollbacks a single step may burn before giving up.
  pub fn step_retries(mut self, attempts: usize) -> Self {
    self.step_retries = attempts;
    self
  }

  /// Full restarts `run` may burn before reporting the grid unsolvable.
  pub fn run_retries(mut self, attempts: usize) -> Self {
    self.run_retries = attempts;
    self
  }

  pub fn cancel_token(mut self, token: CancelToken) -> Self {
    self.cancel = Some(token);
    self
  }

  pub fn build<S: Sampler>(self, sampler: S) -> Result<Solver<T, S>, Error> {
    if self.tiles.is_empty() {
      return Err(Error::NoTiles);
    }

    // maximum entropy everywhere: every position may still be anything
    let everything: Superposition<T> = self.tiles.iter().cloned().collect();
    let grid = Grid::filled(self.size, self.wrap, everything);

    let mut solver = Solver {
      initial: grid.clone(),
      grid,
      oracle: self.oracle,
      sampler,
      step_retries: self.step_retries,
      run_retries: self.run_retries,
      cancel: self.cancel,
    };

    for (pos, tile) in self.seeds {
      solver.collapse_to(pos, tile);
      solver.propagate(pos)?;
    }
    solver.initial = solver.grid.clone();

    Ok(solver)
  }
}

/// Drives a grid of superpositions to a fully determined assignment that
/// the oracle's learned adjacencies permit. Owns its grid exclusively;
/// rollback snapshots are structural clones, never aliases.
#[derive(Debug)]
pub struct Solver<T: Tile, S: Sampler> {
  grid: Grid<Superposition<T>>,
  /// The post-build state (maximum entropy plus any seeds); full restarts
  /// go back here, not to the point of failure.
  initial: Grid<Superposition<T>>,
  oracle: CompatibilityOracle<T>,
  sampler: S,
  step_retries: usize,
  run_retries: usize,
  cancel: Option<CancelToken>,
}

impl<T: Tile, S: Sampler> Solver<T, S> {
  pub fn from_sample(sample: &Grid<T>, sampler: S) -> Result<Self, Error> {
    SolverBuilder::from_sample(sample).build(sampler)
  }

  pub fn grid(&self) -> &Grid<Superposition<T>> {
    &self.grid
  }

  pub fn oracle(&self) -> &CompatibilityOracle<T> {
    &self.oracle
  }

  pub fn fully_collapsed(&self) -> bool {
    self
      .grid
      .iter()
      .all(|(_, superposition)| superposition.collapsed())
  }

  /// Collapses one minimum-entropy cell and propagates the consequences.
  ///
  /// A contradiction mid-propagation rolls the grid back to the snapshot
  /// taken on entry and tries again with fresh draws, up to the step
  /// budget. Contradictions therefore never escape; only an exhausted
  /// budget does.
  #[profiling::function]
  pub fn step(&mut self) -> Result<Observation, Error> {
    let backup = self.grid.clone();

    for _ in 0..self.step_retries {
      let Some(pos) = self.min_entropy_pos() else {
        return Ok(Observation::Complete);
      };

      self.collapse(pos);

      match self.propagate(pos) {
        Ok(()) => return Ok(Observation::Incomplete(pos)),
        Err(Error::Contradiction { .. }) => self.grid = backup.clone(),
        Err(other) => return Err(other),
      }
    }

    Err(Error::StepExhausted {
      attempts: self.step_retries,
    })
  }

  /// Steps until the grid is fully collapsed, restarting from the initial
  /// grid whenever a step exhausts its budget. Succeeding returns the
  /// projected single-value grid; exhausting the restart budget is an
  /// explicit [`Error::Unsolvable`], never a partial grid.
  #[profiling::function]
  pub fn run(&mut self) -> Result<Grid<T>, Error> {
    for _ in 0..self.run_retries {
      self.ensure_not_cancelled()?;

      loop {
        match self.step() {
          Ok(Observation::Complete) => return Ok(self.project()),
          Ok(Observation::Incomplete(_)) => self.ensure_not_cancelled()?,
          Err(Error::StepExhausted { .. }) => {
            self.grid = self.initial.clone();
            break;
          }
          Err(other) => return Err(other),
        }
      }
    }

    Err(Error::Unsolvable {
      attempts: self.run_retries,
    })
  }

  /// Fixes a cell to a single value without propagating. Exposed so
  /// editor-style callers can pin cells mid-flight; [`SolverBuilder::seed`]
  /// is the propagated-and-checked way in.
  pub fn collapse_to(&mut self, pos: impl Into<Pos>, tile: T) {
    self.grid.set(pos, Superposition::from_iter([tile]));
  }

  fn collapse(&mut self, pos: Pos) {
    let tile = self.pick_tile(pos);
    self.collapse_to(pos, tile);
  }

  /// Scans for the smallest not-yet-collapsed superposition; ties break by
  /// a uniform draw. `None` means the grid is fully collapsed.
  #[profiling::function]
  fn min_entropy_pos(&mut self) -> Option<Pos> {
    let mut min = usize::MAX;
    let mut ties = Vec::new();

    for (pos, superposition) in self.grid.iter() {
      assert!(
        !superposition.is_empty(),
        "empty superposition at {pos:?} outside contradiction recovery"
      );
      if superposition.collapsed() {
        continue;
      }

      let entropy = superposition.len();
      if entropy < min {
        min = entropy;
        ties.clear();
        ties.push(pos);
      } else if entropy == min {
        ties.push(pos);
      }
    }

    (!ties.is_empty()).then(|| ties[self.sampler.sample(0, ties.len() - 1)])
  }

  /// Draws one candidate for `pos`, weighted by how often the oracle saw
  /// each candidate next to anything its neighbors could still become.
  /// Candidates with no supporting observations are excluded unless every
  /// candidate is unsupported, in which case the draw falls back to
  /// uniform; an edge cell with no precedent is an arbitrary choice, not a
  /// bias toward whichever candidate happened to be stored last.
  #[profiling::function]
  fn pick_tile(&mut self, pos: Pos) -> T {
    let superposition = self.grid.get(pos).expect("solver cells are never empty");
    assert!(
      !superposition.is_empty(),
      "empty superposition at {pos:?} outside contradiction recovery"
    );

    let mut scored = superposition
      .iter()
      .map(|tile| {
        let score = Direction::iter()
          .map(|direction| {
            let Some(neighbor_pos) = self.grid.neighbor(pos, direction) else {
              return 0;
            };
            let Some(neighbor) = self.grid.get(neighbor_pos) else {
              return 0;
            };
            neighbor
              .iter()
              .map(|candidate| {
                self
                  .oracle
                  .count(&Adjacency::new(tile.clone(), direction, candidate.clone()))
              })
              .sum()
          })
          .sum::<usize>();
        (tile.clone(), score)
      })
      .collect::<Vec<_>>();

    let total: usize = scored.iter().map(|(_, score)| score).sum();
    if total == 0 {
      let index = self.sampler.sample(0, scored.len() - 1);
      return scored.swap_remove(index).0;
    }

    let mut draw = self.sampler.sample(0, total);
    for (tile, score) in scored.into_iter().filter(|(_, score)| *score > 0) {
      if draw <= score {
        return tile;
      }
      draw -= score;
    }

    unreachable!("the weighted draw cannot exceed the total score")
  }

  /// Depth-first constraint cascade from a freshly narrowed cell.
  /// Neighbor superpositions only ever shrink here; a shrink that would
  /// reach zero aborts the whole pass without committing, leaving the
  /// caller's snapshot the sole authority on recovery.
  #[profiling::function]
  fn propagate(&mut self, start: Pos) -> Result<(), Error> {
    let mut stack = Vec::with_capacity(Direction::COUNT);
    stack.push(start);

    while let Some(pos) = stack.pop() {
      for direction in Direction::iter() {
        let Some(neighbor_pos) = self.grid.neighbor(pos, direction) else {
          continue;
        };
        let Some(neighbor) = self.grid.get(neighbor_pos) else {
          continue;
        };
        if neighbor.collapsed() {
          continue;
        }

        let current = self.grid.get(pos).expect("solver cells are never empty");

        // keep only candidates something in the current cell still allows
        let filtered = neighbor
          .iter()
          .filter(|candidate| {
            current.iter().any(|cell| {
              self
                .oracle
                .has(&Adjacency::new(cell.clone(), direction, (*candidate).clone()))
            })
          })
          .cloned()
          .collect::<OrderSet<T>>();

        if filtered.len() == neighbor.len() {
          continue;
        }
        if filtered.is_empty() {
          return Err(Error::Contradiction {
            pos: neighbor_pos,
            direction,
          });
        }

        self.grid.set(neighbor_pos, Superposition::from(filtered));
        stack.push(neighbor_pos);
      }
    }

    Ok(())
  }

  fn project(&self) -> Grid<T> {
    let mut out = Grid::new(self.grid.size(), self.grid.wrap());
    for (pos, superposition) in self.grid.iter() {
      let tile = superposition
        .sole()
        .expect("every superposition is a singleton after a successful run");
      out.set(pos, tile.clone());
    }
    out
  }

  fn ensure_not_cancelled(&self) -> Result<(), Error> {
    match &self.cancel {
      Some(token) if token.cancelled() => Err(Error::Cancelled),
      _ => Ok(()),
    }
  }
}
