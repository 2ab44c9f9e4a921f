use crate::{Tile, dirs::Direction, grid::Grid};
use derive_new::new;
use std::collections::HashMap;
use strum::IntoEnumIterator;

/// One learned adjacency fact: `cell` may have `neighbor` on its
/// `direction` side. Directionally asymmetric; the reverse fact is stored
/// separately. A fixed-arity record, deliberately not a concatenated key,
/// so distinct entries can never collide.
#[derive(new, Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Adjacency<T> {
  pub cell: T,
  pub direction: Direction,
  pub neighbor: T,
}

/// Learns which (cell, direction, neighbor) triples a sample grid permits
/// and answers compatibility queries during solving. A multiset: re-adding
/// an entry raises its multiplicity, and multiplicities weight the solver's
/// tile draw.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompatibilityOracle<T: Tile> {
  lookup: HashMap<Adjacency<T>, usize>,
}

impl<T: Tile> Default for CompatibilityOracle<T> {
  fn default() -> Self {
    Self {
      lookup: Default::default(),
    }
  }
}

impl<T: Tile> CompatibilityOracle<T> {
  pub fn from_grid(grid: &Grid<T>) -> Self {
    let mut oracle = Self::default();
    oracle.add_grid(grid);
    oracle
  }

  pub fn add(&mut self, entry: Adjacency<T>) {
    *self.lookup.entry(entry).or_default() += 1;
  }

  pub fn has(&self, entry: &Adjacency<T>) -> bool {
    self.count(entry) > 0
  }

  pub fn count(&self, entry: &Adjacency<T>) -> usize {
    self.lookup.get(entry).copied().unwrap_or_default()
  }

  /// Learns every adjacency the grid exhibits: one fact per non-empty cell
  /// per direction that actually has a neighbor under the grid's edge
  /// policy. Visiting every cell as the anchor is what makes the reverse
  /// fact come out too.
  #[profiling::function]
  pub fn add_grid(&mut self, grid: &Grid<T>) {
    for (pos, cell) in grid.iter() {
      for direction in Direction::iter() {
        let Some(neighbor_pos) = grid.neighbor(pos, direction) else {
          continue;
        };
        let Some(neighbor) = grid.get(neighbor_pos) else {
          continue;
        };
        self.add(Adjacency::new(cell.clone(), direction, neighbor.clone()));
      }
    }
  }

  pub fn entries(&self) -> impl Iterator<Item = (&Adjacency<T>, usize)> {
    self.lookup.iter().map(|(entry, count)| (entry, *count))
  }

  pub fn len(&self) -> usize {
    self.lookup.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lookup.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::{Adjacency, CompatibilityOracle};
  use crate::{
    dirs::Direction,
    grid::{Grid, Wrap},
  };
  use maplit::hashmap;

  fn sample(cells: &[char], width: usize, height: usize, wrap: Wrap) -> Grid<char> {
    Grid::from_cells(
      [width, height],
      wrap,
      cells.iter().copied().map(Some).collect(),
    )
    .unwrap()
  }

  #[test]
  fn unknown_entries_are_absent() {
    let oracle: CompatibilityOracle<char> = CompatibilityOracle::default();
    let entry = Adjacency::new('a', Direction::Right, 'b');
    assert!(!oracle.has(&entry));
    assert_eq!(oracle.count(&entry), 0);
  }

  #[test]
  fn re_adding_raises_multiplicity() {
    let mut oracle = CompatibilityOracle::default();
    let entry = Adjacency::new('a', Direction::Up, 'a');
    oracle.add(entry.clone());
    oracle.add(entry.clone());
    assert_eq!(oracle.count(&entry), 2);
    assert_eq!(oracle.len(), 1);
  }

  #[test]
  fn bounded_sample_learns_forward_and_reverse_facts() {
    let grid = sample(&['a', 'b'], 2, 1, Wrap::Bounded);
    let oracle = CompatibilityOracle::from_grid(&grid);

    assert!(oracle.has(&Adjacency::new('a', Direction::Right, 'b')));
    assert!(oracle.has(&Adjacency::new('b', Direction::Left, 'a')));
    // nothing exists past the edges of a bounded grid
    assert_eq!(oracle.len(), 2);
  }

  #[test]
  fn toroidal_sample_learns_wrapped_facts_with_counts() {
    let grid = sample(&['a', 'b'], 2, 1, Wrap::Torus);
    let oracle = CompatibilityOracle::from_grid(&grid);

    // on a 2x1 torus each cell sees the other on both horizontal sides and
    // itself vertically
    let expected = hashmap! {
      Adjacency::new('a', Direction::Right, 'b') => 1,
      Adjacency::new('a', Direction::Left, 'b') => 1,
      Adjacency::new('b', Direction::Right, 'a') => 1,
      Adjacency::new('b', Direction::Left, 'a') => 1,
      Adjacency::new('a', Direction::Up, 'a') => 1,
      Adjacency::new('a', Direction::Down, 'a') => 1,
      Adjacency::new('b', Direction::Up, 'b') => 1,
      Adjacency::new('b', Direction::Down, 'b') => 1,
    };

    assert_eq!(oracle.len(), expected.len());
    for (entry, count) in &expected {
      assert_eq!(oracle.count(entry), *count, "wrong count for {entry:?}");
    }
  }

  #[test]
  fn uniform_sample_accumulates_multiplicity() {
    let grid = sample(&['a', 'a', 'a', 'a'], 2, 2, Wrap::Torus);
    let oracle = CompatibilityOracle::from_grid(&grid);

    // four anchors, one fact per direction, all identical per direction
    for direction in [
      Direction::Right,
      Direction::Down,
      Direction::Left,
      Direction::Up,
    ] {
      assert_eq!(oracle.count(&Adjacency::new('a', direction, 'a')), 4);
    }
    assert_eq!(oracle.entries().map(|(_, count)| count).sum::<usize>(), 16);
  }

  #[test]
  fn empty_sample_cells_are_skipped() {
    let mut grid: Grid<char> = Grid::new([2, 2], Wrap::Torus);
    grid.set([0, 0], 'a');

    let oracle = CompatibilityOracle::from_grid(&grid);
    // the lone cell has no non-empty neighbors to learn from
    assert!(oracle.is_empty());
  }
}
