//! The four cardinal directions, in the fixed order `+x, +y, -x, -y`.
//!
//! This order is shared between adjacency learning and propagation; the
//! oracle stores facts keyed by it, so it must never be reshuffled.

use nalgebra::Vector2;
use strum_macros::{EnumCount, EnumIter, VariantArray};

#[derive(
  PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter, VariantArray, Clone, Copy, Debug,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
  Right,
  Down,
  Left,
  Up,
}

impl Direction {
  pub fn opposite(self) -> Self {
    match self {
      Self::Right => Self::Left,
      Self::Down => Self::Up,
      Self::Left => Self::Right,
      Self::Up => Self::Down,
    }
  }

  /// Unit step toward the neighbor this direction names. `Down` is `+y`
  /// because grids are stored row-major with y growing downward.
  pub fn offset(self) -> Vector2<isize> {
    match self {
      Self::Right => Vector2::new(1, 0),
      Self::Down => Vector2::new(0, 1),
      Self::Left => Vector2::new(-1, 0),
      Self::Up => Vector2::new(0, -1),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::Direction;
  use strum::{IntoEnumIterator, VariantArray};

  #[test]
  fn opposites_pair_up() {
    for dir in Direction::iter() {
      assert_eq!(dir.opposite().opposite(), dir);
      assert_eq!(dir.offset(), -dir.opposite().offset());
    }
  }

  #[test]
  fn variant_order_is_the_wire_order() {
    assert_eq!(
      Direction::VARIANTS,
      [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up
      ]
    );
  }
}
