use crate::{dirs::Direction, util::Pos};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// A propagation step would have emptied the superposition at `pos`.
  /// Recovered internally by snapshot rollback; only escapes from `build`
  /// when a caller-seeded cell is inconsistent out of the gate.
  #[error("contradiction at {pos:?} while constraining its {direction:?} side")]
  Contradiction { pos: Pos, direction: Direction },

  #[error("step gave up after {attempts} contradiction rollbacks")]
  StepExhausted { attempts: usize },

  #[error("no consistent assignment found within {attempts} full restarts")]
  Unsolvable { attempts: usize },

  #[error("solve cancelled")]
  Cancelled,

  #[error("no tile values to solve with; the sample or tile set is empty")]
  NoTiles,

  #[error("a {width}x{height} grid holds {expected} cells, got {actual}")]
  CellCountMismatch {
    width: usize,
    height: usize,
    expected: usize,
    actual: usize,
  },
}
