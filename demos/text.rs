use std::error::Error;
use wavetile::prelude::*;

const COLS: usize = 28;
const ROWS: usize = 12;

fn main() -> Result<(), Box<dyn Error>> {
  let rows = 6;
  let cols = 8;
  let source = "\
  ~~~~~~~~\
  ~......~\
  ~.####.~\
  ~.####.~\
  ~......~\
  ~~~~~~~~\
  "
  .chars()
  .collect::<Vec<_>>();

  assert_eq!(source.len(), rows * cols);

  let sample = Grid::from_cells(
    [cols, rows],
    Wrap::Torus,
    source.into_iter().map(Some).collect(),
  )?;

  let args = std::env::args().collect::<Vec<_>>();
  let seed: Option<u64> = args.get(1).map(|arg| arg.parse()).transpose()?;

  let sampler = RngSampler::new(seed);
  println!("Seed: {}", sampler.seed());

  let mut solver = SolverBuilder::from_sample(&sample)
    .size([COLS, ROWS])
    .build(sampler)?;

  println!("\nSample:\n{}", render(&sample));

  match solver.run() {
    Ok(solved) => println!("\nSolved:\n{}", render(&solved)),
    Err(e) => eprintln!("{e}"),
  }

  Ok(())
}

fn render(grid: &Grid<char>) -> String {
  itertools::join(
    (0..grid.height()).map(|y| {
      (0..grid.width())
        .map(|x| grid.get([x as isize, y as isize]).copied().unwrap_or(' '))
        .collect::<String>()
    }),
    "\n",
  )
}
