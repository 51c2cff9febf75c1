use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use tracing::debug;

use crate::class::LandClass;
use crate::error::{ClassifyError, Result};
use crate::raster::Grid;
use crate::report::Progress;

/// Classifies every row of a `width` x `height` output grid on `jobs` threads.
///
/// `classify_row` fills one output row and sees nothing but its own row, so
/// rows are independent. Thread `tid` takes the rows with
/// `row % jobs == tid`; finished rows are sent back to the calling thread,
/// which copies them into the grid and advances `progress`.
///
/// The first failing row stops all workers. When several rows fail before
/// the workers notice, the error of the lowest row is returned.
pub fn scan_rows<F>(
  width: usize,
  height: usize,
  jobs: usize,
  progress: &mut Progress,
  classify_row: F,
) -> Result<Grid<u8>>
where
  F: Fn(usize, &mut [u8]) -> Result<()> + Sync,
{
  let jobs = jobs.clamp(1, height.max(1));
  debug!("scanning {} x {} cells on {} threads", width, height, jobs);

  let mut grid = Grid::new(width, height, LandClass::Undefined.code());
  let mut failure: Option<(usize, ClassifyError)> = None;
  let stop = AtomicBool::new(false);

  thread::scope(|scope| {
    let (tx, rx) = mpsc::channel::<(usize, Result<Vec<u8>>)>();

    for tid in 0..jobs {
      let tx = tx.clone();
      let stop = &stop;
      let classify_row = &classify_row;

      scope.spawn(move || {
        for row in (0..height).filter(|r| r % jobs == tid) {
          if stop.load(Ordering::Relaxed) {
            break;
          }
          let mut values = vec![LandClass::Undefined.code(); width];
          let result = classify_row(row, &mut values).map(|_| values);
          if result.is_err() {
            stop.store(true, Ordering::Relaxed);
          }
          if tx.send((row, result)).is_err() {
            break;
          }
        }
      });
    }
    drop(tx);

    // Ends once every worker has dropped its sender
    for (row, result) in rx {
      match result {
        Ok(values) => {
          if let Some(target) = grid.row_mut(row) {
            target.copy_from_slice(&values);
          }
          progress.advance();
        }
        Err(err) => {
          if failure.as_ref().map_or(true, |(first, _)| row < *first) {
            failure = Some((row, err));
          }
        }
      }
    }
  });

  progress.finish();
  match failure {
    Some((_, err)) => Err(err),
    None => Ok(grid),
  }
}
