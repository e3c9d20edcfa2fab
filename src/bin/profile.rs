use std::time::Instant;

use mazecarve::{generate_maze, solve_maze};

/// Carves and solves mazes back to back without any rendering.
///
/// Usage: `profile [size] [iterations]`, defaulting to the largest maze, once.
fn main() -> Result<(), mazecarve::AppError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args();
    args.next(); // Skip executable name
    let size = args
        .next()
        .and_then(|s| s.parse::<u8>().ok())
        .unwrap_or(u8::MAX);
    let iterations = args
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(1);

    let start = Instant::now();
    for seed in 0..iterations {
        let grid = generate_maze(size, size, Some(u64::from(seed)))?;
        if let (Some(entry), Some(exit)) = (grid.entry(), grid.exit()) {
            solve_maze(&grid, entry, exit)?;
        }
    }
    let elapsed = start.elapsed();
    tracing::info!(
        "{} runs of a {}x{} maze took {:?} ({:?} per run)",
        iterations,
        size,
        size,
        elapsed,
        elapsed / iterations.max(1)
    );
    Ok(())
}
