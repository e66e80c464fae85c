// Timed quiz: question lists, the runner state machine, and the live registry
// that ticks each runner's countdown and persists its submission.

pub mod handlers;
pub mod live;
pub mod questions;
pub mod runner;
