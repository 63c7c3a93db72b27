//! Library entry for hierscope exposing the filtering core for integration tests.

pub mod app;
pub mod args;
pub mod filtered;
pub mod logic;
pub mod sources;
pub mod state;
pub mod ui;
pub mod util;

#[cfg(test)]
mod test_utils;
