pub use chess;

pub mod board_utils;
pub mod detectors;
pub mod error;
pub mod eval;
pub mod explain;
pub mod game;
pub mod pgn;
pub mod quality;
pub mod san;
pub mod summary;
