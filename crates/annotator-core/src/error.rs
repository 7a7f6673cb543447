//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("PGN parse error: {0}")]
    PgnParse(String),

    #[error("Unresolvable SAN move: {0}")]
    SanParse(String),
}
