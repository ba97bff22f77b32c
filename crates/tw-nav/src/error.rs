//! Navigation-subsystem error type.

use thiserror::Error;

use tw_core::TilePos;
use tw_world::WorldError;

/// Errors produced by `tw-nav`.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: TilePos, to: TilePos },

    #[error("tile {0} is outside the navigation grid")]
    OutOfBounds(TilePos),

    #[error(transparent)]
    World(#[from] WorldError),
}

pub type NavResult<T> = Result<T, NavError>;
