//! World-layer error type.

use thiserror::Error;

use tw_core::{CoreError, PropId, StructureId, TilePos};

use crate::StructureKind;

/// Errors produced by placement commands, catalog loading and persistence.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("structure {0} not found")]
    StructureNotFound(StructureId),

    #[error("prop {0} not found")]
    PropNotFound(PropId),

    #[error("no catalog entry for structure kind {0:?}")]
    UnknownKind(StructureKind),

    #[error("tile {0} is outside the map")]
    OutOfBounds(TilePos),

    #[error("footprint at {0} overlaps an existing obstacle")]
    Occupied(TilePos),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("persistence error: {0}")]
    Persist(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type WorldResult<T> = Result<T, WorldError>;
