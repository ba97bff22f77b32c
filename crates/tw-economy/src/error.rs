//! Economy-layer error type.

use thiserror::Error;

use tw_core::StructureId;
use tw_world::WorldError;

#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("structure {0} not found")]
    UnknownStructure(StructureId),

    #[error(transparent)]
    World(#[from] WorldError),
}

pub type EconomyResult<T> = Result<T, EconomyError>;
