use thiserror::Error;

use tw_core::CoreError;
use tw_world::WorldError;

use crate::PhaseTag;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("phase {phase:?} must run after {after:?}")]
    PhaseOrder { phase: PhaseTag, after: PhaseTag },

    #[error("phase {phase:?} needs {requires:?} in the pipeline")]
    MissingPhase { phase: PhaseTag, requires: PhaseTag },

    #[error("phase {0:?} appears more than once")]
    DuplicatePhase(PhaseTag),

    #[error("world tile size {world} does not match configured {config}")]
    TileSizeMismatch { config: f32, world: f32 },

    #[error(transparent)]
    World(#[from] WorldError),
}

pub type SimResult<T> = Result<T, SimError>;
