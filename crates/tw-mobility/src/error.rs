use thiserror::Error;

use tw_core::{AgentId, SimTime};
use tw_nav::NavError;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("agent {agent} may not repath before {until}")]
    CoolingDown { agent: AgentId, until: SimTime },

    #[error("routing failed: {0}")]
    Routing(#[from] NavError),
}

pub type MobilityResult<T> = Result<T, MobilityError>;
