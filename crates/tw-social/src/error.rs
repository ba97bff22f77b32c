//! Social-layer error type.

use thiserror::Error;

use tw_core::AgentId;

#[derive(Debug, Error, PartialEq)]
pub enum SocialError {
    #[error("agent {0} not found")]
    UnknownAgent(AgentId),

    #[error("{0} cannot hold a relationship with itself")]
    SelfPair(AgentId),
}

pub type SocialResult<T> = Result<T, SocialError>;
