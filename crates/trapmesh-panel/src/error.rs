//! Panel errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;
use trapmesh_topology::TopologyError;

use crate::transport::TransportError;

/// Errors surfaced by panel operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    /// The module could not be reached or answered with a failure status.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reported mesh topology could not be ingested.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// The module answered with a body that is not a status object.
    #[error("invalid module response '{0}'")]
    InvalidResponse(SmolStr),

    /// A form failed validation before it was sent.
    #[error("invalid form '{0}'")]
    InvalidForm(SmolStr),

    /// Configuration error.
    #[error("invalid config '{0}'")]
    InvalidConfig(SmolStr),
}
