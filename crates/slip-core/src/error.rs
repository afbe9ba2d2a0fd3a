#![forbid(unsafe_code)]

//! Construction-time failures.
//!
//! Gesture ambiguities never surface as errors: they resolve by returning to
//! idle. Only attaching to an unusable container or supplying an unusable
//! configuration is reported to the caller.

use crate::host::NodeId;

/// Errors returned by [`Slip::attach`](crate::Slip::attach) and
/// [`SlipConfig::validate`](crate::SlipConfig::validate).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SlipError {
    /// The selector matched nothing in the host document.
    #[error("no container matches selector {selector:?}")]
    ContainerNotFound { selector: String },
    /// The node exists but cannot hold list items.
    #[error("container {node} is not an element")]
    ContainerNotElement { node: NodeId },
    /// A configuration value is out of range.
    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}
