//! Seams to the external chat service and the logging implementation of them.

use crate::presence::PresenceStatus;
use async_trait::async_trait;
use log::info;
use std::fmt;
use thiserror::Error;

/// Where a canceled apply was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelPoint {
    /// Deadline had passed before the request went out
    BeforeRequest,
    /// Deadline passed while waiting for, or right after, the response
    AfterRequest,
}

impl fmt::Display for CancelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelPoint::BeforeRequest => write!(f, "before request"),
            CancelPoint::AfterRequest => write!(f, "after request"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("update canceled {0}")]
    Canceled(CancelPoint),
    #[error("update rejected: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("presence update failed: {0}")]
    Failed(String),
}

/// Applies a rendered name and description to one external surface.
///
/// Empty fields are left untouched; a call with both fields empty is a no-op.
#[async_trait]
pub trait PresentationSurface: Send + Sync {
    async fn apply(&self, surface_id: &str, name: &str, description: &str) -> Result<(), ApplyError>;
}

/// Pushes the global presence status.
#[async_trait]
pub trait PresenceSink: Send + Sync {
    async fn publish(&self, status: &PresenceStatus) -> Result<(), PublishError>;
}

/// Writes updates to the log instead of sending them anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl PresentationSurface for LogSink {
    async fn apply(&self, surface_id: &str, name: &str, description: &str) -> Result<(), ApplyError> {
        if name.is_empty() && description.is_empty() {
            return Ok(());
        }
        info!(
            "surface={} name={:?} description={:?}",
            surface_id, name, description
        );
        Ok(())
    }
}

#[async_trait]
impl PresenceSink for LogSink {
    async fn publish(&self, status: &PresenceStatus) -> Result<(), PublishError> {
        info!("presence mode={} text={:?}", status.mode, status.text);
        Ok(())
    }
}
