//! Update tasks handed from the query stage to the worker pool.

use crate::target::Target;
use serde::Serialize;
use shared::{GameExtra, ServerInfo};
use std::sync::Arc;

/// Context the name and description templates are rendered against.
///
/// `Info` and `Extra` are null while the server is offline so templates can
/// branch on `{{ if .Info }}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateData {
    pub info: Option<ServerInfo>,
    pub extra: Option<GameExtra>,
    #[serde(rename = "ID")]
    pub id: String,
    pub host: String,
    pub port: u16,
}

impl TemplateData {
    pub fn online(target: &Target, info: ServerInfo) -> Self {
        let extra = info.extra();
        Self {
            info: Some(info),
            extra,
            ..Self::offline(target)
        }
    }

    pub fn offline(target: &Target) -> Self {
        Self {
            info: None,
            extra: None,
            id: target.id.clone(),
            host: target.host.clone(),
            port: target.port,
        }
    }

    pub fn is_online(&self) -> bool {
        self.info.is_some()
    }
}

/// A pending presentation update for one server.
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub target: Arc<Target>,
    /// Cycle that produced the task
    pub cycle: u64,
    pub data: TemplateData,
}

impl UpdateTask {
    pub fn new(target: Arc<Target>, cycle: u64, data: TemplateData) -> Self {
        Self { target, cycle, data }
    }
}
