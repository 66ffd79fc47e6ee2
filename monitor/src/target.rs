//! Monitored servers and their presentation surfaces.

use crate::config::ServerConfig;
use shared::Fingerprint;
use std::fmt;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// The two surfaces a server can drive. Within one update the primary
/// surface is always handled before the grouping surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Per-server channel
    Primary,
    /// Category the channel lives in
    Grouping,
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceKind::Primary => write!(f, "channel"),
            SurfaceKind::Grouping => write!(f, "category"),
        }
    }
}

/// An external entity whose name and description follow a server's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub kind: SurfaceKind,
    pub id: String,
    pub name_template: Option<String>,
    pub description_template: Option<String>,
}

impl Surface {
    /// Builds a surface when an id and at least one template are present.
    pub fn configured(
        kind: SurfaceKind,
        id: Option<&str>,
        name_template: Option<&str>,
        description_template: Option<&str>,
    ) -> Option<Self> {
        let id = id.map(str::trim).filter(|id| !id.is_empty())?;
        let name_template = name_template.filter(|t| !t.is_empty()).map(str::to_string);
        let description_template = description_template.filter(|t| !t.is_empty()).map(str::to_string);

        if name_template.is_none() && description_template.is_none() {
            return None;
        }

        Some(Self {
            kind,
            id: id.to_string(),
            name_template,
            description_template,
        })
    }
}

/// Fingerprints of the last successfully applied texts of one server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeState {
    pub primary: Option<Fingerprint>,
    pub grouping: Option<Fingerprint>,
    /// Newest cycle whose update task was processed
    pub last_cycle: Option<u64>,
}

impl ChangeState {
    pub fn fingerprint(&self, kind: SurfaceKind) -> Option<Fingerprint> {
        match kind {
            SurfaceKind::Primary => self.primary,
            SurfaceKind::Grouping => self.grouping,
        }
    }

    pub fn set_fingerprint(&mut self, kind: SurfaceKind, fingerprint: Fingerprint) {
        match kind {
            SurfaceKind::Primary => self.primary = Some(fingerprint),
            SurfaceKind::Grouping => self.grouping = Some(fingerprint),
        }
    }

    /// Claims `cycle` for processing. Returns false when a newer cycle was
    /// already handled, i.e. the task is stale.
    pub fn claim_cycle(&mut self, cycle: u64) -> bool {
        match self.last_cycle {
            Some(last) if cycle < last => false,
            _ => {
                self.last_cycle = Some(cycle);
                true
            }
        }
    }
}

/// One monitored game server.
///
/// Configuration fields are immutable for the lifetime of the process. The
/// change state sits behind an async lock that a worker holds for the whole
/// processing of a task, so updates of the same server never interleave even
/// when tasks from two cycles are queued at once.
#[derive(Debug)]
pub struct Target {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub buffer_size: u16,
    pub primary: Option<Surface>,
    pub grouping: Option<Surface>,
    state: Mutex<ChangeState>,
}

impl Target {
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        let defaults = ServerConfig::default();
        Self {
            id: id.into(),
            host: host.into(),
            port,
            timeout: defaults.timeout,
            buffer_size: defaults.buffer_size,
            primary: None,
            grouping: None,
            state: Mutex::new(ChangeState::default()),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let mut target = Self::new(config.id.clone(), config.host.clone(), config.port);
        target.timeout = config.timeout;
        target.buffer_size = config.buffer_size;
        target.primary = Surface::configured(
            SurfaceKind::Primary,
            config.channel_id.as_deref(),
            config.channel_name.as_deref(),
            config.channel_description.as_deref(),
        );
        target.grouping = Surface::configured(
            SurfaceKind::Grouping,
            config.category_id.as_deref(),
            config.category_name.as_deref(),
            config.category_description.as_deref(),
        );
        target
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_primary(mut self, id: &str, name: &str, description: Option<&str>) -> Self {
        self.primary = Surface::configured(SurfaceKind::Primary, Some(id), Some(name), description);
        self
    }

    pub fn with_grouping(mut self, id: &str, name: &str, description: Option<&str>) -> Self {
        self.grouping = Surface::configured(SurfaceKind::Grouping, Some(id), Some(name), description);
        self
    }

    /// Query address in `host:port` form, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Configured surfaces, primary first.
    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.primary.iter().chain(self.grouping.iter())
    }

    /// Locks the change state. Held by a worker for the duration of a task.
    pub async fn lock_state(&self) -> MutexGuard<'_, ChangeState> {
        self.state.lock().await
    }

    /// Current fingerprint of a surface.
    pub async fn fingerprint(&self, kind: SurfaceKind) -> Option<Fingerprint> {
        self.state.lock().await.fingerprint(kind)
    }
}
