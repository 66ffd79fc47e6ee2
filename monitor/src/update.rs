//! Applies one update task to the surfaces of its server.

use crate::change::{detect, render_surface, Change, RenderedSurface};
use crate::queue::TaskHandler;
use crate::sink::{ApplyError, CancelPoint, PresentationSurface};
use crate::target::Surface;
use crate::task::UpdateTask;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use shared::Renderer;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// What happened to the surfaces of one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub applied: usize,
    pub unchanged: usize,
    pub empty: usize,
    pub failed: usize,
    /// Task was older than one already processed for the same server
    pub stale: bool,
}

/// Renders, diffs and applies surface updates.
///
/// Each task runs under one deadline shared by both surfaces, starting once
/// the task holds its server's lock. Fingerprints only move after the
/// external call succeeded within that deadline.
pub struct UpdateProcessor {
    renderer: Arc<Renderer>,
    surface: Arc<dyn PresentationSurface>,
    timeout: Duration,
}

impl UpdateProcessor {
    pub fn new(renderer: Arc<Renderer>, surface: Arc<dyn PresentationSurface>, timeout: Duration) -> Self {
        Self {
            renderer,
            surface,
            timeout,
        }
    }

    pub async fn process(&self, task: &UpdateTask) -> TaskReport {
        let target = &task.target;
        let mut report = TaskReport::default();

        let mut state = target.lock_state().await;
        if !state.claim_cycle(task.cycle) {
            warn!(
                "server={} dropping update from cycle {}, cycle {:?} was already processed",
                target.id, task.cycle, state.last_cycle
            );
            report.stale = true;
            return report;
        }

        // Waiting for the lock does not count against the task timeout
        let deadline = Instant::now() + self.timeout;

        let context = match serde_json::to_value(&task.data) {
            Ok(context) => context,
            Err(e) => {
                error!("server={} failed to build template context: {}", target.id, e);
                report.failed = target.surfaces().count();
                return report;
            }
        };

        for surface in target.surfaces() {
            let rendered = render_surface(&self.renderer, surface, &context, &target.id);

            match detect(&rendered, state.fingerprint(surface.kind)) {
                Change::Empty => {
                    debug!("server={} surface={} nothing rendered", target.id, surface.id);
                    report.empty += 1;
                }
                Change::Unchanged => {
                    debug!("server={} surface={} unchanged", target.id, surface.id);
                    report.unchanged += 1;
                }
                Change::Changed(fingerprint) => match self.apply(surface, &rendered, deadline).await {
                    Ok(()) => {
                        info!(
                            "server={} surface={} updated {} to {:?}",
                            target.id, surface.id, surface.kind, rendered.name
                        );
                        state.set_fingerprint(surface.kind, fingerprint);
                        report.applied += 1;
                    }
                    Err(e) => {
                        error!(
                            "server={} surface={} failed to update {}: {}",
                            target.id, surface.id, surface.kind, e
                        );
                        report.failed += 1;
                    }
                },
            }
        }

        report
    }

    async fn apply(
        &self,
        surface: &Surface,
        rendered: &RenderedSurface,
        deadline: Instant,
    ) -> Result<(), ApplyError> {
        if Instant::now() >= deadline {
            return Err(ApplyError::Canceled(CancelPoint::BeforeRequest));
        }

        let call = self
            .surface
            .apply(&surface.id, &rendered.name, &rendered.description);

        match timeout_at(deadline, call).await {
            Err(_) => Err(ApplyError::Canceled(CancelPoint::AfterRequest)),
            Ok(Ok(())) if Instant::now() > deadline => Err(ApplyError::Canceled(CancelPoint::AfterRequest)),
            Ok(result) => result,
        }
    }
}

#[async_trait]
impl TaskHandler for UpdateProcessor {
    async fn handle(&self, task: UpdateTask) {
        let report = self.process(&task).await;
        debug!("server={} cycle {} processed: {:?}", task.target.id, task.cycle, report);
    }
}
