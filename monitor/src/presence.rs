//! Global presence status derived from the cycle totals.

use crate::aggregate::AggregatedStats;
use crate::sink::{PresenceSink, PublishError};
use log::{debug, error, info};
use shared::{truncate_with_ellipsis, PRESENCE_LIMIT};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceMode {
    Online,
    Idle,
}

impl PresenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceMode::Online => "online",
            PresenceMode::Idle => "idle",
        }
    }
}

impl fmt::Display for PresenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceStatus {
    pub mode: PresenceMode,
    pub text: String,
}

impl PresenceStatus {
    /// Builds the status line, e.g. `15/52 (+3) players on 2/3 servers`.
    pub fn from_stats(stats: &AggregatedStats) -> Self {
        if stats.online == 0 {
            let text = if stats.servers == 1 {
                "Server offline"
            } else {
                "All servers offline"
            };
            return Self {
                mode: PresenceMode::Idle,
                text: text.to_string(),
            };
        }

        let mut text = if stats.queue > 0 {
            format!("{}/{} (+{}) players", stats.players, stats.slots, stats.queue)
        } else {
            format!("{}/{} players", stats.players, stats.slots)
        };

        if stats.servers > 1 {
            if stats.online < stats.servers {
                text.push_str(&format!(" on {}/{} servers", stats.online, stats.servers));
            } else {
                text.push_str(&format!(" on {} servers", stats.online));
            }
        }

        Self {
            mode: PresenceMode::Online,
            text: truncate_with_ellipsis(&text, PRESENCE_LIMIT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Same cumulative value as the last successful publish
    Unchanged,
}

/// Pushes the presence status when the cycle totals moved.
pub struct PresencePublisher {
    sink: Arc<dyn PresenceSink>,
    last_published: Option<u64>,
}

impl PresencePublisher {
    pub fn new(sink: Arc<dyn PresenceSink>) -> Self {
        Self {
            sink,
            last_published: None,
        }
    }

    /// Cumulative value of the last successful publish.
    pub fn last_published(&self) -> Option<u64> {
        self.last_published
    }

    /// Publishes once if the cumulative value differs from the last one that
    /// was published successfully. A failed publish keeps the old value so
    /// the next cycle tries again.
    pub async fn publish(&mut self, stats: &AggregatedStats) -> Result<PublishOutcome, PublishError> {
        let cumulative = stats.cumulative();
        if self.last_published == Some(cumulative) {
            debug!("presence unchanged (cumulative {})", cumulative);
            return Ok(PublishOutcome::Unchanged);
        }

        let status = PresenceStatus::from_stats(stats);
        match self.sink.publish(&status).await {
            Ok(()) => {
                info!("presence set to {} \"{}\"", status.mode, status.text);
                self.last_published = Some(cumulative);
                Ok(PublishOutcome::Published)
            }
            Err(e) => {
                error!("failed to publish presence \"{}\": {}", status.text, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn stats(servers: usize, online: usize, players: u64, slots: u64, queue: u64) -> AggregatedStats {
        AggregatedStats {
            servers,
            online,
            players,
            slots,
            queue,
        }
    }

    #[derive(Default)]
    struct FlakySink {
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PresenceSink for FlakySink {
        async fn publish(&self, _status: &PresenceStatus) -> Result<(), PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(PublishError::Failed("gateway closed".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_status_offline() {
        let single = PresenceStatus::from_stats(&stats(1, 0, 0, 0, 0));
        assert_eq!(single.mode, PresenceMode::Idle);
        assert_eq!(single.text, "Server offline");

        let many = PresenceStatus::from_stats(&stats(4, 0, 0, 0, 0));
        assert_eq!(many.mode, PresenceMode::Idle);
        assert_eq!(many.text, "All servers offline");

        let none = PresenceStatus::from_stats(&stats(0, 0, 0, 0, 0));
        assert_eq!(none.mode, PresenceMode::Idle);
        assert_eq!(none.text, "All servers offline");
    }

    #[test]
    fn test_status_online() {
        assert_eq!(PresenceStatus::from_stats(&stats(1, 1, 5, 32, 0)).text, "5/32 players");
        assert_eq!(
            PresenceStatus::from_stats(&stats(1, 1, 60, 60, 4)).text,
            "60/60 (+4) players"
        );
        assert_eq!(
            PresenceStatus::from_stats(&stats(3, 2, 15, 52, 0)).text,
            "15/52 players on 2/3 servers"
        );
        assert_eq!(
            PresenceStatus::from_stats(&stats(2, 2, 7, 100, 1)).text,
            "7/100 (+1) players on 2 servers"
        );
        assert_eq!(PresenceStatus::from_stats(&stats(2, 2, 7, 100, 1)).mode, PresenceMode::Online);
    }

    #[test]
    fn test_status_truncated() {
        let huge = stats(usize::MAX, 1, u64::MAX, u64::MAX, u64::MAX);
        let status = PresenceStatus::from_stats(&huge);
        assert!(status.text.chars().count() <= PRESENCE_LIMIT);
    }

    #[tokio::test]
    async fn test_publish_skips_unchanged() {
        let sink = Arc::new(FlakySink::default());
        let mut publisher = PresencePublisher::new(sink.clone());

        let first = stats(2, 1, 10, 20, 0);
        assert_eq!(publisher.publish(&first).await.unwrap(), PublishOutcome::Published);
        assert_eq!(publisher.publish(&first).await.unwrap(), PublishOutcome::Unchanged);
        assert_eq!(publisher.last_published(), Some(11));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_cycle_publishes_even_when_zero() {
        let sink = Arc::new(FlakySink::default());
        let mut publisher = PresencePublisher::new(sink.clone());

        let outcome = publisher.publish(&stats(1, 0, 0, 0, 0)).await.unwrap();
        assert_eq!(outcome, PublishOutcome::Published);
        assert_eq!(publisher.last_published(), Some(0));
    }

    #[tokio::test]
    async fn test_failed_publish_is_retried() {
        let sink = Arc::new(FlakySink::default());
        sink.fail.store(true, Ordering::SeqCst);
        let mut publisher = PresencePublisher::new(sink.clone());
        let current = stats(1, 1, 3, 10, 0);

        assert!(publisher.publish(&current).await.is_err());
        assert_eq!(publisher.last_published(), None);

        sink.fail.store(false, Ordering::SeqCst);
        assert_eq!(publisher.publish(&current).await.unwrap(), PublishOutcome::Published);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }
}
