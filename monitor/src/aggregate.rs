//! Per-cycle statistics over all servers.

use shared::ServerInfo;
use tokio::sync::Mutex;

/// Totals of one polling cycle. Rebuilt from scratch every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatedStats {
    /// Configured servers, online or not
    pub servers: usize,
    pub online: usize,
    pub players: u64,
    pub slots: u64,
    /// Players waiting in login queues
    pub queue: u64,
}

impl AggregatedStats {
    /// Scalar the presence publisher compares against its last published value.
    pub fn cumulative(&self) -> u64 {
        (self.online as u64)
            .saturating_add(self.players)
            .saturating_add(self.queue)
    }
}

/// Folds successful query results into [`AggregatedStats`].
///
/// Queries of one cycle report concurrently; the lock is only held for the
/// additions themselves.
#[derive(Debug)]
pub struct StatsAggregator {
    stats: Mutex<AggregatedStats>,
}

impl StatsAggregator {
    pub fn new(servers: usize) -> Self {
        Self {
            stats: Mutex::new(AggregatedStats {
                servers,
                ..Default::default()
            }),
        }
    }

    /// Records one server that answered in this cycle.
    pub async fn record(&self, info: &ServerInfo, queued: u32) {
        let players = u64::from(info.players);
        let slots = u64::from(info.max_players);

        let mut stats = self.stats.lock().await;
        stats.online += 1;
        stats.players += players;
        stats.slots += slots;
        stats.queue += u64::from(queued);
    }

    /// Copy of the totals recorded so far.
    pub async fn snapshot(&self) -> AggregatedStats {
        *self.stats.lock().await
    }

    /// Final totals, once every query of the cycle has reported.
    pub fn into_stats(self) -> AggregatedStats {
        self.stats.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn info(players: u8, max_players: u8) -> ServerInfo {
        ServerInfo {
            players,
            max_players,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_offline_servers_only_count_towards_total() {
        let aggregator = StatsAggregator::new(3);
        aggregator.record(&info(5, 32), 0).await;
        aggregator.record(&info(10, 20), 0).await;

        let stats = aggregator.into_stats();
        assert_eq!(
            stats,
            AggregatedStats {
                servers: 3,
                online: 2,
                players: 15,
                slots: 52,
                queue: 0,
            }
        );
        assert_eq!(stats.cumulative(), 17);
    }

    #[tokio::test]
    async fn test_queue_is_summed() {
        let aggregator = StatsAggregator::new(2);
        aggregator.record(&info(60, 60), 12).await;
        aggregator.record(&info(59, 60), 3).await;

        let stats = aggregator.snapshot().await;
        assert_eq!(stats.queue, 15);
        assert_eq!(stats.cumulative(), 2 + 119 + 15);
    }

    #[tokio::test]
    async fn test_concurrent_records() {
        let aggregator = Arc::new(StatsAggregator::new(50));
        let mut handles = Vec::new();

        for _ in 0..50 {
            let aggregator = Arc::clone(&aggregator);
            handles.push(tokio::spawn(async move {
                aggregator.record(&info(2, 10), 1).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = Arc::try_unwrap(aggregator).unwrap().into_stats();
        assert_eq!(stats.online, 50);
        assert_eq!(stats.players, 100);
        assert_eq!(stats.slots, 500);
        assert_eq!(stats.queue, 50);
        assert!(stats.online <= stats.servers);
    }
}
