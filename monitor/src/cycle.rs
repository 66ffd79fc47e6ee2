//! Polling cycle: bounded query fan-out, aggregation and presence.

use crate::aggregate::{AggregatedStats, StatsAggregator};
use crate::presence::{PresencePublisher, PublishOutcome};
use crate::query::QueryClient;
use crate::queue::UpdateProducer;
use crate::target::Target;
use crate::task::{TemplateData, UpdateTask};
use log::{debug, error, info, warn};
use shared::GameExtra;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};

/// Summary of one finished cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub stats: AggregatedStats,
    /// `None` when publishing the presence failed
    pub presence: Option<PublishOutcome>,
    pub elapsed: Duration,
}

/// Drives polling cycles.
///
/// A cycle queries every target with at most `concurrency` queries in flight,
/// hands one update task per target to the update queue (offline targets
/// included), waits for all queries and only then publishes the presence.
/// Cycles never overlap: the next one starts after the previous join.
pub struct CycleController {
    targets: Vec<Arc<Target>>,
    query: Arc<dyn QueryClient>,
    producer: UpdateProducer,
    presence: PresencePublisher,
    concurrency: usize,
    cycle: u64,
}

impl CycleController {
    pub fn new(
        targets: Vec<Arc<Target>>,
        query: Arc<dyn QueryClient>,
        producer: UpdateProducer,
        presence: PresencePublisher,
        concurrency: usize,
    ) -> Self {
        Self {
            targets,
            query,
            producer,
            presence,
            concurrency: concurrency.max(1),
            cycle: 0,
        }
    }

    /// Number of cycles started so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn targets(&self) -> &[Arc<Target>] {
        &self.targets
    }

    /// Runs one complete cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let cycle = self.cycle;
        let started = Instant::now();

        let gate = Arc::new(Semaphore::new(self.concurrency));
        let aggregator = Arc::new(StatsAggregator::new(self.targets.len()));
        let mut queries = JoinSet::new();

        for target in &self.targets {
            let permit = match Arc::clone(&gate).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("query gate closed: {}", e);
                    break;
                }
            };

            let target = Arc::clone(target);
            let query = Arc::clone(&self.query);
            let aggregator = Arc::clone(&aggregator);
            let producer = self.producer.clone();

            queries.spawn(async move {
                let data = poll_target(query.as_ref(), &target, &aggregator).await;
                drop(permit);

                let id = target.id.clone();
                if let Err(e) = producer.push(UpdateTask::new(target, cycle, data)).await {
                    error!("server={} update not queued: {}", id, e);
                }
            });
        }

        while let Some(result) = queries.join_next().await {
            if let Err(e) = result {
                error!("query task failed: {}", e);
            }
        }

        let stats = match Arc::try_unwrap(aggregator) {
            Ok(aggregator) => aggregator.into_stats(),
            Err(aggregator) => aggregator.snapshot().await,
        };

        let presence = self.presence.publish(&stats).await.ok();
        let elapsed = started.elapsed();

        info!(
            "cycle {} finished in {:?}: {}/{} servers online, {}/{} players, {} queued, {} update(s) pending",
            cycle,
            elapsed,
            stats.online,
            stats.servers,
            stats.players,
            stats.slots,
            stats.queue,
            self.producer.pending()
        );

        CycleReport {
            cycle,
            stats,
            presence,
            elapsed,
        }
    }

    /// Runs a cycle on every tick of `every` until `shutdown` resolves. The
    /// first cycle starts immediately. A running cycle is always finished
    /// before shutdown is observed, and ticks missed meanwhile are skipped.
    pub async fn run<F>(&mut self, every: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("polling stopped after {} cycle(s)", self.cycle);
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }
}

/// Queries one target and records it when it answered.
async fn poll_target(query: &dyn QueryClient, target: &Target, aggregator: &StatsAggregator) -> TemplateData {
    let address = target.address();
    debug!("server={} querying {}", target.id, address);

    let result = timeout(
        target.timeout,
        query.query(&address, target.timeout, target.buffer_size),
    )
    .await;

    match result {
        Ok(Ok(info)) => {
            let extra = info.extra();
            let queued = extra.as_ref().map_or(0, GameExtra::queued_players);
            aggregator.record(&info, queued).await;

            TemplateData {
                info: Some(info),
                extra,
                ..TemplateData::offline(target)
            }
        }
        Ok(Err(e)) => {
            warn!("server={} query failed: {}", target.id, e);
            TemplateData::offline(target)
        }
        Err(_) => {
            warn!("server={} query timed out after {:?}", target.id, target.timeout);
            TemplateData::offline(target)
        }
    }
}
