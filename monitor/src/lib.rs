//! # Game Server Monitor
//!
//! Periodically polls a set of game servers over A2S, aggregates the results
//! and keeps external presentation surfaces (a channel and a category per
//! server, plus one global presence line) in sync with what the servers
//! report. External calls are only made when the rendered text changed.
//!
//! ## Pipeline
//!
//! ### Cycle Controller (`cycle`)
//! Runs one polling pass per tick:
//! - Queries every server with a bounded number of queries in flight
//! - Folds every answer into the cycle's [`aggregate::AggregatedStats`]
//! - Hands one [`task::UpdateTask`] per server to the update queue, offline servers included
//! - Publishes the presence once all queries of the cycle have finished
//!
//! ### Update Queue (`queue`)
//! A bounded FIFO between the fast polling path and the slow chat service.
//! A full queue makes the cycle wait instead of dropping updates. A fixed
//! pool of workers drains it for the lifetime of the process.
//!
//! ### Change Detection (`change`, `update`)
//! Workers render the name and description templates of each surface,
//! fingerprint the result and compare it with the last successfully applied
//! fingerprint. Only changed surfaces are sent, each task under one deadline.
//! Failed or canceled updates keep the old fingerprint and are retried on the
//! next cycle.
//!
//! ### Presence (`presence`)
//! Turns the cycle totals into a status line such as
//! `15/52 (+3) players on 2/3 servers` and publishes it when the totals moved.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use monitor::cycle::CycleController;
//! use monitor::presence::PresencePublisher;
//! use monitor::queue::{update_queue, WorkerPool};
//! use monitor::sink::LogSink;
//! use monitor::target::Target;
//! use monitor::update::UpdateProcessor;
//! use shared::Renderer;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (producer, consumer) = update_queue(100);
//!     let processor = UpdateProcessor::new(Arc::new(Renderer::new()), Arc::new(LogSink), Duration::from_secs(30));
//!     let pool = WorkerPool::start(consumer, 4, Arc::new(processor));
//!
//!     let target = Target::new("chernarus", "127.0.0.1", 27016)
//!         .with_primary("1", "{{ if .Info }}{{ .Info.Players }}/{{ .Info.MaxPlayers }}{{ else }}offline{{ end }}", None);
//!
//!     let mut controller = CycleController::new(
//!         vec![Arc::new(target)],
//!         Arc::new(a2s::A2sClient::new()),
//!         producer,
//!         PresencePublisher::new(Arc::new(LogSink)),
//!         4,
//!     );
//!     controller.run_cycle().await;
//!
//!     drop(controller);
//!     pool.join().await;
//! }
//! ```

pub mod aggregate;
pub mod change;
pub mod config;
pub mod cycle;
pub mod discord;
pub mod logging;
pub mod presence;
pub mod query;
pub mod queue;
pub mod sink;
pub mod target;
pub mod task;
pub mod update;
