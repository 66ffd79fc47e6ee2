use clap::Parser;
use log::{info, warn};
use monitor::config::{Config, SinkKind, EXAMPLE_CONFIG};
use monitor::cycle::CycleController;
use monitor::discord::DiscordRest;
use monitor::logging::init_logging;
use monitor::presence::PresencePublisher;
use monitor::queue::{update_queue, WorkerPool};
use monitor::sink::{LogSink, PresentationSurface};
use monitor::target::Target;
use monitor::update::UpdateProcessor;
use shared::Renderer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for draining the update queue on shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Loads the configuration, starts the update workers and polls until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Configuration file
        #[clap(short, long, default_value = "config.yaml")]
        config: PathBuf,
        /// Print an example configuration and exit
        #[clap(long)]
        example: bool,
        /// Run a single cycle, wait for its updates and exit
        #[clap(long)]
        once: bool,
        /// Log updates instead of sending them
        #[clap(long)]
        dry_run: bool,
    }

    let args = Args::parse();

    if args.example {
        print!("{}", EXAMPLE_CONFIG);
        return Ok(());
    }

    let mut config = Config::load(&args.config)?;
    if args.dry_run {
        config.bot.sink = SinkKind::Log;
    }
    init_logging(&config.logging)?;

    info!(
        "monitoring {} server(s) every {:?} with {} worker(s)",
        config.servers.len(),
        config.bot.update_interval,
        config.bot.concurrency
    );

    let surface: Arc<dyn PresentationSurface> = match config.bot.sink {
        SinkKind::Log => Arc::new(LogSink),
        SinkKind::Discord => Arc::new(DiscordRest::new(config.bot.token.clone())),
    };

    let (producer, consumer) = update_queue(config.bot.queue_capacity);
    let processor = UpdateProcessor::new(Arc::new(Renderer::new()), surface, config.bot.apply_timeout);
    let pool = WorkerPool::start(consumer, config.bot.concurrency, Arc::new(processor));

    let targets = config
        .servers
        .iter()
        .map(|server| Arc::new(Target::from_config(server)))
        .collect();

    let mut controller = CycleController::new(
        targets,
        Arc::new(a2s::A2sClient::new()),
        producer,
        PresencePublisher::new(Arc::new(LogSink)),
        config.bot.concurrency,
    );

    if args.once {
        controller.run_cycle().await;
    } else {
        controller
            .run(config.bot.update_interval, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
                info!("received Ctrl+C, shutting down");
            })
            .await;
    }

    // Dropping the controller closes the queue; workers finish what is left
    drop(controller);
    if tokio::time::timeout(DRAIN_TIMEOUT, pool.join()).await.is_err() {
        warn!("update workers did not finish within {:?}", DRAIN_TIMEOUT);
    }

    Ok(())
}
