use a2s::A2sClient;
use clap::Parser;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Query a game server with A2S_INFO and print the result as JSON", long_about = None)]
struct Args {
    /// Server query address, e.g. 127.0.0.1:27016
    address: String,

    /// Query timeout in seconds
    #[arg(short = 't', long, default_value = "3")]
    timeout: u64,

    /// Receive buffer size in bytes
    #[arg(short = 'b', long, default_value = "1400")]
    buffer_size: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Querying {}", args.address);
    let client = A2sClient::new();
    let server_info = client
        .query_info(&args.address, Duration::from_secs(args.timeout), args.buffer_size)
        .await?;

    let extra = server_info.extra();
    let output = serde_json::json!({
        "Info": server_info,
        "AppName": shared::template::app_name(server_info.app_id()),
        "Extra": extra,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
