use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use rcu_core::session::transfer_session::TransferSession;
use rcu_core::telemetry;
use rcu_core::transport::artifact::fetch_artifact;
use rcu_core::types::types::TransferConfig;

mod terminal_observer;
use terminal_observer::TerminalProgressObserver;

#[derive(Parser)]
#[command(name = "rcu", about = "Upload a file for conversion and track it to completion")]
struct Args {
    /// File to upload
    file: PathBuf,

    /// Vendor (conversion profile) to upload under
    vendor: String,

    /// Conversion service base URL
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Delay between status polls, in milliseconds
    #[arg(long, default_value = "1000")]
    interval_ms: u64,

    /// Give up after this many status polls (default: poll until the server answers)
    #[arg(long)]
    max_polls: Option<u32>,

    /// Fetch the converted artifact to this path once processing completes
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut config = TransferConfig::new(args.server.clone())
        .with_poll_interval(Duration::from_millis(args.interval_ms));
    if let Some(max) = args.max_polls {
        config = config.with_max_poll_attempts(max);
    }

    let mut session = TransferSession::new(config);
    session.add_observer(Box::new(TerminalProgressObserver::new()));

    println!("Uploading {} for vendor {}", args.file.display(), args.vendor);

    match session.start(&args.file, &args.vendor).await {
        Ok(completed) => {
            println!("Converted file ready: {}", completed.download_ref);

            if let Some(output) = args.output {
                match fetch_artifact(session.client(), &completed.download_ref, &output).await {
                    Ok(bytes) => {
                        telemetry::report_download_status(
                            session.client(),
                            &args.server,
                            &completed.vendor,
                            &completed.filename,
                        )
                        .await;
                        println!("Saved {} ({} bytes)", output.display(), bytes);
                    }
                    Err(e) => {
                        eprintln!("Artifact download failed: {}", e.user_message());
                        std::process::exit(1);
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("Transfer failed: {}", e.user_message());
            std::process::exit(1);
        }
    }
}
