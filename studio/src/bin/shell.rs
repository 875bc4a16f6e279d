//! Interactive QR studio. Reads commands from stdin and prints JSON notices.
//!
//! Logs go to stderr so stdout stays machine-readable.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use qr_studio_lib::app::Studio;
use qr_studio_lib::clipboard::SystemClipboard;
use qr_studio_lib::shell::{self, Reply};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting QR studio");

    let config = qr_studio_lib::init_config();
    let mut studio = Studio::open(&config, Box::new(SystemClipboard::new())).await?;

    let mut notices = studio.subscribe();
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => println!("{}", notice.to_json_line()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notice printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{}", shell::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match shell::run_line(&mut studio, &line).await {
                    Reply::Nothing => {}
                    Reply::Output(out) => println!("{out}"),
                    Reply::Quit => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("Shutting down...");
    Ok(())
}
