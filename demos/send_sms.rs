// ABOUTME: Demo application sending one SMS through a bound transceiver session
// ABOUTME: Prints per-segment outcomes and any delivery receipts that arrive before it stops

use argh::FromArgs;
use smpp_session::client::{BindCredentials, OutboundMessage, SessionBuilder, SessionConfig};
use smpp_session::datatypes::{Address, DataCoding};
use std::error::Error;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Send an SMS message and wait for its delivery receipt
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the system id
    #[argh(option)]
    system_id: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the hostname of IP address of the SMSC (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// the message to send
    #[argh(option, short = 'm')]
    message: String,

    /// the recipient telephone number, international format
    #[argh(option, short = 't')]
    to: String,

    /// the alphanumeric sender name (default: MelroseLabs)
    #[argh(option, short = 'f')]
    from: Option<String>,

    /// seconds to wait for delivery receipts before stopping (default: 10)
    #[argh(option, short = 'w')]
    wait: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let level = if cli_args.debugging {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(2775);
    let credentials = BindCredentials::new(
        cli_args.system_id.unwrap_or_default(),
        cli_args.password.unwrap_or_default(),
    );
    let config = SessionConfig::new(format!("{host}:{port}"), credentials);

    let session = SessionBuilder::new(config)
        .on_receipt(|receipt| {
            println!(
                "receipt {}: {} ({:?}, err {})",
                receipt.id,
                receipt.stat,
                receipt.status(),
                receipt.err
            )
        })
        .start()
        .await
        .map_err(|e| {
            eprintln!("Connection/bind failed: {e}");
            e
        })?;

    let message = OutboundMessage::builder()
        .from(Address::alphanumeric(
            cli_args.from.unwrap_or_else(|| "MelroseLabs".to_owned()),
        ))
        .to(Address::international(cli_args.to))
        .text(cli_args.message)
        .data_coding(DataCoding::Ucs2)
        .with_delivery_receipt()
        .build()?;

    for outcome in session.submit(&message).await? {
        match &outcome.result {
            Ok(message_id) => println!("segment {}: accepted as {message_id}", outcome.segment_index),
            Err(e) => eprintln!("segment {}: {e}", outcome.segment_index),
        }
    }

    tokio::time::sleep(Duration::from_secs(cli_args.wait.unwrap_or(10))).await;
    session.stop().await?;
    Ok(())
}
