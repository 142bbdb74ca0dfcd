//! Print against an in-process simulated printer
//!
//! Run with `RUST_LOG=mxprint=debug` to follow the job states.

use std::time::Duration;

use anyhow::Context;
use mxprint::{Bitmap, Command, Frame, Intensity, MemoryTransport, Printer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let intensity: Intensity = std::env::var("MXPRINT_INTENSITY")
        .unwrap_or_else(|_| "medium".to_string())
        .parse()
        .context("MXPRINT_INTENSITY must be low, medium, high or a byte value")?;

    let (transport, mut peer) = MemoryTransport::pair("MXW01-sim");

    // Answer like a healthy printer with paper loaded
    tokio::spawn(async move {
        while let Some(frame) = peer.recv_frame().await {
            let reply = match frame.command() {
                Ok(Command::GetStatus) => Frame::with_payload(Command::GetStatus, vec![0u8; 14]),
                Ok(Command::PrintRequest) => Frame::with_payload(Command::PrintRequest, vec![0x00]),
                Ok(Command::FlushData) => {
                    let chunks = peer.drain_data();
                    println!("Printer received {} data chunks", chunks.len());
                    Ok(Frame::new(Command::PrintComplete))
                }
                _ => continue,
            };

            if let Ok(reply) = reply {
                if peer.notify(&reply).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut printer = Printer::new(transport).with_timeout(Duration::from_secs(2));
    printer.connect().await?;
    println!("✓ Connected!");

    // Diagonal stripes, 200 lines
    let rows = (0..200)
        .map(|y| (0..384).map(|x| (x + y) % 32 < 8).collect())
        .collect();
    let bitmap = Bitmap::from_rows(384, rows)?;

    let report = printer.print(&bitmap, intensity).await?;
    println!("✓ {}", report);
    println!("State: {}", printer.state());

    printer.disconnect().await;

    Ok(())
}
