//! Walk a print job without touching the transport

use mxprint::{Bitmap, Intensity, MemoryTransport, Printer, PrinterConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let (transport, _peer) = MemoryTransport::pair("MXW01");
    let config = PrinterConfig::default().with_dry_run(true);
    let mut printer = Printer::with_config(transport, config);

    let bitmap = Bitmap::blank(384, 48)?;
    let report = printer.print(&bitmap, Intensity::LOW).await?;

    println!("{}", report);

    Ok(())
}
