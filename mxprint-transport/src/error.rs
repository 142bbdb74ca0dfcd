//! Transport errors

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("Write to {channel} channel failed: {reason}")]
    WriteFailed {
        channel: &'static str,
        reason: String,
    },
}
