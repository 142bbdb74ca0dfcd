//! Protocol constants

use std::time::Duration;

/// Leading frame markers
pub const FRAME_MARKER: [u8; 2] = [0x22, 0x21];

/// Trailing frame terminator
pub const FRAME_TERMINATOR: u8 = 0xFF;

/// Printable width in pixels
pub const PRINTER_WIDTH: usize = 384;

/// Bytes per raster line (1 bit per pixel)
pub const PRINTER_WIDTH_BYTES: usize = PRINTER_WIDTH / 8;

/// The printer refuses to print fewer lines than this
pub const MIN_LINES: usize = 90;

/// Minimum transferable raster buffer (4320 bytes)
pub const MIN_DATA_BYTES: usize = MIN_LINES * PRINTER_WIDTH_BYTES;

/// Fixed third byte of the print-request payload
pub const PRINT_REQUEST_MAGIC: u8 = 0x30;

/// Default print-request mode byte
pub const DEFAULT_PRINT_MODE: u8 = 0x00;

/// Status payload offset of the state bitmask
pub const STATUS_FLAGS_OFFSET: usize = 6;

/// Status payload offset of the battery level
pub const STATUS_BATTERY_OFFSET: usize = 9;

/// Status payload offset of the print head temperature
pub const STATUS_TEMPERATURE_OFFSET: usize = 10;

/// Status payload offset of the error flag
pub const STATUS_ERROR_FLAG_OFFSET: usize = 12;

/// Status payload offset of the error code
pub const STATUS_ERROR_CODE_OFFSET: usize = 13;

/// Timeout for short control commands (status, print request)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a correlated wait when the caller does not pick one
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall wait for the print-complete notification
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(20);

/// Pause after fire-and-forget commands
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Pause between raster chunks on the data channel
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(15);

/// Print head intensity presets
pub mod intensity {
    /// Light print
    pub const LOW: u8 = 0x30;

    /// Medium print (default)
    pub const MEDIUM: u8 = 0x5D;

    /// Dark print
    pub const HIGH: u8 = 0x90;

    pub const DEFAULT: u8 = MEDIUM;
}

/// GATT identifiers advertised by the printer
///
/// Discovery happens outside this crate; these are provided for transport
/// implementations that need to pick the right characteristics.
pub mod gatt {
    /// Print service
    pub const PRINT_SERVICE: &str = "0000ae30-0000-1000-8000-00805f9b34fb";

    /// Alternate service UUID some units advertise during scanning
    pub const ALT_ADVERTISED_SERVICE: &str = "0000af30-0000-1000-8000-00805f9b34fb";

    /// Command channel (write without response)
    pub const CONTROL_CHAR: &str = "0000ae01-0000-1000-8000-00805f9b34fb";

    /// Notification channel
    pub const NOTIFY_CHAR: &str = "0000ae02-0000-1000-8000-00805f9b34fb";

    /// Bulk data channel (write without response)
    pub const DATA_CHAR: &str = "0000ae03-0000-1000-8000-00805f9b34fb";
}
