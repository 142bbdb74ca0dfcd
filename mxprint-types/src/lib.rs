//! Type definitions for mxprint

pub mod bitmap;
pub mod error;
pub mod intensity;
pub mod report;

pub use bitmap::Bitmap;
pub use error::{Error, Result};
pub use intensity::Intensity;
pub use report::PrintReport;
