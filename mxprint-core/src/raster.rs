//! 1bpp raster buffer construction
//!
//! Rows of boolean pixels are packed LSB-first: pixel `8 * i + bit` of a row
//! lands in bit `bit` of byte `i`. Rows are concatenated in the order given
//! and the result is zero-padded up to the printer's minimum transfer size.
//! Orientation is the caller's business; no rows are reordered here.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::{
    constants::{MIN_LINES, PRINTER_WIDTH, PRINTER_WIDTH_BYTES},
    error::{Error, Result},
};

/// Packed raster data ready for the data channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    data: Bytes,
    lines: usize,
    bytes_per_row: usize,
}

impl ImageBuffer {
    /// Build a buffer for the standard 384-pixel print head
    ///
    /// # Examples
    ///
    /// ```
    /// use mxprint_core::ImageBuffer;
    ///
    /// let rows = vec![vec![true; 384]];
    /// let buffer = ImageBuffer::for_printer(&rows).unwrap();
    ///
    /// assert_eq!(&buffer.as_bytes()[..48], &[0xFF; 48]);
    /// assert_eq!(buffer.len(), 4320);
    /// ```
    pub fn for_printer<R: AsRef<[bool]>>(rows: &[R]) -> Result<Self> {
        Self::build(rows, PRINTER_WIDTH, PRINTER_WIDTH_BYTES, MIN_LINES)
    }

    /// Build a buffer from rows of pixels
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowWidthMismatch`] if any row is not exactly
    /// `row_width` pixels wide. Nothing is encoded in that case.
    pub fn build<R: AsRef<[bool]>>(
        rows: &[R],
        row_width: usize,
        bytes_per_row: usize,
        min_lines: usize,
    ) -> Result<Self> {
        if let Some((row, actual)) = rows
            .iter()
            .map(|r| r.as_ref().len())
            .enumerate()
            .find(|&(_, len)| len != row_width)
        {
            return Err(Error::RowWidthMismatch {
                row,
                expected: row_width,
                actual,
            });
        }

        let min_bytes = min_lines * bytes_per_row;
        let mut buf = BytesMut::with_capacity((rows.len() * bytes_per_row).max(min_bytes));

        for row in rows {
            encode_row(row.as_ref(), bytes_per_row, &mut buf);
        }

        if buf.len() < min_bytes {
            buf.resize(min_bytes, 0);
        }

        debug!(
            lines = rows.len(),
            bytes = buf.len(),
            "Built raster buffer"
        );

        Ok(Self {
            data: buf.freeze(),
            lines: rows.len(),
            bytes_per_row,
        })
    }

    /// Number of image lines (before padding)
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Number of lines after padding
    pub fn padded_lines(&self) -> usize {
        if self.bytes_per_row == 0 {
            return 0;
        }
        self.data.len() / self.bytes_per_row
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Split the buffer into successive transfer chunks
    ///
    /// The last chunk may be shorter. Chunks share the underlying buffer.
    pub fn chunks(&self, chunk_size: usize) -> impl Iterator<Item = Bytes> + '_ {
        let size = chunk_size.max(1);
        (0..self.data.len())
            .step_by(size)
            .map(move |start| self.data.slice(start..(start + size).min(self.data.len())))
    }
}

/// Pack one row of pixels into `bytes_per_row` bytes
///
/// Pixels beyond `bytes_per_row * 8` are ignored; missing pixels are blank.
pub fn encode_row(row: &[bool], bytes_per_row: usize, out: &mut impl BufMut) {
    let mut groups = row.chunks(8);

    for _ in 0..bytes_per_row {
        let byte = groups.next().map_or(0, |group| {
            group
                .iter()
                .enumerate()
                .filter(|&(_, &black)| black)
                .fold(0u8, |acc, (bit, _)| acc | (1 << bit))
        });
        out.put_u8(byte);
    }
}
