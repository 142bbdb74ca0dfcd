//! Monochrome bitmap input

use std::fmt;

use crate::error::{Error, Result};

/// Rows of boolean pixels at a fixed width (`true` = black)
///
/// The bitmap is expected to be oriented the way the printer feeds paper;
/// no rotation happens downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    rows: Vec<Vec<bool>>,
}

impl Bitmap {
    /// Most lines a single print request can announce
    pub const MAX_LINES: usize = u16::MAX as usize;

    /// Create an empty bitmap
    pub fn new(width: usize) -> Self {
        Self {
            width,
            rows: Vec::new(),
        }
    }

    /// Create a blank (all white) bitmap
    pub fn blank(width: usize, height: usize) -> Result<Self> {
        Self::from_rows(width, vec![vec![false; width]; height])
    }

    /// Create a bitmap from rows, validating every row width
    pub fn from_rows(width: usize, rows: Vec<Vec<bool>>) -> Result<Self> {
        if width == 0 {
            return Err(Error::Validation("bitmap width must be > 0".into()));
        }

        if rows.len() > Self::MAX_LINES {
            return Err(Error::Validation(format!(
                "bitmap has {} lines, at most {} can be printed at once",
                rows.len(),
                Self::MAX_LINES
            )));
        }

        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(Error::Validation(format!(
                "row {} has {} pixels, expected {}",
                index,
                row.len(),
                width
            )));
        }

        Ok(Self { width, rows })
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<bool>) -> Result<()> {
        if row.len() != self.width {
            return Err(Error::Validation(format!(
                "row has {} pixels, expected {}",
                row.len(),
                self.width
            )));
        }
        if self.rows.len() >= Self::MAX_LINES {
            return Err(Error::Validation("bitmap is full".into()));
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    /// Pixel at (x, y), `None` when out of bounds
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Count of black pixels
    pub fn ink(&self) -> usize {
        self.rows.iter().flatten().filter(|&&black| black).count()
    }
}

impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap[{}x{}]", self.width, self.rows.len())
    }
}
