//! Tile-blocks and their edge validity.

/// A tile-block of the padded grid, clamped against the true image bounds.
///
/// `valid_width`/`valid_height` say how many of the nominal columns/rows fall
/// inside the true image; both are at least 1 for any block the traversal
/// visits. [`contains()`](Self::contains) is the single edge-validity rule:
/// every decoded pixel position is checked against it before the image is
/// touched, so out-of-bounds reads are structurally impossible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileBlock {
    /// Leftmost pixel column of the block.
    pub left: usize,
    /// Topmost pixel row of the block.
    pub top: usize,
    /// Nominal block width in pixels.
    pub width: usize,
    /// Nominal block height in pixels.
    pub height: usize,
    /// Columns inside the true image, `1..=width`.
    pub valid_width: usize,
    /// Rows inside the true image, `1..=height`.
    pub valid_height: usize,
}

impl TileBlock {
    /// Whether the absolute pixel position is a real image pixel.
    ///
    /// Positions inside the nominal block but past the valid extent are
    /// don't-care padding.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.top
            && row < self.top + self.valid_height
            && col >= self.left
            && col < self.left + self.valid_width
    }

    /// Whether any part of the nominal block lies outside the true image.
    pub fn is_partial(&self) -> bool {
        self.valid_width < self.width || self.valid_height < self.height
    }
}
