//! Stripe geometry: tiling configuration and per-image layout.
//!
//! [`GeometryConfig`] holds the raw tiling parameters. [`GeometryConfig::build()`]
//! validates them once into an immutable [`StripeGeometry`], which is then shared
//! by the placer, the address translator, and the verifier for the whole run.
//! [`StripeGeometry::layout()`] derives the per-image patch/block grid
//! ([`ImageLayout`]) that all address arithmetic walks.

use alloc::vec;
use alloc::vec::Vec;

use crate::assign::ChannelAssignmentTable;
use crate::block::TileBlock;

/// Tiling configuration for one stripe layout.
///
/// All fields are plain data; nothing is validated until [`build()`](Self::build).
/// The default values describe the reference flash layout: 16 KiB pages, 8
/// channels, 512×512 patches, 4×4 blocks, 2×1 steps, and the round-robin
/// assignment table `[[0,4],[1,5],[2,6],[3,7]]`.
///
/// # Example
///
/// ```
/// use zenstripe::GeometryConfig;
///
/// let geometry = GeometryConfig::default()
///     .with_patch_size(64, 64)
///     .with_page_size(4096)
///     .build()?;
/// assert_eq!(geometry.channels(), 8);
/// # Ok::<(), zenstripe::GeometryError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct GeometryConfig {
    /// Page size in bytes. Every channel stream is a sequence of pages of
    /// exactly this size.
    pub page_size: usize,
    /// Number of independent physical channels.
    pub channels: usize,
    /// Patch width in pixels. Must be a multiple of `block_width`.
    pub patch_width: usize,
    /// Patch height in pixels. Must be a multiple of `block_height`.
    pub patch_height: usize,
    /// Tile-block width in pixels. Must be a multiple of `step_width`.
    pub block_width: usize,
    /// Tile-block height in pixels. Must be a multiple of `step_height`.
    pub block_height: usize,
    /// Step width in pixels.
    pub step_width: usize,
    /// Step height in pixels. The step must cover exactly two pixels.
    pub step_height: usize,
    /// Bytes per pixel. One byte per interleaved color plane; must be 3.
    pub bytes_per_pixel: usize,
    /// Fill value for don't-care bytes (addresses outside the true image).
    pub pad_byte: u8,
    /// Step-grid to channel assignment, row-major: `table[step_row][step_col]`.
    /// Must be a bijection onto `0..channels`.
    pub table: Vec<Vec<usize>>,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            page_size: 16384,
            channels: 8,
            patch_width: 512,
            patch_height: 512,
            block_width: 4,
            block_height: 4,
            step_width: 2,
            step_height: 1,
            bytes_per_pixel: 3,
            pad_byte: 0,
            table: vec![vec![0, 4], vec![1, 5], vec![2, 6], vec![3, 7]],
        }
    }
}

impl GeometryConfig {
    /// Set the page size in bytes.
    pub fn with_page_size(mut self, bytes: usize) -> Self {
        self.page_size = bytes;
        self
    }

    /// Set the channel count.
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Set the patch dimensions in pixels.
    pub fn with_patch_size(mut self, width: usize, height: usize) -> Self {
        self.patch_width = width;
        self.patch_height = height;
        self
    }

    /// Set the tile-block dimensions in pixels.
    pub fn with_block_size(mut self, width: usize, height: usize) -> Self {
        self.block_width = width;
        self.block_height = height;
        self
    }

    /// Set the step dimensions in pixels.
    pub fn with_step_size(mut self, width: usize, height: usize) -> Self {
        self.step_width = width;
        self.step_height = height;
        self
    }

    /// Set the padding sentinel written for don't-care bytes.
    pub fn with_pad_byte(mut self, byte: u8) -> Self {
        self.pad_byte = byte;
        self
    }

    /// Set the step-grid to channel assignment table.
    pub fn with_table(mut self, table: Vec<Vec<usize>>) -> Self {
        self.table = table;
        self
    }

    /// Validate the configuration into an immutable [`StripeGeometry`].
    ///
    /// All checks here are fatal startup conditions, not per-call errors:
    /// a geometry that builds never fails later for configuration reasons.
    pub fn build(self) -> Result<StripeGeometry, GeometryError> {
        for (what, value) in [
            ("page size", self.page_size),
            ("channel count", self.channels),
            ("patch width", self.patch_width),
            ("patch height", self.patch_height),
            ("block width", self.block_width),
            ("block height", self.block_height),
            ("step width", self.step_width),
            ("step height", self.step_height),
            ("bytes per pixel", self.bytes_per_pixel),
        ] {
            if value == 0 {
                return Err(GeometryError::Zero { what });
            }
        }
        if self.bytes_per_pixel != 3 {
            return Err(GeometryError::PixelDepth {
                actual: self.bytes_per_pixel,
            });
        }
        if self.block_width % self.step_width != 0 {
            return Err(GeometryError::StepBlockMismatch {
                axis: "width",
                step: self.step_width,
                block: self.block_width,
            });
        }
        if self.block_height % self.step_height != 0 {
            return Err(GeometryError::StepBlockMismatch {
                axis: "height",
                step: self.step_height,
                block: self.block_height,
            });
        }
        if self.patch_width % self.block_width != 0 {
            return Err(GeometryError::BlockPatchMismatch {
                axis: "width",
                block: self.block_width,
                patch: self.patch_width,
            });
        }
        if self.patch_height % self.block_height != 0 {
            return Err(GeometryError::BlockPatchMismatch {
                axis: "height",
                block: self.block_height,
                patch: self.patch_height,
            });
        }
        // The decode unit is two bytes: one color plane of one step.
        let unit_bytes = self.step_width * self.step_height;
        if unit_bytes != 2 {
            return Err(GeometryError::StepArea { actual: unit_bytes });
        }
        if self.page_size % unit_bytes != 0 {
            return Err(GeometryError::PageSize {
                actual: self.page_size,
            });
        }
        let step_rows = self.block_height / self.step_height;
        let step_cols = self.block_width / self.step_width;
        let table =
            ChannelAssignmentTable::from_rows(&self.table, step_rows, step_cols, self.channels)?;

        let block_bytes = self.block_width * self.block_height * self.bytes_per_pixel;
        // step cells == channels (bijection), so this divides exactly
        let channel_share = block_bytes / self.channels;

        Ok(StripeGeometry {
            page_size: self.page_size,
            channels: self.channels,
            patch_width: self.patch_width,
            patch_height: self.patch_height,
            block_width: self.block_width,
            block_height: self.block_height,
            step_width: self.step_width,
            step_height: self.step_height,
            bytes_per_pixel: self.bytes_per_pixel,
            pad_byte: self.pad_byte,
            table,
            block_bytes,
            channel_share,
            unit_bytes,
        })
    }
}

/// Validated, immutable stripe geometry.
///
/// Built once by [`GeometryConfig::build()`] and shared by reference for the
/// rest of the run. Every invariant the address arithmetic relies on (step
/// divides block, block divides patch, assignment table is a bijection) has
/// already been checked, so the accessors and derived constants never fail.
#[derive(Clone, Debug)]
pub struct StripeGeometry {
    page_size: usize,
    channels: usize,
    patch_width: usize,
    patch_height: usize,
    block_width: usize,
    block_height: usize,
    step_width: usize,
    step_height: usize,
    bytes_per_pixel: usize,
    pad_byte: u8,
    table: ChannelAssignmentTable,
    block_bytes: usize,
    channel_share: usize,
    unit_bytes: usize,
}

impl StripeGeometry {
    /// Page size in bytes.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of physical channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Patch width in pixels.
    pub fn patch_width(&self) -> usize {
        self.patch_width
    }

    /// Patch height in pixels.
    pub fn patch_height(&self) -> usize {
        self.patch_height
    }

    /// Tile-block width in pixels.
    pub fn block_width(&self) -> usize {
        self.block_width
    }

    /// Tile-block height in pixels.
    pub fn block_height(&self) -> usize {
        self.block_height
    }

    /// Step width in pixels.
    pub fn step_width(&self) -> usize {
        self.step_width
    }

    /// Step height in pixels.
    pub fn step_height(&self) -> usize {
        self.step_height
    }

    /// Bytes per pixel (always 3).
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Padding sentinel for don't-care bytes.
    pub fn pad_byte(&self) -> u8 {
        self.pad_byte
    }

    /// The step-grid to channel assignment table.
    pub fn assignment(&self) -> &ChannelAssignmentTable {
        &self.table
    }

    /// Number of step rows per tile-block.
    pub fn step_rows(&self) -> usize {
        self.table.step_rows()
    }

    /// Number of step columns per tile-block.
    pub fn step_cols(&self) -> usize {
        self.table.step_cols()
    }

    /// Total bytes one tile-block contributes across all channels.
    pub fn block_bytes(&self) -> usize {
        self.block_bytes
    }

    /// Bytes each channel receives per tile-block.
    pub fn channel_share(&self) -> usize {
        self.channel_share
    }

    /// Bytes per decode unit: one color plane of one step (always 2).
    pub fn unit_bytes(&self) -> usize {
        self.unit_bytes
    }

    /// Derive the patch/block grid for an image of the given dimensions.
    ///
    /// Returns [`GeometryError::EmptyImage`] if either dimension is zero.
    pub fn layout(&self, width: usize, height: usize) -> Result<ImageLayout, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::EmptyImage);
        }
        let padded = PaddedExtent {
            width: align_up(width, self.block_width),
            height: align_up(height, self.block_height),
        };
        Ok(ImageLayout {
            width,
            height,
            padded,
            full_patch_rows: padded.height / self.patch_height,
            partial_patch_height: padded.height % self.patch_height,
            full_patch_cols: padded.width / self.patch_width,
            partial_patch_width: padded.width % self.patch_width,
            patch_width: self.patch_width,
            patch_height: self.patch_height,
            block_width: self.block_width,
            block_height: self.block_height,
            bytes_per_pixel: self.bytes_per_pixel,
            block_bytes: self.block_bytes,
            channels: self.channels,
            page_size: self.page_size,
        })
    }
}

/// Image dimensions rounded up to the next tile-block multiple.
///
/// Traversal bookkeeping only: pixels beyond the true image are never read,
/// they decode to the padding sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaddedExtent {
    /// Padded width in pixels (a multiple of the block width).
    pub width: usize,
    /// Padded height in pixels (a multiple of the block height).
    pub height: usize,
}

/// Per-image patch/block grid, derived once per image.
///
/// Holds the padded extent, the full/partial patch counts per axis, and the
/// byte spans of each traversal level. The `*_at` accessors pick the full or
/// trailing-partial size for a given index; every divisor in the address walk
/// comes from here, which keeps the full-vs-partial selection in one place.
#[derive(Clone, Debug)]
pub struct ImageLayout {
    width: usize,
    height: usize,
    padded: PaddedExtent,
    full_patch_rows: usize,
    partial_patch_height: usize,
    full_patch_cols: usize,
    partial_patch_width: usize,
    patch_width: usize,
    patch_height: usize,
    block_width: usize,
    block_height: usize,
    bytes_per_pixel: usize,
    block_bytes: usize,
    channels: usize,
    page_size: usize,
}

impl ImageLayout {
    /// True image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// True image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The padded extent.
    pub fn padded_extent(&self) -> PaddedExtent {
        self.padded
    }

    /// Number of patch rows, counting a trailing partial row.
    pub fn patch_rows(&self) -> usize {
        self.full_patch_rows + usize::from(self.partial_patch_height > 0)
    }

    /// Number of patch columns, counting a trailing partial column.
    pub fn patch_cols(&self) -> usize {
        self.full_patch_cols + usize::from(self.partial_patch_width > 0)
    }

    /// Padded height in pixels of the patches in the given patch row.
    pub fn patch_height_at(&self, patch_row: usize) -> usize {
        if patch_row < self.full_patch_rows {
            self.patch_height
        } else {
            self.partial_patch_height
        }
    }

    /// Padded width in pixels of the patches in the given patch column.
    pub fn patch_width_at(&self, patch_col: usize) -> usize {
        if patch_col < self.full_patch_cols {
            self.patch_width
        } else {
            self.partial_patch_width
        }
    }

    /// Bytes covered by one full-height patch row across the padded width.
    ///
    /// Always the nominal patch height: a trailing partial patch row holds
    /// fewer bytes than this span, so offsets inside it still divide to the
    /// last row index.
    pub fn patch_row_span(&self) -> usize {
        self.padded.width * self.patch_height * self.bytes_per_pixel
    }

    /// Bytes covered by one patch in the given patch row.
    pub fn patch_span(&self, patch_row: usize) -> usize {
        self.patch_width * self.patch_height_at(patch_row) * self.bytes_per_pixel
    }

    /// Bytes covered by one row of tile-blocks in a patch of the given column.
    pub fn block_row_span(&self, patch_col: usize) -> usize {
        (self.patch_width_at(patch_col) / self.block_width) * self.block_bytes
    }

    /// Valid bytes each channel carries for this image.
    pub fn channel_bytes(&self) -> usize {
        self.padded.width * self.padded.height * self.bytes_per_pixel / self.channels
    }

    /// Pages each channel needs to cover [`channel_bytes()`](Self::channel_bytes).
    pub fn pages_needed(&self) -> usize {
        self.channel_bytes().div_ceil(self.page_size)
    }

    /// The tile-block at the given pixel origin, clamped to the true image.
    ///
    /// The origin must lie on the padded block grid, inside the true image.
    pub fn block_at(&self, left: usize, top: usize) -> TileBlock {
        let right = left + self.block_width;
        let bottom = top + self.block_height;
        TileBlock {
            left,
            top,
            width: self.block_width,
            height: self.block_height,
            valid_width: self.block_width - right.saturating_sub(self.width),
            valid_height: self.block_height - bottom.saturating_sub(self.height),
        }
    }
}

fn align_up(value: usize, to: usize) -> usize {
    value.div_ceil(to) * to
}

/// A stripe geometry or image shape that cannot be laid out.
///
/// Everything here is a fatal configuration defect: it is detected at
/// [`GeometryConfig::build()`] or [`StripeGeometry::layout()`] and never
/// recovered.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum GeometryError {
    /// A size field that must be nonzero is zero.
    Zero {
        /// Which field.
        what: &'static str,
    },
    /// Bytes per pixel is not 3.
    PixelDepth {
        /// Configured value.
        actual: usize,
    },
    /// The step size does not evenly divide the block size on one axis.
    StepBlockMismatch {
        /// `"width"` or `"height"`.
        axis: &'static str,
        /// Step size on that axis.
        step: usize,
        /// Block size on that axis.
        block: usize,
    },
    /// The block size does not evenly divide the patch size on one axis.
    BlockPatchMismatch {
        /// `"width"` or `"height"`.
        axis: &'static str,
        /// Block size on that axis.
        block: usize,
        /// Patch size on that axis.
        patch: usize,
    },
    /// The step does not cover exactly two pixels.
    StepArea {
        /// Configured step area in pixels.
        actual: usize,
    },
    /// The page size is not a multiple of the two-byte decode unit.
    PageSize {
        /// Configured page size.
        actual: usize,
    },
    /// The assignment table's shape does not match the step grid.
    TableShape {
        /// Table row count.
        rows: usize,
        /// Column count of the offending row.
        cols: usize,
        /// Expected step rows.
        step_rows: usize,
        /// Expected step columns.
        step_cols: usize,
    },
    /// The assignment table's cell count does not equal the channel count.
    ChannelCount {
        /// Table cell count.
        table: usize,
        /// Configured channel count.
        channels: usize,
    },
    /// The assignment table names a channel outside `0..channels`.
    ChannelRange {
        /// The out-of-range channel.
        channel: usize,
        /// Configured channel count.
        channels: usize,
    },
    /// The assignment table assigns the same channel to two steps.
    DuplicateChannel {
        /// The repeated channel.
        channel: usize,
    },
    /// The image has zero width or height.
    EmptyImage,
}

impl core::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Zero { what } => write!(f, "geometry {what} must be nonzero"),
            Self::PixelDepth { actual } => {
                write!(f, "bytes per pixel must be 3, got {actual}")
            }
            Self::StepBlockMismatch { axis, step, block } => {
                write!(
                    f,
                    "step {axis} {step} does not evenly divide block {axis} {block}"
                )
            }
            Self::BlockPatchMismatch { axis, block, patch } => {
                write!(
                    f,
                    "block {axis} {block} does not evenly divide patch {axis} {patch}"
                )
            }
            Self::StepArea { actual } => {
                write!(f, "step must cover exactly 2 pixels, got {actual}")
            }
            Self::PageSize { actual } => {
                write!(f, "page size {actual} is not a multiple of the 2-byte unit")
            }
            Self::TableShape {
                rows,
                cols,
                step_rows,
                step_cols,
            } => write!(
                f,
                "assignment table is {rows}x{cols}, step grid is {step_rows}x{step_cols}"
            ),
            Self::ChannelCount { table, channels } => {
                write!(
                    f,
                    "assignment table has {table} entries for {channels} channels"
                )
            }
            Self::ChannelRange { channel, channels } => {
                write!(
                    f,
                    "assignment table channel {channel} out of range 0..{channels}"
                )
            }
            Self::DuplicateChannel { channel } => {
                write!(f, "assignment table assigns channel {channel} twice")
            }
            Self::EmptyImage => write!(f, "image has zero width or height"),
        }
    }
}

impl core::error::Error for GeometryError {}
