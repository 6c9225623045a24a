//! Forward placement engine.
//!
//! [`StripePlacer`] stripes an RGB8 image into per-channel page streams. The
//! traversal is the same hierarchy the address translator walks in reverse:
//! patch rows, patches, block rows, blocks, all row-major; within a block,
//! each step's bytes go to its assigned channel, plane-major (both bytes of
//! the red plane, then green, then blue).

use alloc::vec::Vec;

use imgref::ImgRef;
use rgb::Rgb;

use crate::assign::StepPos;
use crate::geometry::{GeometryError, ImageLayout, StripeGeometry};
use crate::stream::{ChannelStreams, PageStream};

/// Stripes images into channel page streams for one geometry.
///
/// Every tile-block sends an equal share of its bytes to every channel, so
/// all produced streams have the same page count by construction. Pixels in
/// the padding beyond the true image, and the tail of the final page, are
/// filled with the geometry's pad byte.
pub struct StripePlacer<'a> {
    geo: &'a StripeGeometry,
}

impl<'a> StripePlacer<'a> {
    /// A placer for the given geometry.
    pub fn new(geo: &'a StripeGeometry) -> Self {
        Self { geo }
    }

    /// Place an RGB8 image into one page stream per channel.
    pub fn place_rgb8(&self, img: ImgRef<'_, Rgb<u8>>) -> Result<ChannelStreams, GeometryError> {
        let geo = self.geo;
        let layout = geo.layout(img.width(), img.height())?;
        let total = layout.pages_needed() * geo.page_size();
        let mut lanes: Vec<Vec<u8>> = (0..geo.channels())
            .map(|_| Vec::with_capacity(total))
            .collect();

        for patch_row in 0..layout.patch_rows() {
            let patch_top = patch_row * geo.patch_height();
            let block_rows = layout.patch_height_at(patch_row) / geo.block_height();
            for patch_col in 0..layout.patch_cols() {
                let patch_left = patch_col * geo.patch_width();
                let block_cols = layout.patch_width_at(patch_col) / geo.block_width();
                for block_row in 0..block_rows {
                    let top = patch_top + block_row * geo.block_height();
                    for block_col in 0..block_cols {
                        let left = patch_left + block_col * geo.block_width();
                        self.place_block(&layout, img, left, top, &mut lanes);
                    }
                }
            }
        }

        let streams = lanes
            .into_iter()
            .map(|mut lane| {
                debug_assert_eq!(lane.len(), layout.channel_bytes());
                lane.resize(total, geo.pad_byte());
                PageStream::from_pages(lane.chunks(geo.page_size()).map(<[u8]>::to_vec).collect())
            })
            .collect();
        Ok(ChannelStreams::new(streams))
    }

    /// Append one block's per-channel shares, plane-major within each step.
    fn place_block(
        &self,
        layout: &ImageLayout,
        img: ImgRef<'_, Rgb<u8>>,
        left: usize,
        top: usize,
        lanes: &mut [Vec<u8>],
    ) {
        let geo = self.geo;
        let block = layout.block_at(left, top);
        for step_row in 0..geo.step_rows() {
            for step_col in 0..geo.step_cols() {
                let channel = geo.assignment().channel_at(StepPos {
                    row: step_row,
                    col: step_col,
                });
                let lane = &mut lanes[channel];
                let row0 = top + step_row * geo.step_height();
                let col0 = left + step_col * geo.step_width();
                for plane in 0..geo.bytes_per_pixel() {
                    for k in 0..geo.unit_bytes() {
                        let row = row0 + k / geo.step_width();
                        let col = col0 + k % geo.step_width();
                        let byte = if block.contains(row, col) {
                            let px = img.buf()[row * img.stride() + col];
                            match plane {
                                0 => px.r,
                                1 => px.g,
                                _ => px.b,
                            }
                        } else {
                            geo.pad_byte()
                        };
                        lane.push(byte);
                    }
                }
            }
        }
    }
}
