//! Hierarchical address translation.
//!
//! [`AddressTranslator`] inverts the placement: given a channel index and a
//! byte offset into that channel's stream, it recovers the pixel row, column,
//! and color plane the byte must have come from. This is the law both the
//! placer and the verifier satisfy; a single off-by-one here silently corrupts
//! the placement, so the walk is split into per-level divisions whose divisors
//! all come from [`ImageLayout`].

use imgref::ImgRef;
use rgb::Rgb;

use crate::block::TileBlock;
use crate::geometry::{GeometryError, ImageLayout, StripeGeometry};

/// A decoded pixel position: row, column, and color plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelAddress {
    /// Pixel row (may lie in the padding beyond the true image).
    pub row: usize,
    /// Pixel column (may lie in the padding beyond the true image).
    pub col: usize,
    /// Color plane: 0 = r, 1 = g, 2 = b.
    pub plane: usize,
}

/// Decodes per-channel byte offsets back to pixel addresses.
///
/// Pure and stateless after construction: `decode` and `expected_pair` may be
/// called concurrently from any number of threads.
///
/// Offsets are absolute positions in a channel's logical byte stream,
/// `page_index * page_size + intra_page_offset`; they mean the same thing for
/// every channel because all channels advance in lockstep through the tiling
/// traversal.
pub struct AddressTranslator<'a> {
    geo: &'a StripeGeometry,
    layout: ImageLayout,
}

impl<'a> AddressTranslator<'a> {
    /// Build a translator for an image of the given dimensions.
    pub fn new(
        geo: &'a StripeGeometry,
        width: usize,
        height: usize,
    ) -> Result<Self, GeometryError> {
        let layout = geo.layout(width, height)?;
        Ok(Self { geo, layout })
    }

    /// The per-image layout the translator walks.
    pub fn layout(&self) -> &ImageLayout {
        &self.layout
    }

    /// Decode a channel byte offset to the unit's first pixel address.
    ///
    /// The two bytes of the unit at `offset` hold one color plane of one
    /// step; byte `k` addresses the step's `k`-th pixel in row-major order
    /// (see [`decode_pair()`](Self::decode_pair) for both).
    ///
    /// # Panics
    ///
    /// Panics on contract violations: `channel` out of range, `offset` not
    /// aligned to the two-byte unit, or `offset` at or past the channel's
    /// valid byte budget. These indicate a bug in the caller's traversal,
    /// not bad data.
    pub fn decode(&self, channel: usize, offset: usize) -> PixelAddress {
        self.locate(channel, offset).1[0]
    }

    /// Decode a channel byte offset to both pixel addresses of its unit.
    ///
    /// # Panics
    ///
    /// Same contract as [`decode()`](Self::decode).
    pub fn decode_pair(&self, channel: usize, offset: usize) -> [PixelAddress; 2] {
        self.locate(channel, offset).1
    }

    /// The two bytes the placement engine must have written for this unit.
    ///
    /// Real pixels are read from `img`; don't-care positions (padding beyond
    /// the true image) yield the configured pad byte. The image is never
    /// indexed out of bounds.
    ///
    /// # Panics
    ///
    /// Same contract as [`decode()`](Self::decode), plus `img` must have the
    /// dimensions the translator was built with.
    pub fn expected_pair(
        &self,
        channel: usize,
        offset: usize,
        img: ImgRef<'_, Rgb<u8>>,
    ) -> [u8; 2] {
        assert_eq!(
            (img.width(), img.height()),
            (self.layout.width(), self.layout.height()),
            "image does not match translator dimensions"
        );
        let (block, pair) = self.locate(channel, offset);
        let mut bytes = [self.geo.pad_byte(); 2];
        for (byte, addr) in bytes.iter_mut().zip(pair) {
            if block.contains(addr.row, addr.col) {
                let px = img.buf()[addr.row * img.stride() + addr.col];
                *byte = match addr.plane {
                    0 => px.r,
                    1 => px.g,
                    _ => px.b,
                };
            }
        }
        bytes
    }

    /// Walk the traversal hierarchy down to the unit's tile-block and pixels.
    fn locate(&self, channel: usize, offset: usize) -> (TileBlock, [PixelAddress; 2]) {
        let geo = self.geo;
        let layout = &self.layout;
        assert!(
            channel < geo.channels(),
            "channel {channel} out of range 0..{}",
            geo.channels()
        );
        assert!(
            offset % geo.unit_bytes() == 0,
            "offset {offset} not aligned to the {}-byte unit",
            geo.unit_bytes()
        );
        assert!(
            offset < layout.channel_bytes(),
            "offset {offset} past channel budget {}",
            layout.channel_bytes()
        );

        // Which tile-block along the channel's stream, and where the whole
        // block starts in the padded image's byte order.
        let block_index = offset / geo.channel_share();
        let image_byte = block_index * geo.block_bytes();

        // patch row -> patch -> block row -> block, each divisor picked for
        // the current (full or trailing-partial) row.
        let (patch_row, in_patch_row) = split(image_byte, layout.patch_row_span());
        let (patch_col, in_patch) = split(in_patch_row, layout.patch_span(patch_row));
        let (block_row, in_block_row) = split(in_patch, layout.block_row_span(patch_col));
        let block_col = in_block_row / geo.block_bytes();

        let left = patch_col * geo.patch_width() + block_col * geo.block_width();
        let top = patch_row * geo.patch_height() + block_row * geo.block_height();
        let block = layout.block_at(left, top);

        // Units cycle through the color planes; the channel's step position
        // fixes which sub-rectangle of the block this unit covers.
        let plane = (offset / geo.unit_bytes()) % geo.bytes_per_pixel();
        let step = geo.assignment().step_of(channel);
        let row0 = top + step.row * geo.step_height();
        let col0 = left + step.col * geo.step_width();

        let mut pair = [PixelAddress {
            row: row0,
            col: col0,
            plane,
        }; 2];
        for (k, addr) in pair.iter_mut().enumerate() {
            addr.row = row0 + k / geo.step_width();
            addr.col = col0 + k % geo.step_width();
        }
        (block, pair)
    }
}

/// One locate-within-level division: (index within level, remaining offset).
fn split(offset: usize, span: usize) -> (usize, usize) {
    (offset / span, offset % span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use crate::geometry::GeometryConfig;
    use imgref::{Img, ImgVec};

    /// Pixel (row, col) plane p holds `row*16 + col*4 + p`; unique per
    /// position for dimensions up to 4x4.
    fn scenario_image(width: usize, height: usize) -> ImgVec<Rgb<u8>> {
        let mut buf = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                let v = (row * 16 + col * 4) as u8;
                buf.push(Rgb {
                    r: v,
                    g: v + 1,
                    b: v + 2,
                });
            }
        }
        Img::new(buf, width, height)
    }

    #[test]
    fn split_is_divmod() {
        assert_eq!(split(0, 48), (0, 0));
        assert_eq!(split(47, 48), (0, 47));
        assert_eq!(split(48, 48), (1, 0));
        assert_eq!(split(145, 48), (3, 1));
    }

    #[test]
    fn concrete_four_by_four_scenario() {
        let geo = GeometryConfig::default().build().unwrap();
        let img = scenario_image(4, 4);
        let tr = AddressTranslator::new(&geo, 4, 4).unwrap();

        // channel 0 serves step (0,0): plane cycle over pixels (0,0) and (0,1)
        assert_eq!(tr.expected_pair(0, 0, img.as_ref()), [0, 4]);
        assert_eq!(tr.expected_pair(0, 2, img.as_ref()), [1, 5]);
        assert_eq!(tr.expected_pair(0, 4, img.as_ref()), [2, 6]);

        // channel 4 serves step (0,1): pixels (0,2) and (0,3)
        assert_eq!(tr.expected_pair(4, 0, img.as_ref()), [8, 12]);

        // channel 1 serves step (1,0): row 1
        assert_eq!(tr.expected_pair(1, 0, img.as_ref()), [16, 20]);
    }

    #[test]
    fn decode_addresses_for_reference_table() {
        let geo = GeometryConfig::default().build().unwrap();
        let tr = AddressTranslator::new(&geo, 4, 4).unwrap();

        assert_eq!(
            tr.decode(0, 0),
            PixelAddress {
                row: 0,
                col: 0,
                plane: 0
            }
        );
        assert_eq!(
            tr.decode(0, 2),
            PixelAddress {
                row: 0,
                col: 0,
                plane: 1
            }
        );
        assert_eq!(
            tr.decode(7, 4),
            PixelAddress {
                row: 3,
                col: 2,
                plane: 2
            }
        );
        assert_eq!(
            tr.decode_pair(4, 0),
            [
                PixelAddress {
                    row: 0,
                    col: 2,
                    plane: 0
                },
                PixelAddress {
                    row: 0,
                    col: 3,
                    plane: 0
                }
            ]
        );
    }

    #[test]
    fn walk_crosses_blocks_and_block_rows() {
        let geo = GeometryConfig::default()
            .with_patch_size(8, 8)
            .with_page_size(24)
            .build()
            .unwrap();
        let tr = AddressTranslator::new(&geo, 8, 8).unwrap();

        // share 6 bytes per block; blocks traverse row-major: (0,0) (0,4) (4,0) (4,4)
        assert_eq!(tr.decode(0, 0), PixelAddress { row: 0, col: 0, plane: 0 });
        assert_eq!(tr.decode(0, 6), PixelAddress { row: 0, col: 4, plane: 0 });
        assert_eq!(tr.decode(0, 12), PixelAddress { row: 4, col: 0, plane: 0 });
        assert_eq!(tr.decode(0, 18), PixelAddress { row: 4, col: 4, plane: 0 });
    }

    #[test]
    fn walk_crosses_patches() {
        let geo = GeometryConfig::default()
            .with_patch_size(8, 8)
            .with_page_size(96)
            .build()
            .unwrap();
        // two patch columns, two patch rows, 16x16 image, no padding
        let tr = AddressTranslator::new(&geo, 16, 16).unwrap();
        let share = geo.channel_share();

        // 4 blocks per patch; block 4 starts the second patch
        assert_eq!(tr.decode(0, 4 * share), PixelAddress { row: 0, col: 8, plane: 0 });
        // block 8 starts the second patch row
        assert_eq!(tr.decode(0, 8 * share), PixelAddress { row: 8, col: 0, plane: 0 });
    }

    #[test]
    fn partial_patch_row_uses_true_row_size() {
        let geo = GeometryConfig::default()
            .with_patch_size(8, 8)
            .with_page_size(96)
            .build()
            .unwrap();
        // 12x12: full patch at (0,0), 4-wide partial column, 4-tall partial row
        let tr = AddressTranslator::new(&geo, 12, 12).unwrap();
        let share = geo.channel_share();

        // patch (0,0): 2x2 blocks -> blocks 0..4
        // patch (0,1): 1x2 blocks -> blocks 4..6
        assert_eq!(tr.decode(0, 4 * share), PixelAddress { row: 0, col: 8, plane: 0 });
        assert_eq!(tr.decode(0, 5 * share), PixelAddress { row: 4, col: 8, plane: 0 });
        // patch (1,0): 2x1 blocks -> blocks 6..8
        assert_eq!(tr.decode(0, 6 * share), PixelAddress { row: 8, col: 0, plane: 0 });
        assert_eq!(tr.decode(0, 7 * share), PixelAddress { row: 8, col: 4, plane: 0 });
        // patch (1,1): 1x1 block -> block 8
        assert_eq!(tr.decode(0, 8 * share), PixelAddress { row: 8, col: 8, plane: 0 });
    }

    #[test]
    fn width_three_asymmetry_scenario() {
        // 3-pixel-wide trailing column inside a 4-wide block: channels on
        // step column 0 keep both pixels, channels on step column 1 keep
        // only their first.
        let geo = GeometryConfig::default().with_pad_byte(0xFF).build().unwrap();
        let img = scenario_image(3, 4);
        let tr = AddressTranslator::new(&geo, 3, 4).unwrap();

        assert_eq!(tr.expected_pair(0, 0, img.as_ref()), [0, 4]);
        assert_eq!(tr.expected_pair(4, 0, img.as_ref()), [8, 0xFF]);
        assert_eq!(tr.expected_pair(5, 0, img.as_ref()), [24, 0xFF]);
    }

    #[test]
    fn edge_validity_matches_hardware_branching() {
        // Enumerate every partial width/height of a single block and compare
        // against the per-channel branching of the target striping layout:
        //   width 1: only channels 0-3, first byte
        //   width 2: channels 0-3, both bytes
        //   width 3: channels 0-3 both bytes, channels 4-7 first byte only
        //   width 4: everything
        // Rows are valid iff the channel's step row is below the valid height.
        for vw in 1..=4usize {
            for vh in 1..=4usize {
                let geo = GeometryConfig::default().with_pad_byte(0xFF).build().unwrap();
                let img = scenario_image(vw, vh);
                let tr = AddressTranslator::new(&geo, vw, vh).unwrap();
                for channel in 0..8usize {
                    let srow = channel % 4;
                    let scol = channel / 4;
                    for offset in (0..6).step_by(2) {
                        let plane = offset / 2;
                        let pair = tr.expected_pair(channel, offset, img.as_ref());
                        for (k, &byte) in pair.iter().enumerate() {
                            let row_ok = srow < vh;
                            let col_ok = match vw {
                                1 => scol == 0 && k == 0,
                                2 => scol == 0,
                                3 => scol == 0 || k == 0,
                                _ => true,
                            };
                            let col = scol * 2 + k;
                            let want = if row_ok && col_ok {
                                (srow * 16 + col * 4 + plane) as u8
                            } else {
                                0xFF
                            };
                            assert_eq!(
                                byte, want,
                                "vw={vw} vh={vh} channel={channel} offset={offset} byte={k}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn padding_never_reads_the_image() {
        // 1x1 image: everything except channel 0's first byte is padding
        let geo = GeometryConfig::default().with_pad_byte(0xAB).build().unwrap();
        let img = scenario_image(1, 1);
        let tr = AddressTranslator::new(&geo, 1, 1).unwrap();

        for channel in 0..8 {
            for offset in (0..6).step_by(2) {
                let pair = tr.expected_pair(channel, offset, img.as_ref());
                if channel == 0 {
                    assert_eq!(pair, [(offset / 2) as u8, 0xAB]);
                } else {
                    assert_eq!(pair, [0xAB, 0xAB]);
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "not aligned")]
    fn odd_offset_is_a_contract_violation() {
        let geo = GeometryConfig::default().build().unwrap();
        let tr = AddressTranslator::new(&geo, 4, 4).unwrap();
        tr.decode(0, 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn channel_out_of_range_is_a_contract_violation() {
        let geo = GeometryConfig::default().build().unwrap();
        let tr = AddressTranslator::new(&geo, 4, 4).unwrap();
        tr.decode(8, 0);
    }

    #[test]
    #[should_panic(expected = "past channel budget")]
    fn offset_past_budget_is_a_contract_violation() {
        let geo = GeometryConfig::default().build().unwrap();
        let tr = AddressTranslator::new(&geo, 4, 4).unwrap();
        tr.decode(0, 6);
    }
}
