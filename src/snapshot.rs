//! Cross-channel comparison units.
//!
//! A [`ChannelSnapshot`] is the N×2-byte view of all channel streams at one
//! lockstep byte offset (8×2 in the reference layout). It is a comparison
//! artifact, deliberately distinct from a tile-block: one tile-block spans
//! three snapshots (one per color plane), and one snapshot never crosses
//! blocks.

use alloc::vec;
use alloc::vec::Vec;

use imgref::ImgRef;
use rgb::Rgb;

use crate::address::AddressTranslator;
use crate::stream::ChannelStreams;

/// One two-byte pair per channel, all taken at the same channel byte offset.
///
/// Refillable in place so a verification scan allocates two of these up
/// front and none per unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pairs: Vec<[u8; 2]>,
}

impl ChannelSnapshot {
    /// A zeroed snapshot for the given channel count.
    pub fn new(channels: usize) -> Self {
        Self {
            pairs: vec![[0; 2]; channels],
        }
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.pairs.len()
    }

    /// The pair for one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn pair(&self, channel: usize) -> [u8; 2] {
        self.pairs[channel]
    }

    /// Fill with the expected bytes for every channel at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot's channel count does not match the
    /// translator's geometry, or on the translator's decode contract.
    pub fn fill_expected(
        &mut self,
        translator: &AddressTranslator<'_>,
        offset: usize,
        img: ImgRef<'_, Rgb<u8>>,
    ) {
        for (channel, pair) in self.pairs.iter_mut().enumerate() {
            *pair = translator.expected_pair(channel, offset, img);
        }
    }

    /// Fill with the observed bytes of every channel's page at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the streams have fewer channels or shorter pages than the
    /// snapshot expects.
    pub fn fill_observed(&mut self, streams: &ChannelStreams, page: usize, offset: usize) {
        for (channel, pair) in self.pairs.iter_mut().enumerate() {
            let bytes = streams.channel(channel).page(page);
            *pair = [bytes[offset], bytes[offset + 1]];
        }
    }

    /// The first differing position, as (channel, byte index within pair).
    pub fn first_diff(&self, other: &Self) -> Option<(usize, usize)> {
        for (channel, (a, b)) in self.pairs.iter().zip(&other.pairs).enumerate() {
            for k in 0..2 {
                if a[k] != b[k] {
                    return Some((channel, k));
                }
            }
        }
        None
    }
}
