//! Lockstep stream verification.
//!
//! [`StreamVerifier`] scans all channel page streams in lockstep against a
//! source image, comparing every observed two-byte unit with the address
//! translator's expected value. Structural defects (wrong channel count,
//! unequal page counts, wrong page sizes) abort before or during the scan;
//! content mismatches fail fast by default, with a collecting mode for
//! richer diagnostics.

use alloc::vec::Vec;

use enough::Stop;
use imgref::ImgRef;
use rgb::Rgb;

use crate::address::AddressTranslator;
use crate::geometry::{GeometryError, StripeGeometry};
use crate::snapshot::ChannelSnapshot;
use crate::stream::ChannelStreams;

/// Verifies placed channel streams against a source image.
///
/// The scan proceeds page by page; within each page only the window still
/// covered by the per-channel byte budget is compared, so trailing filler in
/// the last page (and whole trailing filler pages) is never inspected.
///
/// # Example
///
/// ```
/// use zenstripe::{GeometryConfig, Img, Rgb, StripePlacer, StreamVerifier};
///
/// let geometry = GeometryConfig::default().build()?;
/// let img = Img::new(vec![Rgb { r: 1u8, g: 2, b: 3 }; 16], 4, 4);
/// let streams = StripePlacer::new(&geometry).place_rgb8(img.as_ref())?;
/// let report = StreamVerifier::new(&geometry).verify(img.as_ref(), &streams)?;
/// assert_eq!(report.pages, 1);
/// # Ok::<(), Box<dyn core::error::Error>>(())
/// ```
pub struct StreamVerifier<'a> {
    geo: &'a StripeGeometry,
    stop: Option<&'a dyn Stop>,
    max_mismatches: usize,
}

impl<'a> StreamVerifier<'a> {
    /// A verifier for the given geometry.
    pub fn new(geo: &'a StripeGeometry) -> Self {
        Self {
            geo,
            stop: None,
            max_mismatches: 64,
        }
    }

    /// Set a cooperative cancellation token, checked once per page.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Cap the number of mismatches [`collect_mismatches()`](Self::collect_mismatches)
    /// gathers before giving up (default 64).
    pub fn with_max_mismatches(mut self, max: usize) -> Self {
        self.max_mismatches = max;
        self
    }

    /// Verify every valid byte of every stream, failing on the first mismatch.
    pub fn verify(
        &self,
        img: ImgRef<'_, Rgb<u8>>,
        streams: &ChannelStreams,
    ) -> Result<VerifyReport, VerifyError> {
        let (report, _) = self.scan(img, streams, true)?;
        Ok(report)
    }

    /// Like [`verify()`](Self::verify), but collect content mismatches (up
    /// to the configured cap) instead of aborting on the first. Structural
    /// errors still abort. An empty vec means the streams verified clean.
    pub fn collect_mismatches(
        &self,
        img: ImgRef<'_, Rgb<u8>>,
        streams: &ChannelStreams,
    ) -> Result<Vec<ByteMismatch>, VerifyError> {
        let (_, mismatches) = self.scan(img, streams, false)?;
        Ok(mismatches)
    }

    fn scan(
        &self,
        img: ImgRef<'_, Rgb<u8>>,
        streams: &ChannelStreams,
        fail_fast: bool,
    ) -> Result<(VerifyReport, Vec<ByteMismatch>), VerifyError> {
        let geo = self.geo;
        let channels = geo.channels();
        if streams.channel_count() != channels {
            return Err(VerifyError::ChannelCount {
                expected: channels,
                actual: streams.channel_count(),
            });
        }

        // Page counts must agree across channels before any content is read.
        let pages = streams.channel(0).page_count();
        for channel in 1..channels {
            let actual = streams.channel(channel).page_count();
            if actual != pages {
                return Err(VerifyError::PageCount {
                    channel,
                    pages: actual,
                    expected: pages,
                });
            }
        }

        let translator = AddressTranslator::new(geo, img.width(), img.height())?;
        let budget = translator.layout().channel_bytes();
        let needed = translator.layout().pages_needed();
        if pages < needed {
            return Err(VerifyError::ShortStream { pages, needed });
        }

        let page_size = geo.page_size();
        let unit = geo.unit_bytes();
        let mut expected = ChannelSnapshot::new(channels);
        let mut observed = ChannelSnapshot::new(channels);
        let mut mismatches = Vec::new();
        let mut units = 0usize;

        'pages: for page in 0..pages {
            if let Some(stop) = self.stop
                && stop.check().is_err()
            {
                return Err(VerifyError::Stopped);
            }
            for channel in 0..channels {
                let len = streams.channel(channel).page(page).len();
                if len != page_size {
                    return Err(VerifyError::PageSize {
                        channel,
                        page,
                        len,
                        expected: page_size,
                    });
                }
            }

            // The valid window shrinks by one page's worth per page; it is a
            // pure function of the page index, never of scan order.
            let consumed = page * page_size;
            let valid = page_size.min(budget.saturating_sub(consumed));
            let mut offset = 0;
            while offset < valid {
                expected.fill_expected(&translator, consumed + offset, img);
                observed.fill_observed(streams, page, offset);
                if let Some((channel, k)) = expected.first_diff(&observed) {
                    let addr = translator.decode_pair(channel, consumed + offset)[k];
                    let mismatch = ByteMismatch {
                        page,
                        offset: offset + k,
                        channel,
                        row: addr.row,
                        col: addr.col,
                        plane: addr.plane,
                        expected: expected.pair(channel)[k],
                        actual: observed.pair(channel)[k],
                    };
                    if fail_fast {
                        return Err(VerifyError::Mismatch(mismatch));
                    }
                    mismatches.push(mismatch);
                    if mismatches.len() >= self.max_mismatches {
                        break 'pages;
                    }
                }
                units += 1;
                offset += unit;
            }
        }

        let report = VerifyReport {
            channels,
            pages,
            units,
            bytes: units * unit * channels,
        };
        Ok((report, mismatches))
    }
}

/// Summary of a clean verification run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    /// Channels scanned.
    pub channels: usize,
    /// Pages scanned per channel.
    pub pages: usize,
    /// Two-byte units compared per channel.
    pub units: usize,
    /// Total bytes compared across all channels.
    pub bytes: usize,
}

/// One byte that differs from the placement law, with full location context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteMismatch {
    /// Page index.
    pub page: usize,
    /// Byte offset within the page.
    pub offset: usize,
    /// Channel the byte belongs to.
    pub channel: usize,
    /// Decoded pixel row.
    pub row: usize,
    /// Decoded pixel column.
    pub col: usize,
    /// Decoded color plane.
    pub plane: usize,
    /// The byte the placement law requires.
    pub expected: u8,
    /// The byte the stream holds.
    pub actual: u8,
}

impl core::fmt::Display for ByteMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "page {}+{}: channel {} expected {} got {} at pixel ({},{}) plane {}",
            self.page,
            self.offset,
            self.channel,
            self.expected,
            self.actual,
            self.row,
            self.col,
            self.plane
        )
    }
}

/// A verification failure.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum VerifyError {
    /// The geometry rejected the image shape.
    Geometry(GeometryError),
    /// The stream set does not have one stream per channel.
    ChannelCount {
        /// Configured channel count.
        expected: usize,
        /// Streams supplied.
        actual: usize,
    },
    /// A channel's page count differs from channel 0's.
    PageCount {
        /// The disagreeing channel.
        channel: usize,
        /// Its page count.
        pages: usize,
        /// Channel 0's page count.
        expected: usize,
    },
    /// The streams end before the per-channel byte budget is covered.
    ShortStream {
        /// Pages present.
        pages: usize,
        /// Pages required by the image's layout.
        needed: usize,
    },
    /// A page is not exactly the configured page size.
    PageSize {
        /// Channel of the malformed page.
        channel: usize,
        /// Page index.
        page: usize,
        /// Actual length in bytes.
        len: usize,
        /// Configured page size.
        expected: usize,
    },
    /// A byte differs from the placement law.
    Mismatch(ByteMismatch),
    /// The stop token requested cancellation.
    Stopped,
}

impl From<GeometryError> for VerifyError {
    fn from(err: GeometryError) -> Self {
        Self::Geometry(err)
    }
}

impl core::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Geometry(err) => write!(f, "{err}"),
            Self::ChannelCount { expected, actual } => {
                write!(f, "expected {expected} channel streams, got {actual}")
            }
            Self::PageCount {
                channel,
                pages,
                expected,
            } => write!(f, "channel {channel} has {pages} pages, expected {expected}"),
            Self::ShortStream { pages, needed } => {
                write!(f, "streams have {pages} pages but {needed} are needed")
            }
            Self::PageSize {
                channel,
                page,
                len,
                expected,
            } => write!(
                f,
                "channel {channel} page {page} is {len} bytes, expected {expected}"
            ),
            Self::Mismatch(mismatch) => write!(f, "{mismatch}"),
            Self::Stopped => write!(f, "verification stopped"),
        }
    }
}

impl core::error::Error for VerifyError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Geometry(err) => Some(err),
            _ => None,
        }
    }
}
