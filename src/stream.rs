//! Channel page streams and their persisted text format.
//!
//! A channel stream is serialized as one text line per page, each line holding
//! exactly page-size decimal byte values separated by single spaces. Parsing
//! is strict about tokens but does not validate page counts or sizes; those
//! are structural properties of a whole verification run and are checked by
//! [`StreamVerifier`](crate::StreamVerifier).

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

/// One channel's ordered sequence of pages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageStream {
    pages: Vec<Vec<u8>>,
}

impl PageStream {
    /// Wrap raw pages. No validation; the verifier checks page sizes.
    pub fn from_pages(pages: Vec<Vec<u8>>) -> Self {
        Self { pages }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// One page's bytes.
    ///
    /// # Panics
    ///
    /// Panics if `page` is out of range.
    pub fn page(&self, page: usize) -> &[u8] {
        &self.pages[page]
    }

    /// All pages in order.
    pub fn pages(&self) -> &[Vec<u8>] {
        &self.pages
    }

    /// Parse the text format: one line per page, decimal bytes separated by
    /// single spaces. Trailing `\r` is tolerated; empty tokens (doubled or
    /// trailing spaces) and non-byte values are rejected.
    pub fn parse_text(text: &str) -> Result<Self, StreamError> {
        let mut pages = Vec::new();
        for (page, line) in text.lines().enumerate() {
            let mut bytes = Vec::new();
            for (index, token) in line.split(' ').enumerate() {
                let byte = token.parse::<u8>().map_err(|_| StreamError::InvalidByte {
                    page,
                    index,
                    token: token.to_owned(),
                })?;
                bytes.push(byte);
            }
            pages.push(bytes);
        }
        Ok(Self { pages })
    }

    /// Serialize to the text format, one newline-terminated line per page.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            for (index, byte) in page.iter().enumerate() {
                if index > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{byte}");
            }
            out.push('\n');
        }
        out
    }
}

/// The full set of channel streams for one placement run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelStreams {
    streams: Vec<PageStream>,
}

impl ChannelStreams {
    /// Wrap per-channel streams, in channel order.
    pub fn new(streams: Vec<PageStream>) -> Self {
        Self { streams }
    }

    /// Number of channel streams.
    pub fn channel_count(&self) -> usize {
        self.streams.len()
    }

    /// One channel's stream.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn channel(&self, channel: usize) -> &PageStream {
        &self.streams[channel]
    }

    /// All streams in channel order.
    pub fn channels(&self) -> &[PageStream] {
        &self.streams
    }

    /// Parse one text per channel, in channel order.
    pub fn parse_text(texts: &[&str]) -> Result<Self, StreamError> {
        let streams = texts
            .iter()
            .map(|text| PageStream::parse_text(text))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { streams })
    }

    /// Serialize every channel, in channel order.
    pub fn to_text(&self) -> Vec<String> {
        self.streams.iter().map(PageStream::to_text).collect()
    }
}

/// A malformed stream text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StreamError {
    /// A token is not a decimal byte value.
    InvalidByte {
        /// Line (page) index.
        page: usize,
        /// Token index within the line.
        index: usize,
        /// The offending token.
        token: String,
    },
}

impl core::fmt::Display for StreamError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidByte { page, index, token } => {
                write!(f, "page {page} token {index}: {token:?} is not a byte value")
            }
        }
    }
}

impl core::error::Error for StreamError {}
