//! Bit-exact placement codec for striping RGB images across page-structured
//! flash channels.
//!
//! An image is tiled into patches, patches into 4×4 tile-blocks, and blocks
//! into steps; each step's bytes go to one of N channels via a round-robin
//! table, so every channel receives an equal, interleaved share of every
//! block and a single cross-channel page read reconstructs a spatially local
//! neighborhood. This crate is the address-translation law of that layout
//! and the machinery around it:
//!
//! - [`GeometryConfig`] / [`StripeGeometry`] — tiling configuration, validated once
//! - [`ChannelAssignmentTable`] — the step-grid to channel bijection
//! - [`AddressTranslator`] — (channel, byte offset) → (row, col, plane) decoding
//! - [`StripePlacer`] — the forward engine writing per-channel page streams
//! - [`StreamVerifier`] — lockstep verification of streams against an image
//! - [`PageStream`] / [`ChannelStreams`] — the persisted text page format
//!
//! Decoding is pure: once a [`StripeGeometry`] is built, translation needs no
//! synchronization and verification can be parallelized per page.
//!
//! # Example
//!
//! ```
//! use zenstripe::{GeometryConfig, Img, Rgb, StripePlacer, StreamVerifier};
//!
//! let geometry = GeometryConfig::default().build()?;
//!
//! // 4x4 image, one tile-block, no padding
//! let pixels: Vec<Rgb<u8>> = (0..16u8)
//!     .map(|i| {
//!         let v = (i / 4) * 16 + (i % 4) * 4;
//!         Rgb { r: v, g: v + 1, b: v + 2 }
//!     })
//!     .collect();
//! let img = Img::new(pixels, 4, 4);
//!
//! let streams = StripePlacer::new(&geometry).place_rgb8(img.as_ref())?;
//! // channel 0 carries the top-left step: red, green, blue of pixels (0,0),(0,1)
//! assert_eq!(&streams.channel(0).page(0)[..6], &[0, 4, 1, 5, 2, 6]);
//!
//! let report = StreamVerifier::new(&geometry).verify(img.as_ref(), &streams)?;
//! assert_eq!(report.channels, 8);
//! # Ok::<(), Box<dyn core::error::Error>>(())
//! ```

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod address;
mod assign;
mod block;
mod geometry;
mod place;
mod snapshot;
mod stream;
mod verify;

pub use address::{AddressTranslator, PixelAddress};
pub use assign::{ChannelAssignmentTable, StepPos};
pub use block::TileBlock;
pub use geometry::{GeometryConfig, GeometryError, ImageLayout, PaddedExtent, StripeGeometry};
pub use place::StripePlacer;
pub use snapshot::ChannelSnapshot;
pub use stream::{ChannelStreams, PageStream, StreamError};
pub use verify::{ByteMismatch, StreamVerifier, VerifyError, VerifyReport};

// Re-exports for callers.
pub use enough::{Stop, Unstoppable};
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb;
pub use rgb::Rgb;
