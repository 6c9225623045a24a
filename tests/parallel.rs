//! Page-parallel verification.
//!
//! The scan's only sequential dependency is the shrinking valid-byte window,
//! which is a pure function of the page index. These tests recompute it per
//! page and scan pages in parallel, checking the verdict matches the
//! sequential verifier.

use rayon::prelude::*;
use zenstripe::{
    AddressTranslator, ChannelSnapshot, ChannelStreams, GeometryConfig, Img, ImgRef, ImgVec,
    PageStream, Rgb, StripeGeometry, StripePlacer, StreamVerifier, VerifyError,
};

fn gradient_image(width: usize, height: usize) -> ImgVec<Rgb<u8>> {
    let buf = (0..width * height)
        .map(|i| {
            let v = (i * 3) as u8;
            Rgb {
                r: v,
                g: v.wrapping_add(1),
                b: v.wrapping_add(2),
            }
        })
        .collect();
    Img::new(buf, width, height)
}

fn tamper(streams: &ChannelStreams, channel: usize, page: usize, offset: usize) -> ChannelStreams {
    let rebuilt = (0..streams.channel_count())
        .map(|c| {
            let stream = streams.channel(c);
            let mut pages: Vec<Vec<u8>> = stream.pages().to_vec();
            if c == channel {
                pages[page][offset] ^= 0x5A;
            }
            PageStream::from_pages(pages)
        })
        .collect();
    ChannelStreams::new(rebuilt)
}

/// Count mismatching units in one page, recomputing the window from the page
/// index alone.
fn mismatched_units_in_page(
    geometry: &StripeGeometry,
    translator: &AddressTranslator<'_>,
    streams: &ChannelStreams,
    img: ImgRef<'_, Rgb<u8>>,
    page: usize,
) -> usize {
    let consumed = page * geometry.page_size();
    let valid = geometry
        .page_size()
        .min(translator.layout().channel_bytes().saturating_sub(consumed));
    let mut expected = ChannelSnapshot::new(geometry.channels());
    let mut observed = ChannelSnapshot::new(geometry.channels());
    let mut bad = 0;
    let mut offset = 0;
    while offset < valid {
        expected.fill_expected(translator, consumed + offset, img);
        observed.fill_observed(streams, page, offset);
        if expected.first_diff(&observed).is_some() {
            bad += 1;
        }
        offset += geometry.unit_bytes();
    }
    bad
}

#[test]
fn page_parallel_scan_agrees_with_sequential() {
    let geometry = GeometryConfig::default()
        .with_patch_size(8, 8)
        .with_page_size(24)
        .build()
        .unwrap();
    let img = gradient_image(16, 16);
    let streams = StripePlacer::new(&geometry).place_rgb8(img.as_ref()).unwrap();
    let translator = AddressTranslator::new(&geometry, 16, 16).unwrap();
    let pages = streams.channel(0).page_count();
    assert_eq!(pages, 4);

    StreamVerifier::new(&geometry)
        .verify(img.as_ref(), &streams)
        .unwrap();
    let bad: usize = (0..pages)
        .into_par_iter()
        .map(|page| mismatched_units_in_page(&geometry, &translator, &streams, img.as_ref(), page))
        .sum();
    assert_eq!(bad, 0);
}

#[test]
fn page_parallel_scan_finds_corruption() {
    let geometry = GeometryConfig::default()
        .with_patch_size(8, 8)
        .with_page_size(24)
        .build()
        .unwrap();
    let img = gradient_image(16, 16);
    let streams = StripePlacer::new(&geometry).place_rgb8(img.as_ref()).unwrap();
    let translator = AddressTranslator::new(&geometry, 16, 16).unwrap();
    let bad_streams = tamper(&streams, 5, 2, 11);

    let err = StreamVerifier::new(&geometry)
        .verify(img.as_ref(), &bad_streams)
        .unwrap_err();
    match err {
        VerifyError::Mismatch(m) => {
            assert_eq!((m.page, m.offset, m.channel), (2, 11, 5));
        }
        other => panic!("expected a mismatch, got {other}"),
    }

    let per_page: Vec<usize> = (0..4)
        .into_par_iter()
        .map(|page| {
            mismatched_units_in_page(&geometry, &translator, &bad_streams, img.as_ref(), page)
        })
        .collect();
    assert_eq!(per_page, vec![0, 0, 1, 0]);
}
