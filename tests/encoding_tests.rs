// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for icon encoding

mod mocks;

use icon_capture::backends::host::{CaptureSurface, Dimensions};
use icon_capture::errors::EncodeError;
use icon_capture::pipelines::icon::{EncodingQuality, IconEncoder, IconFormat, center_crop};
use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};
use mocks::{RED, coordinate_surface};
use std::path::PathBuf;

/// Surface with a spread of colors and alpha values
fn translucent_surface() -> CaptureSurface {
    CaptureSurface::from_image(RgbaImage::from_fn(16, 12, |x, y| {
        Rgba([x as u8 * 16, y as u8 * 20, 200, ((x + y) * 10) as u8])
    }))
}

fn encode(format: IconFormat, surface: CaptureSurface) -> Vec<u8> {
    IconEncoder::new(format, EncodingQuality::High)
        .encode(surface, PathBuf::from("icon"))
        .unwrap()
        .data
}

#[test]
fn test_png_round_trip_is_lossless() {
    let surface = translucent_surface();
    let expected = surface.image().clone();

    let data = encode(IconFormat::Png, surface);

    let decoded = image::load_from_memory_with_format(&data, ImageFormat::Png).unwrap();
    assert_eq!(decoded.to_rgba8(), expected);
}

#[test]
fn test_tga_round_trip_is_lossless() {
    let surface = translucent_surface();
    let expected = surface.image().clone();

    let data = encode(IconFormat::Tga, surface);

    let decoded = image::load_from_memory_with_format(&data, ImageFormat::Tga).unwrap();
    assert_eq!(decoded.to_rgba8(), expected);
}

#[test]
fn test_jpeg_keeps_dimensions_and_is_opaque() {
    let data = encode(IconFormat::Jpeg, translucent_surface());

    let decoded = image::load_from_memory_with_format(&data, ImageFormat::Jpeg).unwrap();
    assert_eq!(decoded.dimensions(), (16, 12));
    assert!(!decoded.color().has_alpha());
    assert!(decoded.to_rgba8().pixels().all(|p| p[3] == 255));
}

#[test]
fn test_jpeg_quality_changes_output() {
    let low = IconEncoder::new(IconFormat::Jpeg, EncodingQuality::Low)
        .encode(coordinate_surface(64, 64), PathBuf::from("a.jpg"))
        .unwrap();
    let max = IconEncoder::new(IconFormat::Jpeg, EncodingQuality::Maximum)
        .encode(coordinate_surface(64, 64), PathBuf::from("a.jpg"))
        .unwrap();
    assert!(low.data.len() < max.data.len());
}

#[test]
fn test_all_red_capture_to_png() {
    let frame = CaptureSurface::filled(512, 512, RED);
    let icon = center_crop(&frame, Dimensions::new(256, 256)).unwrap();

    let encoded = IconEncoder::new(IconFormat::Png, EncodingQuality::default())
        .encode(icon, PathBuf::from("/out/Advanced Icon Red.png"))
        .unwrap();

    assert_eq!(encoded.dimensions, Dimensions::new(256, 256));
    assert_eq!(encoded.destination, PathBuf::from("/out/Advanced Icon Red.png"));
    let decoded = image::load_from_memory(&encoded.data).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (256, 256));
    assert!(decoded.pixels().all(|p| *p == RED));
}

#[test]
fn test_empty_surface_rejected() {
    let result = IconEncoder::new(IconFormat::Png, EncodingQuality::High)
        .encode(CaptureSurface::filled(0, 0, RED), PathBuf::from("x.png"));
    assert_eq!(result.unwrap_err(), EncodeError::EmptySurface);
}

#[tokio::test]
async fn test_encode_async_matches_sync() {
    let encoder = IconEncoder::new(IconFormat::Png, EncodingQuality::High);
    let sync = encoder
        .encode(coordinate_surface(20, 20), PathBuf::from("a.png"))
        .unwrap();
    let async_ = encoder
        .encode_async(coordinate_surface(20, 20), PathBuf::from("a.png"))
        .await
        .unwrap();

    assert_eq!(sync.data, async_.data);
    assert_eq!(async_.format, IconFormat::Png);
}
