//! Builders for test archives and images.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

/// A small valid PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 40, 200]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// A small valid JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 180, 90]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    bytes
}

pub fn manifest_json() -> Vec<u8> {
    br#"{
        "name": "Moon Courier",
        "summary": "A courier on the moon",
        "description": "Weekly sci-fi series",
        "sourceCountry": "KR",
        "publishDate": "2025-11-02"
    }"#
    .to_vec()
}

/// Zips the given (path, content) pairs.
pub fn make_zip(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in files {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A complete, valid upload: manifest, PNG banner, and `pages` page
/// images per episode number.
pub fn archive_with_episodes(episodes: &[(u32, usize)]) -> Vec<u8> {
    let mut files: Vec<(String, Vec<u8>)> = vec![
        ("manifest.json".to_string(), manifest_json()),
        ("banner.png".to_string(), png_bytes(20, 10)),
    ];
    for (number, pages) in episodes {
        for page in 1..=*pages {
            files.push((
                format!("episodes/episode {}/{:03}.png", number, page),
                png_bytes(8, 12),
            ));
        }
    }
    let refs: Vec<(&str, Vec<u8>)> = files
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.clone()))
        .collect();
    make_zip(&refs)
}
