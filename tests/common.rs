#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Encodes a small gradient in `format`.
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// Two real images, one corrupt `.jpg` and one text file.
pub fn create_mixed_batch(dir: &Path) -> Vec<PathBuf> {
    let files = vec![
        (dir.join("a.jpg"), encoded_image(64, 48, ImageFormat::Jpeg)),
        (dir.join("b.png"), encoded_image(32, 32, ImageFormat::Png)),
        (dir.join("broken.jpg"), b"fake jpg data".to_vec()),
        (dir.join("notes.txt"), b"not an image".to_vec()),
    ];

    files
        .into_iter()
        .map(|(path, bytes)| {
            fs::write(&path, bytes).unwrap();
            path
        })
        .collect()
}

/// Files with known content for rename tests, returned with that content.
pub fn create_rename_batch(dir: &Path, names: &[&str]) -> Vec<(String, Vec<u8>)> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let content = format!("content of file {} ({})", index, name).into_bytes();
            fs::write(dir.join(name), &content).unwrap();
            (name.to_string(), content)
        })
        .collect()
}

pub fn create_nested_directory_structure(dir: &Path) -> PathBuf {
    let subdir = dir.join("subdir");
    fs::create_dir(&subdir).unwrap();
    fs::write(subdir.join("nested.jpg"), encoded_image(16, 16, ImageFormat::Jpeg)).unwrap();
    fs::write(subdir.join("nested.txt"), b"nested text").unwrap();
    subdir
}

/// Entry names and contents of a zip file, in archive order.
pub fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            (entry.name().to_string(), bytes)
        })
        .collect()
}
