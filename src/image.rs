use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, warn};

use crate::error::{Result, SimError};
use crate::memory::{Memory, MEMORY_MAX};

/// A program image: big-endian words, the first of which is the load address.
///
/// Only constructed by parsing, so the words always fit in memory from `orig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    orig: u16,
    words: Vec<u16>,
}

impl Image {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            return Err(SimError::ImageOddLength { len: bytes.len() });
        }

        let mut words = bytes
            .chunks_exact(2)
            .map(|word| u16::from_be_bytes([word[0], word[1]]));

        let orig = words.next().ok_or(SimError::ImageEmpty)?;
        let words: Vec<u16> = words.collect();

        if orig as usize + words.len() > MEMORY_MAX {
            return Err(SimError::ImageTooLarge {
                orig,
                words: words.len(),
            });
        }
        Ok(Self { orig, words })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => SimError::ImageMissing {
                path: path.to_path_buf(),
            },
            _ => SimError::ImageUnreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn orig(&self) -> u16 {
        self.orig
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Address of the last word, if any.
    pub fn end(&self) -> Option<u16> {
        let last = self.words.len().checked_sub(1)?;
        Some((self.orig as usize + last) as u16)
    }

    pub fn load_into(&self, mem: &mut Memory) -> Result<()> {
        mem.load(self.orig, &self.words)
    }
}

/// Populate memory from raw image bytes, returning the origin address.
pub fn load_bytes(bytes: &[u8], mem: &mut Memory) -> Result<u16> {
    let image = Image::from_bytes(bytes)?;
    image.load_into(mem)?;
    Ok(image.orig)
}

/// Populate memory from an image file.
pub fn load_file(path: &Path, mem: &mut Memory) -> Result<Image> {
    let image = Image::read(path)?;
    image.load_into(mem)?;
    debug!(
        "loaded `{}`: {} words at 0x{:04x}",
        path.display(),
        image.words.len(),
        image.orig
    );
    Ok(image)
}

/// Load every image in order. Later images overwrite earlier ones where they overlap.
pub fn load_all<P: AsRef<Path>>(paths: &[P], mem: &mut Memory) -> Result<Vec<Image>> {
    if paths.is_empty() {
        return Err(SimError::Usage);
    }

    let mut images: Vec<Image> = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let image = load_file(path, mem)?;
        if let Some(other) = images.iter().find(|other| overlaps(other, &image)) {
            warn!(
                "image `{}` overwrites memory loaded from origin 0x{:04x}",
                path.display(),
                other.orig
            );
        }
        images.push(image);
    }
    Ok(images)
}

fn overlaps(a: &Image, b: &Image) -> bool {
    match (a.end(), b.end()) {
        (Some(a_end), Some(b_end)) => a.orig <= b_end && b.orig <= a_end,
        _ => false,
    }
}
