//! Cartridge image formats: headerless raw dumps and CART files.
//!
//! A file whose length is a whole number of kilobytes is a raw dump and
//! its type is guessed from the size. Anything else must carry the
//! 16-byte CART header:
//!
//! ```text
//! 0  "CART"
//! 4  type      (big-endian i32)
//! 8  checksum  (big-endian i32, byte sum of the image)
//! 12 reserved
//! ```

use log::warn;

use super::catalog::{CartType, Platform};
use crate::error::CartError;

const HEADER_LEN: usize = 16;

/// Non-fatal results of loading an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// The image was loaded but its contents do not match the header.
    BadChecksum { stored: u32, computed: u32 },
    /// Several types share this size. The image is kept and the cartridge
    /// stays empty until a type is chosen.
    AmbiguousSize { kb: u32, candidates: Vec<CartType> },
}

/// A decoded image, ready to be started.
#[derive(Debug)]
pub struct ParsedImage {
    /// `None` while the size is ambiguous.
    pub kind: Option<CartType>,
    pub image: Vec<u8>,
    pub outcome: LoadOutcome,
}

/// Wrapping byte sum, as stored in CART headers.
#[must_use]
pub fn checksum(image: &[u8]) -> u32 {
    image
        .iter()
        .fold(0u32, |sum, &b| sum.wrapping_add(u32::from(b)))
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Identify and extract the image in `data`.
pub fn parse(data: &[u8], platform: Platform) -> Result<ParsedImage, CartError> {
    if !data.is_empty() && data.len() % 1024 == 0 {
        return parse_raw(data, platform);
    }
    if data.len() < HEADER_LEN || &data[..4] != b"CART" {
        return Err(CartError::UnrecognizedFormat);
    }

    let id = be_u32(&data[4..8]) as i32;
    let kind = match CartType::from_id(id) {
        Some(CartType::None) | None => return Err(CartError::UnknownType(id)),
        Some(kind) => kind,
    };
    let size = kind.info().size();
    let Some(body) = data.get(HEADER_LEN..HEADER_LEN + size) else {
        return Err(CartError::UnrecognizedFormat);
    };
    let image = body.to_vec();
    let stored = be_u32(&data[8..12]);
    let computed = checksum(&image);
    let outcome = if stored == computed {
        LoadOutcome::Loaded
    } else {
        warn!("CART checksum mismatch: header ${stored:08X}, image ${computed:08X}");
        LoadOutcome::BadChecksum { stored, computed }
    };
    Ok(ParsedImage {
        kind: Some(kind),
        image,
        outcome,
    })
}

fn parse_raw(data: &[u8], platform: Platform) -> Result<ParsedImage, CartError> {
    let kb = (data.len() / 1024) as u32;
    let candidates = CartType::raw_candidates(kb, platform);
    match candidates.as_slice() {
        [] => Err(CartError::UnrecognizedFormat),
        [kind] => Ok(ParsedImage {
            kind: Some(*kind),
            image: data.to_vec(),
            outcome: LoadOutcome::Loaded,
        }),
        _ => {
            warn!("{kb} KB raw image matches {} cartridge types", candidates.len());
            Ok(ParsedImage {
                kind: None,
                image: data.to_vec(),
                outcome: LoadOutcome::AmbiguousSize { kb, candidates },
            })
        }
    }
}

/// Build a CART file around `image`. Used by tools and tests.
#[must_use]
pub fn encode_cart(kind: CartType, image: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + image.len());
    out.extend_from_slice(b"CART");
    out.extend_from_slice(&kind.id().to_be_bytes());
    out.extend_from_slice(&checksum(image).to_be_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(image);
    out
}
