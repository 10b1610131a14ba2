//! Cover image normalization

use crate::error::TagError;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

/// Crop the largest centered square out of `img`
///
/// For a `W x H` image the side is `S = min(W, H)` and the crop origin is
/// `((W - S) / 2, (H - S) / 2)`.
pub fn center_crop(img: &RgbImage) -> RgbImage {
    let (width, height) = img.dimensions();
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    image::imageops::crop_imm(img, x, y, side, side).to_image()
}

/// Decode any supported image, square it and re-encode as JPEG
pub fn prepare_cover(bytes: &[u8], quality: u8) -> Result<Vec<u8>, TagError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let square = center_crop(&rgb);

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(&square)?;
    Ok(jpeg)
}
