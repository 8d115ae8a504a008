use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma, Rgb, RgbImage};

use crate::{
    error::Result,
    types::{ImageTensorCoord, LabelMap, Mask, Thumbnail},
};

/// Mask with covered pixels at 255, for viewing.
pub fn mask_to_image(mask: &Mask) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([if mask.get_pixel(x, y)[0] > 0 { u8::MAX } else { 0 }])
    })
}

/// 16-bit rendering of a label map; labels beyond `u16::MAX` saturate.
pub fn label_map_to_image(labels: &LabelMap) -> ImageBuffer<Luma<u16>, Vec<u16>> {
    ImageBuffer::from_fn(labels.width(), labels.height(), |x, y| {
        Luma([labels.get_pixel(x, y)[0].min(u32::from(u16::MAX)) as u16])
    })
}

/// 8-bit rendering of a thumbnail, scaled so `max_intensity` maps to 255.
///
/// One channel gives a gray image. Otherwise the first three channels become
/// red, green and blue, with absent channels left black.
pub fn thumbnail_to_image(thumbnail: &Thumbnail, max_intensity: f64) -> DynamicImage {
    let scale = if max_intensity > 0.0 { 255.0 / max_intensity } else { 0.0 };
    let to_u8 = |v: f64| (v * scale).round().clamp(0.0, 255.0) as u8;
    let (width, height) = (thumbnail.width() as u32, thumbnail.height() as u32);
    let sample = |x: u32, y: u32, channel: usize| {
        let at = ImageTensorCoord {
            row: y as usize,
            col: x as usize,
        };
        thumbnail.get(at, channel).map(|v| to_u8(v)).unwrap_or(0)
    };

    if thumbnail.channels() == 1 {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| Luma([sample(x, y, 0)])))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([sample(x, y, 0), sample(x, y, 1), sample(x, y, 2)])
        }))
    }
}

/// Encode any image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
