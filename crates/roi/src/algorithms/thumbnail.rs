use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::{codec, raster},
    error::{Result, RoiError},
    traits::{PixelSource, RoiHandle},
    types::{Polygon, Thumbnail, Tile},
};

/// Pixels subtracted from the polygon minimum to place the crop origin.
pub const CROP_MARGIN: f64 = 1.0;

/// Offset subtracted from the polygon, on top of the crop origin, before
/// the outline is drawn into the crop.
pub const OVERLAY_MARGIN: f64 = 3.0;

/// Options for [`extract_thumbnail`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    /// Focal plane, defaults to the middle plane
    pub z: Option<u32>,
    /// Time frame, defaults to the middle frame
    pub t: Option<u32>,
    /// Channels to stack, defaults to the first three
    pub channels: Option<Vec<u32>>,
    /// Draw the ROI outline at the maximum intensity
    pub draw_overlay: bool,
}

impl Default for ThumbnailRequest {
    fn default() -> Self {
        Self {
            z: None,
            t: None,
            channels: None,
            draw_overlay: true,
        }
    }
}

/// Crop rectangle around a polygon.
///
/// Vertices are first cast to integers. The origin is the minimum vertex
/// minus [`CROP_MARGIN`], clamped at zero, and the extent is the vertex range
/// minus one. The extent deliberately stays one pixel short of the range so
/// that crops and overlays line up with thumbnails produced before.
pub fn bounding_box(polygon: &Polygon) -> Tile {
    let truncated = polygon.truncated();
    let points = truncated.points();
    if points.is_empty() {
        return Tile::default();
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let x = (min_x - CROP_MARGIN).max(0.0);
    let y = (min_y - CROP_MARGIN).max(0.0);
    let width = (max_x - min_x - 1.0).max(0.0);
    let height = (max_y - min_y - 1.0).max(0.0);

    Tile::new(x as u32, y as u32, width as u32, height as u32)
}

/// Crop the region around `polygon` out of `source` as a
/// `height x width x channels` thumbnail.
///
/// Tile fetch failures from `source` are returned as is.
pub fn extract_thumbnail<S>(polygon: &Polygon, source: &S, request: &ThumbnailRequest) -> Result<Thumbnail>
where
    S: PixelSource + ?Sized,
{
    let polygon = polygon.truncated();
    let tile = bounding_box(&polygon);

    let info = source.pixels_info();
    let z = request.z.unwrap_or_else(|| info.mid_z());
    let t = request.t.unwrap_or_else(|| info.mid_t());
    let channels = request
        .channels
        .clone()
        .unwrap_or_else(|| info.default_channels());

    tracing::debug!(?tile, z, t, ?channels, "fetching thumbnail tiles");
    let buffers = source.get_tiles(z, &channels, t, tile)?;

    if buffers.len() != channels.len() {
        return Err(RoiError::ShapeMismatch {
            expected: channels.len(),
            actual: buffers.len(),
        });
    }
    let expected = tile.pixel_count();
    if let Some(buffer) = buffers.iter().find(|b| b.len() != expected) {
        return Err(RoiError::ShapeMismatch {
            expected,
            actual: buffer.len(),
        });
    }

    let (height, width) = (tile.height as usize, tile.width as usize);
    let pixels = Array3::from_shape_fn((height, width, channels.len()), |(row, col, channel)| {
        buffers[channel][row * width + col]
    });
    let mut thumbnail = Thumbnail::new(pixels);

    if request.draw_overlay {
        let local = polygon.shifted_clamped(
            f64::from(tile.origin.x) + OVERLAY_MARGIN,
            f64::from(tile.origin.y) + OVERLAY_MARGIN,
        );
        raster::draw_perimeter(&mut thumbnail, &local, source.max_intensity());
    }

    Ok(thumbnail)
}

/// Thumbnail of the first shape of `roi`.
pub fn extract_roi_thumbnail<R, S>(roi: &R, source: &S, request: &ThumbnailRequest) -> Result<Thumbnail>
where
    R: RoiHandle + ?Sized,
    S: PixelSource + ?Sized,
{
    let shape = roi.shape(0).ok_or(RoiError::EmptyRoi)?;
    let polygon = codec::decode(shape)?;
    extract_thumbnail(&polygon, source, request)
}
