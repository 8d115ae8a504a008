//! In-memory collaborators: a pixel stack backed by plain buffers and an ROI
//! store. Useful for local images and for exercising the pipeline without a
//! database connection.

use image::{DynamicImage, ImageBuffer, Pixel};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, RoiError},
    traits::{PixelSource, RoiHandle, RoiSink, RoiSource},
    types::{ImageId, PixelsInfo, RoiId, StoredShape, Tile},
};

/// Five-dimensional pixel set held in memory, one row-major plane per
/// (z, c, t) position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneStack {
    info: PixelsInfo,
    max_intensity: f64,
    planes: Vec<Vec<f64>>,
}

impl PlaneStack {
    /// Zero-filled stack of the given extent.
    pub fn new(info: PixelsInfo, max_intensity: f64) -> Self {
        let plane_len = info.size_x as usize * info.size_y as usize;
        let count = info.size_z as usize * info.size_c as usize * info.size_t as usize;
        Self {
            info,
            max_intensity,
            planes: vec![vec![0.0; plane_len]; count],
        }
    }

    /// Single z/t stack with one plane per color channel of `image`.
    ///
    /// 8-bit images get a maximum intensity of 255, anything wider is read
    /// as 16-bit with a maximum of 65535.
    pub fn from_image(image: &DynamicImage) -> Self {
        let color = image.color();
        let channels = color.channel_count() as usize;
        let wide = color.bytes_per_pixel() as usize / channels > 1;

        let planes = match (channels, wide) {
            (1, false) => deinterleave(&image.to_luma8()),
            (1, true) => deinterleave(&image.to_luma16()),
            (2, false) => deinterleave(&image.to_luma_alpha8()),
            (2, true) => deinterleave(&image.to_luma_alpha16()),
            (3, false) => deinterleave(&image.to_rgb8()),
            (3, true) => deinterleave(&image.to_rgb16()),
            (_, false) => deinterleave(&image.to_rgba8()),
            (_, true) => deinterleave(&image.to_rgba16()),
        };

        let info = PixelsInfo {
            size_x: image.width(),
            size_y: image.height(),
            size_z: 1,
            size_c: planes.len() as u32,
            size_t: 1,
        };
        let max_intensity = if wide { f64::from(u16::MAX) } else { f64::from(u8::MAX) };

        tracing::debug!(?info, max_intensity, "loaded plane stack from image");
        Self {
            info,
            max_intensity,
            planes,
        }
    }

    /// Load an image file as a single z/t stack.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::from_image(&image::open(path)?))
    }

    pub fn with_max_intensity(mut self, max_intensity: f64) -> Self {
        self.max_intensity = max_intensity;
        self
    }

    fn index(&self, z: u32, c: u32, t: u32) -> Option<usize> {
        let info = &self.info;
        if z >= info.size_z || c >= info.size_c || t >= info.size_t {
            return None;
        }
        let (z, c, t) = (z as usize, c as usize, t as usize);
        Some((t * info.size_c as usize + c) * info.size_z as usize + z)
    }

    pub fn plane(&self, z: u32, c: u32, t: u32) -> Option<&[f64]> {
        self.index(z, c, t).map(|i| self.planes[i].as_slice())
    }

    /// Replace one plane; `data` must hold exactly `size_x * size_y` values.
    pub fn set_plane(&mut self, z: u32, c: u32, t: u32, data: Vec<f64>) -> Result<()> {
        let expected = self.info.size_x as usize * self.info.size_y as usize;
        if data.len() != expected {
            return Err(RoiError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let index = self
            .index(z, c, t)
            .ok_or(RoiError::PlaneOutOfRange { z, c, t })?;
        self.planes[index] = data;
        Ok(())
    }

    fn read_tile(&self, z: u32, c: u32, t: u32, tile: Tile) -> std::result::Result<Vec<f64>, String> {
        let plane = self
            .plane(z, c, t)
            .ok_or_else(|| format!("no plane at z={z} c={c} t={t}"))?;

        let right = u64::from(tile.origin.x) + u64::from(tile.width);
        let bottom = u64::from(tile.origin.y) + u64::from(tile.height);
        if right > u64::from(self.info.size_x) || bottom > u64::from(self.info.size_y) {
            return Err(format!(
                "tile exceeds the {}x{} plane",
                self.info.size_x, self.info.size_y
            ));
        }

        let stride = self.info.size_x as usize;
        let (x, w) = (tile.origin.x as usize, tile.width as usize);
        let mut buffer = Vec::with_capacity(tile.pixel_count());
        for row in tile.origin.y as usize..bottom as usize {
            buffer.extend_from_slice(&plane[row * stride + x..row * stride + x + w]);
        }
        Ok(buffer)
    }
}

fn deinterleave<P>(buffer: &ImageBuffer<P, Vec<P::Subpixel>>) -> Vec<Vec<f64>>
where
    P: Pixel,
    P::Subpixel: Into<f64>,
{
    let channels = P::CHANNEL_COUNT as usize;
    let mut planes = vec![Vec::with_capacity(buffer.len() / channels); channels];
    for pixel in buffer.pixels() {
        for (plane, &value) in planes.iter_mut().zip(pixel.channels()) {
            plane.push(value.into());
        }
    }
    planes
}

impl PixelSource for PlaneStack {
    fn pixels_info(&self) -> PixelsInfo {
        self.info
    }

    fn max_intensity(&self) -> f64 {
        self.max_intensity
    }

    fn get_tiles(&self, z: u32, channels: &[u32], t: u32, tile: Tile) -> Result<Vec<Vec<f64>>> {
        channels
            .iter()
            .map(|&c| {
                self.read_tile(z, c, t, tile)
                    .map_err(|reason| RoiError::TileFetch {
                        tile,
                        source: reason.into(),
                    })
            })
            .collect()
    }
}

/// An ROI as held by [`RoiStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRoi {
    pub id: Option<RoiId>,
    pub image: ImageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub shapes: Vec<StoredShape>,
}

impl StoredRoi {
    /// An unsaved ROI on `image`.
    pub fn new(image: ImageId) -> Self {
        Self {
            id: None,
            image,
            name: None,
            shapes: Vec::new(),
        }
    }
}

impl RoiHandle for StoredRoi {
    fn id(&self) -> Option<RoiId> {
        self.id
    }

    fn shapes(&self) -> &[StoredShape] {
        &self.shapes
    }
}

/// In-memory ROI database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiStore {
    rois: Vec<StoredRoi>,
    next_id: RoiId,
}

impl RoiStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a new ROI and return its id.
    pub fn insert(&mut self, image: ImageId, name: Option<String>, shapes: Vec<StoredShape>) -> RoiId {
        let id = self.allocate_id();
        self.rois.push(StoredRoi {
            id: Some(id),
            image,
            name,
            shapes,
        });
        id
    }

    pub fn get(&self, id: RoiId) -> Option<&StoredRoi> {
        self.rois.iter().find(|roi| roi.id == Some(id))
    }

    pub fn find_by_name(&self, image: ImageId, name: &str) -> Option<&StoredRoi> {
        self.rois
            .iter()
            .find(|roi| roi.image == image && roi.name.as_deref() == Some(name))
    }

    pub fn rois(&self) -> &[StoredRoi] {
        &self.rois
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    fn allocate_id(&mut self) -> RoiId {
        self.next_id += 1;
        self.next_id
    }
}

impl RoiSource for RoiStore {
    type Roi = StoredRoi;

    fn find_rois(&self, image: ImageId) -> Result<Vec<StoredRoi>> {
        Ok(self
            .rois
            .iter()
            .filter(|roi| roi.image == image)
            .cloned()
            .collect())
    }
}

impl RoiSink for RoiStore {
    type Roi = StoredRoi;

    fn save_shape(&mut self, image: ImageId, roi: Option<StoredRoi>, shape: StoredShape) -> Result<StoredRoi> {
        let mut roi = roi.unwrap_or_else(|| StoredRoi::new(image));
        roi.shapes.push(shape);

        match roi.id {
            Some(id) => {
                let existing = self
                    .rois
                    .iter_mut()
                    .find(|r| r.id == Some(id))
                    .ok_or(RoiError::RoiNotFound(id))?;
                *existing = roi.clone();
            }
            None => {
                roi.id = Some(self.allocate_id());
                self.rois.push(roi.clone());
            }
        }

        tracing::debug!(roi = ?roi.id, shapes = roi.shapes.len(), "saved shape");
        Ok(roi)
    }
}
