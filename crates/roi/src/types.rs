use geo_types::{Coord, LineString};
use image::{GrayImage, ImageBuffer, Luma};
use ndarray::{Array3, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoiError};

/// A vertex in image pixel space, `x` along the width and `y` along the height.
pub type Point = Coord<f64>;

/// Identifier of an image in the backing store.
pub type ImageId = u64;

/// Identifier of a persisted ROI.
pub type RoiId = u64;

/// Binary mask (0 or 1 per pixel) addressed as `(x, y)`.
pub type Mask = GrayImage;

/// Integer label raster addressed as `(x, y)`; 0 is background.
pub type LabelMap = ImageBuffer<Luma<u32>, Vec<u32>>;

/// An open polygon; the closing edge back to the first vertex is implicit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Convert to geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> geo_types::Polygon<f64> {
        geo_types::Polygon::new(LineString::new(self.points.clone()), vec![])
    }

    /// Unsigned area of the closed ring.
    pub fn area(&self) -> f64 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }

    /// Fewer than three vertices, or a zero net area. Self-intersecting rings
    /// whose lobes cancel count as degenerate here even though they still
    /// rasterize to a non-empty mask.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3 || self.area() == 0.0
    }

    /// Opt-in rejection of degenerate polygons. Nothing in the crate calls this
    /// implicitly; rasterization tolerates degenerate input.
    pub fn validate(&self) -> Result<()> {
        if self.is_degenerate() {
            return Err(RoiError::InvalidPolygon {
                points: self.points.len(),
            });
        }
        Ok(())
    }

    /// Coordinates cast to integers, truncating toward zero.
    pub fn truncated(&self) -> Self {
        self.points
            .iter()
            .map(|p| Coord {
                x: p.x.trunc(),
                y: p.y.trunc(),
            })
            .collect()
    }

    /// Translate every vertex by `(-dx, -dy)`, clamping results at zero.
    pub fn shifted_clamped(&self, dx: f64, dy: f64) -> Self {
        self.points
            .iter()
            .map(|p| Coord {
                x: (p.x - dx).max(0.0),
                y: (p.y - dy).max(0.0),
            })
            .collect()
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<Vec<[f64; 2]>> for Polygon {
    fn from(points: Vec<[f64; 2]>) -> Self {
        points.into_iter().map(|[x, y]| Coord { x, y }).collect()
    }
}

impl From<&geo_types::Polygon<f64>> for Polygon {
    fn from(polygon: &geo_types::Polygon<f64>) -> Self {
        let mut points: Vec<Point> = polygon.exterior().0.clone();
        // geo closes its rings explicitly; ours are implicitly closed.
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self::new(points)
    }
}

/// Focal plane, time frame and channel locating a 2D slice in the stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackPosition {
    pub z: u32,
    pub t: u32,
    pub c: u32,
}

impl StackPosition {
    pub fn new(z: u32, t: u32, c: u32) -> Self {
        Self { z, t, c }
    }
}

/// A shape as persisted by the image database: a `"x,y, x,y"` point string
/// plus its position in the stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredShape {
    pub points: String,
    #[serde(flatten)]
    pub position: StackPosition,
}

/// Width-first pixel coordinate, as used for crop origins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBoxCoord {
    pub x: u32,
    pub y: u32,
}

/// Height-first coordinate into an assembled image tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageTensorCoord {
    pub row: usize,
    pub col: usize,
}

/// Rectangular pixel sub-region requested from a pixel source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub origin: BoundingBoxCoord,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            origin: BoundingBoxCoord { x, y },
            width,
            height,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Plane dimensions in the width-then-height order of the image API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
}

impl ImageShape {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Declared extent of a five-dimensional pixel set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelsInfo {
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
    pub size_c: u32,
    pub size_t: u32,
}

impl PixelsInfo {
    pub fn plane_shape(&self) -> ImageShape {
        ImageShape::new(self.size_x, self.size_y)
    }

    pub fn mid_z(&self) -> u32 {
        self.size_z / 2
    }

    pub fn mid_t(&self) -> u32 {
        self.size_t / 2
    }

    /// The first `min(3, size_c)` channels.
    pub fn default_channels(&self) -> Vec<u32> {
        (0..self.size_c.min(3)).collect()
    }
}

/// Crop of an image around an ROI, stored `[row, col, channel]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pixels: Array3<f64>,
}

impl Thumbnail {
    pub fn new(pixels: Array3<f64>) -> Self {
        Self { pixels }
    }

    pub fn zeros(height: usize, width: usize, channels: usize) -> Self {
        Self::new(Array3::zeros((height, width, channels)))
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn channels(&self) -> usize {
        self.pixels.dim().2
    }

    pub fn get(&self, at: ImageTensorCoord, channel: usize) -> Option<f64> {
        self.pixels.get((at.row, at.col, channel)).copied()
    }

    /// Set every channel of one pixel; out-of-range coordinates are ignored.
    pub fn fill_pixel(&mut self, at: ImageTensorCoord, value: f64) {
        if at.row >= self.height() || at.col >= self.width() {
            return;
        }
        for channel in 0..self.channels() {
            self.pixels[(at.row, at.col, channel)] = value;
        }
    }

    pub fn channel(&self, channel: usize) -> ArrayView2<'_, f64> {
        self.pixels.index_axis(ndarray::Axis(2), channel)
    }

    pub fn as_array(&self) -> &Array3<f64> {
        &self.pixels
    }
}
