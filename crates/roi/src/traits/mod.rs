use crate::{
    error::Result,
    types::{ImageId, PixelsInfo, RoiId, StoredShape, Tile},
};

/// Source of raw pixel data for one image
pub trait PixelSource {
    /// Declared (x, y, z, c, t) extent of the pixel set
    fn pixels_info(&self) -> PixelsInfo;

    /// Upper bound of the intensity range
    fn max_intensity(&self) -> f64;

    /// Fetch `tile` at plane `z` / frame `t` for each of `channels`.
    ///
    /// Returns one flat row-major buffer of `tile.width * tile.height`
    /// values per requested channel, in request order. A single-channel
    /// request is a one-element slice.
    fn get_tiles(&self, z: u32, channels: &[u32], t: u32, tile: Tile) -> Result<Vec<Vec<f64>>>;
}

/// A persisted ROI: an ordered collection of stored shapes
pub trait RoiHandle {
    /// Identifier once persisted
    fn id(&self) -> Option<RoiId>;

    fn shapes(&self) -> &[StoredShape];

    fn shape_count(&self) -> usize {
        self.shapes().len()
    }

    fn shape(&self, index: usize) -> Option<&StoredShape> {
        self.shapes().get(index)
    }
}

/// Query side of the ROI store
pub trait RoiSource {
    type Roi: RoiHandle;

    /// All ROIs attached to `image`, in store order
    fn find_rois(&self, image: ImageId) -> Result<Vec<Self::Roi>>;
}

/// Write side of the ROI store
pub trait RoiSink {
    type Roi: RoiHandle;

    /// Persist `shape`, appending it to `roi` or creating a new ROI linked
    /// to `image` when `roi` is `None`. Returns the persisted ROI.
    fn save_shape(&mut self, image: ImageId, roi: Option<Self::Roi>, shape: StoredShape) -> Result<Self::Roi>;
}
