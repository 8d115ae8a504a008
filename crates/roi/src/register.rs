use crate::{
    algorithms::codec,
    error::Result,
    traits::RoiSink,
    types::{ImageId, Polygon, StackPosition},
};

/// Encode `polygon` and attach it to `roi`, or to a new ROI on `image` when
/// `roi` is `None`. Returns the ROI as persisted by `sink`.
pub fn register_shape<K>(
    sink: &mut K,
    image: ImageId,
    roi: Option<K::Roi>,
    polygon: &Polygon,
    position: StackPosition,
) -> Result<K::Roi>
where
    K: RoiSink + ?Sized,
{
    let shape = codec::encode(polygon, position);
    tracing::debug!(image, points = polygon.len(), ?position, "registering shape");
    sink.save_shape(image, roi, shape)
}
