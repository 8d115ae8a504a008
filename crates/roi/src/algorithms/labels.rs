use crate::{
    algorithms::{codec, raster},
    error::Result,
    traits::RoiSource,
    types::{ImageId, ImageShape, LabelMap, Mask, Polygon},
};

/// Composite every ROI of `image` into one label raster.
///
/// Shapes of the i-th ROI (0-based, in source order) contribute `i + 1` to
/// each pixel they cover. Contributions are summed, so a pixel covered by
/// ROIs 0 and 1 holds 3, and a pixel covered twice by one ROI holds twice its
/// label. Sums saturate at `u32::MAX`.
pub fn build_label_map<S>(image: ImageId, shape: ImageShape, source: &S) -> Result<LabelMap>
where
    S: RoiSource + ?Sized,
{
    let rois = source.find_rois(image)?;
    tracing::debug!(image, rois = rois.len(), "building label map");

    let mut labels = LabelMap::new(shape.width, shape.height);
    for (i, roi) in rois.iter().enumerate() {
        let label = label_for(i);
        for polygon in codec::decode_roi(roi)? {
            accumulate(&mut labels, &raster::polygon_to_mask(&polygon, shape), label);
        }
    }

    Ok(labels)
}

/// Same result as [`build_label_map`], with ROIs rasterized in parallel.
///
/// Each ROI is rendered into its own buffer and the buffers are summed in
/// ROI order afterwards, so the output does not depend on scheduling.
#[cfg(feature = "rayon")]
pub fn build_label_map_par<S>(image: ImageId, shape: ImageShape, source: &S) -> Result<LabelMap>
where
    S: RoiSource + ?Sized,
{
    use rayon::prelude::*;

    let rois = source.find_rois(image)?;
    tracing::debug!(image, rois = rois.len(), "building label map in parallel");

    let polygons: Vec<Vec<Polygon>> = rois
        .iter()
        .map(|roi| codec::decode_roi(roi))
        .collect::<Result<_>>()?;

    let layers: Vec<LabelMap> = polygons
        .par_iter()
        .enumerate()
        .map(|(i, shapes)| roi_layer(shapes, shape, label_for(i)))
        .collect();

    let mut labels = LabelMap::new(shape.width, shape.height);
    for layer in &layers {
        for (out, contribution) in labels.iter_mut().zip(layer.iter()) {
            *out = out.saturating_add(*contribution);
        }
    }

    Ok(labels)
}

/// Contribution of one ROI's shapes, all scaled by `label`.
pub fn roi_layer(shapes: &[Polygon], shape: ImageShape, label: u32) -> LabelMap {
    let mut layer = LabelMap::new(shape.width, shape.height);
    for polygon in shapes {
        accumulate(&mut layer, &raster::polygon_to_mask(polygon, shape), label);
    }
    layer
}

/// Label of the ROI at `index`, pinned to `u32::MAX` past the last value.
fn label_for(index: usize) -> u32 {
    u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX)
}

fn accumulate(labels: &mut LabelMap, mask: &Mask, label: u32) {
    for (out, &covered) in labels.iter_mut().zip(mask.iter()) {
        if covered > 0 {
            *out = out.saturating_add(label);
        }
    }
}

/// Pixels covered by each label value, including background.
pub fn label_histogram(labels: &LabelMap) -> std::collections::BTreeMap<u32, usize> {
    let mut histogram = std::collections::BTreeMap::new();
    for &value in labels.iter() {
        *histogram.entry(value).or_insert(0) += 1;
    }
    histogram
}
