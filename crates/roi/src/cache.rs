use std::collections::HashMap;

use crate::{
    error::Result,
    types::{ImageId, RoiId, Thumbnail},
};

/// Previously computed thumbnails keyed by image and ROI.
///
/// Owned by whatever presents thumbnails; nothing in the extraction path
/// consults it.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: HashMap<(ImageId, RoiId), Thumbnail>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, image: ImageId, roi: RoiId) -> Option<&Thumbnail> {
        self.entries.get(&(image, roi))
    }

    /// Cached thumbnail, computing and storing it on a miss. Failed
    /// computations are not cached.
    pub fn get_or_try_insert_with<F>(&mut self, image: ImageId, roi: RoiId, compute: F) -> Result<&Thumbnail>
    where
        F: FnOnce() -> Result<Thumbnail>,
    {
        use std::collections::hash_map::Entry;

        match self.entries.entry((image, roi)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                tracing::trace!(image, roi, "thumbnail cache miss");
                Ok(entry.insert(compute()?))
            }
        }
    }

    pub fn invalidate(&mut self, image: ImageId, roi: RoiId) -> Option<Thumbnail> {
        self.entries.remove(&(image, roi))
    }

    /// Drop every thumbnail of `image`.
    pub fn invalidate_image(&mut self, image: ImageId) {
        self.entries.retain(|&(cached, _), _| cached != image);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoiError;

    #[test]
    fn test_computes_once() {
        let mut cache = ThumbnailCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let thumb = cache
                .get_or_try_insert_with(1, 2, || {
                    calls += 1;
                    Ok(Thumbnail::zeros(2, 2, 1))
                })
                .expect("Should compute");
            assert_eq!(thumb.width(), 2);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut cache = ThumbnailCache::new();
        let result = cache.get_or_try_insert_with(1, 2, || Err(RoiError::EmptyRoi));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_image() {
        let mut cache = ThumbnailCache::new();
        for roi in 0..3 {
            cache
                .get_or_try_insert_with(1, roi, || Ok(Thumbnail::zeros(1, 1, 1)))
                .expect("Should compute");
        }
        cache
            .get_or_try_insert_with(2, 0, || Ok(Thumbnail::zeros(1, 1, 1)))
            .expect("Should compute");

        assert!(cache.invalidate(1, 0).is_some());
        cache.invalidate_image(1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(2, 0).is_some());
    }
}
