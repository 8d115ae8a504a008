pub mod codec;
pub mod raster;
pub mod thumbnail;
pub mod labels;

pub use codec::{decode, decode_points, decode_roi, encode};
pub use raster::{draw_perimeter, perimeter_pixels, polygon_to_mask};
pub use thumbnail::{bounding_box, extract_roi_thumbnail, extract_thumbnail, ThumbnailRequest};
pub use labels::{build_label_map, label_histogram, roi_layer};
#[cfg(feature = "rayon")]
pub use labels::build_label_map_par;
