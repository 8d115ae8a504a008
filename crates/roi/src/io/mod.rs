pub mod geojson;
pub mod png;
pub mod html;

pub use png::{encode_png, label_map_to_image, mask_to_image, thumbnail_to_image};
pub use html::html_thumbnail;
