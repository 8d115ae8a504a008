//! # ROI Geometry Library
//!
//! Conversions between the polygon shapes an image database stores for
//! regions of interest and the rasters needed to work with them: binary
//! masks, integer label maps and cropped multi-channel thumbnails.
//!
//! ## Core Features
//!
//! - **Shape codec**: parse and emit the `"x,y, x,y"` point strings of stored shapes
//! - **Rasterization**: even-odd polygon fill and Bresenham outlines
//! - **Thumbnails**: crop around an ROI from any [`PixelSource`], with an optional outline overlay
//! - **Label maps**: composite all ROIs of an image into one raster
//! - **Collaborator traits**: plug in any pixel or ROI backend; in-memory ones are in [`store`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roi::{build_label_map, extract_thumbnail, ImageShape, PlaneStack, RoiStore, ThumbnailRequest};
//!
//! let pixels = PlaneStack::open("cells.tif")?;
//! let mut rois = RoiStore::new();
//! let polygon = roi::decode_points("10,10, 10,40, 40,40, 40,10")?;
//! roi::register_shape(&mut rois, 1, None, &polygon, Default::default())?;
//!
//! let thumb = extract_thumbnail(&polygon, &pixels, &ThumbnailRequest::default())?;
//! let labels = build_label_map(1, ImageShape::new(512, 512), &rois)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod register;
pub mod store;
pub mod cache;
pub mod io;

pub use error::{Result, RoiError};
pub use types::*;
pub use traits::*;
pub use algorithms::*;
pub use register::register_shape;
pub use store::{PlaneStack, RoiStore, StoredRoi};
pub use cache::ThumbnailCache;
pub use io::{encode_png, html_thumbnail, label_map_to_image, mask_to_image, thumbnail_to_image};
