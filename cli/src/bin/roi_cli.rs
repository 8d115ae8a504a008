use clap::{Parser, Subcommand};
use cli::{RoiProject, ThumbFormat};
use color_eyre::eyre::{eyre, Result};
use roi::{
    PixelSource, RoiHandle, RoiSource, StackPosition, ThumbnailCache, ThumbnailRequest,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the points of a stored shape string
    Decode {
        /// Points as "x,y, x,y, ..."
        #[arg(short, long)]
        points: String,
    },
    /// Re-encode points the way they are stored (integer truncation)
    Encode {
        #[arg(short, long)]
        points: String,
        #[arg(long, default_value_t = 0)]
        z: u32,
        #[arg(long, default_value_t = 0)]
        t: u32,
        #[arg(long, default_value_t = 0)]
        c: u32,
    },
    /// Rasterize a polygon into a mask PNG
    Mask {
        #[arg(short, long)]
        points: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Build the label map of every ROI in a project
    Labels {
        /// Path to the TOML or JSON project file
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract a thumbnail around one ROI
    Thumb {
        #[arg(short, long)]
        config: PathBuf,
        /// Name of the ROI in the project
        #[arg(short, long)]
        roi: String,
        #[arg(long)]
        z: Option<u32>,
        #[arg(long)]
        t: Option<u32>,
        /// Comma separated channel indices
        #[arg(long, value_delimiter = ',')]
        channels: Option<Vec<u32>>,
        /// Do not draw the ROI outline
        #[arg(long)]
        no_overlay: bool,
        #[arg(long, default_value = "png")]
        format: ThumbFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write an HTML page with a thumbnail per ROI
    Gallery {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the project ROIs as GeoJSON
    Geojson {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the JSON schema of the project file
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { points } => {
            let polygon = roi::decode_points(&points)?;
            for p in polygon.points() {
                println!("{}\t{}", p.x, p.y);
            }
        }
        Commands::Encode { points, z, t, c } => {
            let polygon = roi::decode_points(&points)?;
            let shape = roi::encode(&polygon, StackPosition::new(z, t, c));
            println!("{}", shape.points);
        }
        Commands::Mask { points, width, height, output } => {
            let polygon = roi::decode_points(&points)?;
            if polygon.len() < 3 {
                warn!("Polygon with {} points has no interior, the mask will be empty", polygon.len());
            }
            let mask = roi::polygon_to_mask(&polygon, roi::ImageShape::new(width, height));
            roi::mask_to_image(&mask).save(&output)?;
            info!("Mask written to {:?}", output);
        }
        Commands::Labels { config, output } => {
            write_labels(&config, output.as_deref())?;
        }
        Commands::Thumb { config, roi, z, t, channels, no_overlay, format, output } => {
            let request = ThumbnailRequest {
                z,
                t,
                channels,
                draw_overlay: !no_overlay,
            };
            write_thumbnail(&config, &roi, &request, format, output.as_deref())?;
        }
        Commands::Gallery { config, output } => {
            write_gallery(&config, output.as_deref())?;
        }
        Commands::Geojson { config, output } => {
            let project = RoiProject::from_file(&config)?;
            let path = project.output_path(output.as_deref(), "rois.geojson");
            ensure_parent(&path)?;
            project.to_store().save_geojson(&path)?;
            info!("{} ROIs exported to {:?}", project.rois.len(), path);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&RoiProject::schema())?);
        }
    }

    Ok(())
}

fn project_dir(config: &Path) -> &Path {
    config.parent().unwrap_or_else(|| Path::new("."))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_labels(config: &Path, output: Option<&Path>) -> Result<()> {
    let project = RoiProject::from_file(config)?;
    info!("Project image: {}", project.image);

    let pixels = project.load_pixels(project_dir(config))?;
    let store = project.to_store();
    let labels = roi::build_label_map(project.image_id, pixels.pixels_info().plane_shape(), &store)?;

    let histogram = roi::label_histogram(&labels);
    let covered: usize = histogram.iter().filter(|(label, _)| **label > 0).map(|(_, n)| *n).sum();
    let overlaps = histogram.keys().filter(|&&label| label as usize > project.rois.len()).count();
    info!("{} ROIs cover {} pixels", project.rois.len(), covered);
    if overlaps > 0 {
        warn!("{} label values exceed the ROI count; overlapping ROIs are summed", overlaps);
    }

    let path = project.output_path(output, "labels.png");
    ensure_parent(&path)?;
    roi::label_map_to_image(&labels).save(&path)?;
    info!("✅ Label map written to {:?}", path);
    Ok(())
}

fn write_thumbnail(
    config: &Path,
    name: &str,
    request: &ThumbnailRequest,
    format: ThumbFormat,
    output: Option<&Path>,
) -> Result<()> {
    let project = RoiProject::from_file(config)?;
    let pixels = project.load_pixels(project_dir(config))?;
    let store = project.to_store();
    let roi = store
        .find_by_name(project.image_id, name)
        .ok_or_else(|| eyre!("No ROI named '{}' in {:?}", name, config))?;

    let thumb = roi::extract_roi_thumbnail(roi, &pixels, request)?;
    info!(
        "Thumbnail of '{}': {}x{} with {} channels",
        name,
        thumb.width(),
        thumb.height(),
        thumb.channels()
    );

    let file_name = format!("{}.{}", name, format);
    let path = project.output_path(output, &file_name);
    ensure_parent(&path)?;
    match format {
        ThumbFormat::Png => {
            roi::thumbnail_to_image(&thumb, pixels.max_intensity()).save(&path)?;
        }
        ThumbFormat::Html => {
            std::fs::write(&path, roi::html_thumbnail(&thumb, pixels.max_intensity())?)?;
        }
    }
    info!("Thumbnail written to {:?}", path);
    Ok(())
}

fn write_gallery(config: &Path, output: Option<&Path>) -> Result<()> {
    let project = RoiProject::from_file(config)?;
    let pixels = project.load_pixels(project_dir(config))?;
    let store = project.to_store();
    let request = ThumbnailRequest::default();
    let mut cache = ThumbnailCache::new();

    let mut body = String::new();
    for roi in store.find_rois(project.image_id)? {
        let (Some(id), Some(name)) = (roi.id(), roi.name.as_deref()) else {
            continue;
        };
        let thumb = match cache.get_or_try_insert_with(project.image_id, id, || {
            roi::extract_roi_thumbnail(&roi, &pixels, &request)
        }) {
            Ok(thumb) => thumb,
            Err(e) => {
                warn!("Skipping ROI '{}': {}", name, e);
                continue;
            }
        };
        let img = roi::html_thumbnail(thumb, pixels.max_intensity())?;
        body.push_str(&format!("<figure>{img}<figcaption>{name}</figcaption></figure>\n"));
    }

    let path = project.output_path(output, "gallery.html");
    ensure_parent(&path)?;
    std::fs::write(&path, format!("<html><body>\n{body}</body></html>\n"))?;
    info!("✅ Gallery of {} thumbnails written to {:?}", cache.len(), path);
    Ok(())
}
