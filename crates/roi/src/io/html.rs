use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{error::Result, io::png, types::Thumbnail};

/// Inline `<img>` tag showing `thumbnail` as a base64 PNG.
pub fn html_thumbnail(thumbnail: &Thumbnail, max_intensity: f64) -> Result<String> {
    let bytes = png::encode_png(&png::thumbnail_to_image(thumbnail, max_intensity))?;
    let encoded = STANDARD.encode(bytes);
    Ok(format!(
        r#"<img style="width: 200px; max-height: 200px" src="data:image/png;base64,{encoded}">"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_thumbnail_embeds_png() {
        let html = html_thumbnail(&Thumbnail::zeros(4, 6, 3), 255.0).expect("Should render");
        let prefix = r#"<img style="width: 200px; max-height: 200px" src="data:image/png;base64,"#;
        assert!(html.starts_with(prefix));
        assert!(html.ends_with(r#"">"#));

        let payload = &html[prefix.len()..html.len() - 2];
        let bytes = STANDARD.decode(payload).expect("Should be base64");
        let decoded = image::load_from_memory(&bytes).expect("Should be a PNG");
        assert_eq!((decoded.width(), decoded.height()), (6, 4));
    }
}
