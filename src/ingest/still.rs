//! Still-image ingestion for one-shot inspections.

use std::path::Path;

use super::{CaptureError, Frame};

/// Load a single image file as a frame.
///
/// Only local paths are accepted; URL schemes are refused rather than
/// fetched.
pub fn load_still<P: AsRef<Path>>(path: P) -> Result<Frame, CaptureError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    if !is_local_file_path(&display) {
        return Err(CaptureError::Unsupported(
            display,
            "still inspection only supports local paths (no URL schemes)".to_string(),
        ));
    }

    let image = image::open(path)
        .map_err(|err| CaptureError::Decode(format!("{}: {}", display, err)))?
        .to_rgb8();

    Ok(Frame { image, index: 1 })
}

fn is_local_file_path(path: &str) -> bool {
    !path.trim().is_empty() && !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn loads_a_local_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::new(32, 24).save(&path).unwrap();

        let frame = load_still(&path).unwrap();
        assert_eq!(frame.image.width(), 32);
        assert_eq!(frame.image.height(), 24);
        assert_eq!(frame.index, 1);
    }

    #[test]
    fn url_schemes_are_refused() {
        assert!(matches!(
            load_still("https://example.com/frame.jpg"),
            Err(CaptureError::Unsupported(_, _))
        ));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        assert!(matches!(
            load_still("/nonexistent/frame.jpg"),
            Err(CaptureError::Decode(_))
        ));
    }
}
