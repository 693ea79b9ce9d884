//! Turning a cropped bitmap into the export file.

use std::path::PathBuf;

use log::{debug, info};
use thiserror::Error;

use crate::decode::{resize, DecodeError, DecodedImage, FilterType};
use crate::encode::{write_jpeg, EncodeError};
use crate::upscale::Upscaler;

/// Errors that abort an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Resize to target failed: {0}")]
    Resize(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// A crop ready to be written.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Source file the crop came from.
    pub file_name: String,
    pub crop: DecodedImage,
    /// Exact output size, if locked.
    pub target: Option<(u32, u32)>,
    pub output: PathBuf,
    pub quality: u8,
}

/// Run the export pipeline: optional upscale pass, Lanczos resize to the
/// locked size, JPEG encode.
pub fn run_export(
    request: ExportRequest,
    upscaler: Option<&dyn Upscaler>,
) -> Result<PathBuf, ExportError> {
    let ExportRequest {
        file_name,
        mut crop,
        target,
        output,
        quality,
    } = request;

    if let Some(upscaler) = upscaler {
        let (w, h) = (crop.width, crop.height);
        crop = upscaler.process(crop);
        debug!(
            "Upscaled {}: {}x{} -> {}x{}",
            file_name, w, h, crop.width, crop.height
        );
    }

    if let Some((width, height)) = target {
        crop = resize(&crop, width, height, FilterType::Lanczos3)?;
    }

    write_jpeg(&crop, &output, quality)?;
    info!(
        "Saved {} -> {} ({}x{})",
        file_name,
        output.display(),
        crop.width,
        crop.height
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upscale::InterpolatingUpscaler;
    use tempfile::TempDir;

    fn request(dir: &TempDir, crop: DecodedImage, target: Option<(u32, u32)>) -> ExportRequest {
        ExportRequest {
            file_name: "cat.png".to_string(),
            crop,
            target,
            output: dir.path().join("cat.jpg"),
            quality: 98,
        }
    }

    #[test]
    fn test_export_keeps_crop_size_without_target() {
        let dir = TempDir::new().unwrap();
        let out = run_export(request(&dir, DecodedImage::filled(30, 20, [1, 2, 3]), None), None).unwrap();
        assert_eq!(crate::decode::read_dimensions(&out).unwrap(), (30, 20));
    }

    #[test]
    fn test_export_resizes_to_target() {
        let dir = TempDir::new().unwrap();
        let out = run_export(
            request(&dir, DecodedImage::filled(30, 20, [1, 2, 3]), Some((64, 48))),
            None,
        )
        .unwrap();
        assert_eq!(crate::decode::read_dimensions(&out).unwrap(), (64, 48));
    }

    #[test]
    fn test_export_with_upscaler_still_hits_target() {
        let dir = TempDir::new().unwrap();
        let upscaler = InterpolatingUpscaler::new(4);
        let out = run_export(
            request(&dir, DecodedImage::filled(10, 10, [90, 90, 90]), Some((25, 25))),
            Some(&upscaler),
        )
        .unwrap();
        assert_eq!(crate::decode::read_dimensions(&out).unwrap(), (25, 25));
    }

    #[test]
    fn test_export_write_failure() {
        let dir = TempDir::new().unwrap();
        let mut req = request(&dir, DecodedImage::filled(4, 4, [0, 0, 0]), None);
        req.output = dir.path().join("missing").join("cat.jpg");
        assert!(matches!(run_export(req, None), Err(ExportError::Encode(_))));
    }
}
