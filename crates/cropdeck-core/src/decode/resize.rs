//! Resampling helpers used by the renderer, the exporter and export previews.
//!
//! All functions return new `DecodedImage` instances without modifying the input.

use super::{DecodeError, DecodedImage, FilterType};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Fails with `DecodeError::ZeroSize` for a zero target dimension and
/// `DecodeError::Corrupt` when the buffer length disagrees with the
/// dimensions.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroSize { width, height });
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::Corrupt("pixel buffer does not match dimensions".to_string()))?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(DecodedImage::from_rgb_image(resized))
}

/// Shrink an image to fit inside a `max_width` x `max_height` box, keeping
/// its aspect ratio. Images that already fit are returned unchanged; this
/// never magnifies.
pub fn resize_to_fit(
    image: &DecodedImage,
    max_width: u32,
    max_height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if max_width == 0 || max_height == 0 {
        return Err(DecodeError::ZeroSize {
            width: max_width,
            height: max_height,
        });
    }

    if image.width <= max_width && image.height <= max_height {
        return Ok(image.clone());
    }

    let (new_width, new_height) =
        calculate_fit_dimensions(image.width, image.height, max_width, max_height);

    resize(image, new_width, new_height, filter)
}

/// Downscaled copy of an export for the side-panel preview.
///
/// Uses bilinear sampling: the preview is small and regenerated after
/// every save.
pub fn generate_preview(
    image: &DecodedImage,
    max_width: u32,
    max_height: u32,
) -> Result<DecodedImage, DecodeError> {
    resize_to_fit(image, max_width, max_height, FilterType::Bilinear)
}

/// Largest dimensions with the source aspect ratio that fit in the box.
fn calculate_fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let factor = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let new_width = ((width as f64 * factor).round() as u32).clamp(1, max_width);
    let new_height = ((height as f64 * factor).round() as u32).clamp(1, max_height);
    (new_width, new_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8);
                pixels.push(((y * 255) / height.max(1)) as u8);
                pixels.push(128);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_resize_basic() {
        let resized = resize(&gradient(100, 50), 50, 25, FilterType::Bilinear).unwrap();
        assert_eq!((resized.width, resized.height), (50, 25));
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_same_dimensions_is_copy() {
        let img = gradient(10, 5);
        assert_eq!(resize(&img, 10, 5, FilterType::Nearest).unwrap(), img);
    }

    #[test]
    fn test_resize_magnify_nearest_keeps_blocks() {
        let img = DecodedImage::new(2, 1, vec![255, 0, 0, 0, 0, 255]);
        let resized = resize(&img, 4, 2, FilterType::Nearest).unwrap();
        assert_eq!(resized.pixel(0, 0), [255, 0, 0]);
        assert_eq!(resized.pixel(1, 1), [255, 0, 0]);
        assert_eq!(resized.pixel(3, 0), [0, 0, 255]);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = gradient(100, 50);
        assert!(resize(&img, 0, 50, FilterType::Bilinear).is_err());
        assert!(resize(&img, 50, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_to_fit_landscape() {
        let resized = resize_to_fit(&gradient(600, 400), 256, 256, FilterType::Bilinear).unwrap();
        assert_eq!((resized.width, resized.height), (256, 171));
    }

    #[test]
    fn test_resize_to_fit_tall_box() {
        let resized = resize_to_fit(&gradient(400, 400), 100, 300, FilterType::Bilinear).unwrap();
        assert_eq!((resized.width, resized.height), (100, 100));
    }

    #[test]
    fn test_resize_to_fit_already_smaller() {
        let resized = resize_to_fit(&gradient(100, 50), 256, 256, FilterType::Bilinear).unwrap();
        assert_eq!((resized.width, resized.height), (100, 50));
    }

    #[test]
    fn test_generate_preview_fits_box() {
        let preview = generate_preview(&gradient(300, 900), 200, 200).unwrap();
        assert!(preview.width <= 200 && preview.height <= 200);
        assert_eq!(preview.height, 200);
    }

    #[test]
    fn test_calculate_fit_dimensions() {
        assert_eq!(calculate_fit_dimensions(6000, 4000, 2560, 2560), (2560, 1707));
        assert_eq!(calculate_fit_dimensions(4000, 6000, 2560, 2560), (1707, 2560));
        assert_eq!(calculate_fit_dimensions(1000, 10, 50, 50), (50, 1));
        assert_eq!(calculate_fit_dimensions(0, 0, 256, 256), (0, 0));
    }
}
