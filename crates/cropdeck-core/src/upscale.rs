//! Optional super-resolution pass for magnifying exports.
//!
//! The model itself lives outside this crate. Front ends construct one
//! [`Upscaler`] at startup and hand it to the session as
//! `Option<Arc<dyn Upscaler>>`; the session only calls it from the export
//! worker.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use log::{debug, warn};

use crate::decode::{resize, DecodedImage, FilterType};
use crate::session::{run_export, ControlEvent, ExportCompletion, ExportRequest};

/// A super-resolution collaborator.
///
/// `process` must not panic. On any internal failure it returns its input
/// unchanged, so an export never fails because of the upscaler.
pub trait Upscaler: Send + Sync {
    /// True once the model is loaded and usable.
    fn ready(&self) -> bool;

    fn process(&self, image: DecodedImage) -> DecodedImage;
}

/// Shared handle injected into the session.
pub type SharedUpscaler = Arc<dyn Upscaler>;

/// Plain Lanczos enlargement by an integer factor.
///
/// Stands in for a learned model where none is available; also what the
/// command line front end offers behind `--upscale`.
#[derive(Debug, Clone, Copy)]
pub struct InterpolatingUpscaler {
    factor: u32,
}

impl InterpolatingUpscaler {
    pub fn new(factor: u32) -> Self {
        Self {
            factor: factor.max(1),
        }
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }
}

impl Upscaler for InterpolatingUpscaler {
    fn ready(&self) -> bool {
        true
    }

    fn process(&self, image: DecodedImage) -> DecodedImage {
        if self.factor == 1 {
            return image;
        }
        let width = image.width.saturating_mul(self.factor);
        let height = image.height.saturating_mul(self.factor);
        match resize(&image, width, height, FilterType::Lanczos3) {
            Ok(upscaled) => upscaled,
            Err(e) => {
                warn!("Upscale failed, keeping original: {}", e);
                image
            }
        }
    }
}

/// Run `request` on a named worker thread and post the result to `events`.
pub fn spawn_export_worker(
    request: ExportRequest,
    upscaler: Option<SharedUpscaler>,
    events: Sender<ControlEvent>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("export-worker".to_string())
        .spawn(move || {
            let file_name = request.file_name.clone();
            debug!("Export worker started for {}", file_name);
            let result = run_export(request, upscaler.as_deref());
            let completion = ExportCompletion { file_name, result };
            if events.send(ControlEvent::ExportFinished(completion)).is_err() {
                warn!("Export finished after the session was closed");
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Upscaler that is never ready.
    struct Offline;

    impl Upscaler for Offline {
        fn ready(&self) -> bool {
            false
        }

        fn process(&self, image: DecodedImage) -> DecodedImage {
            image
        }
    }

    #[test]
    fn test_interpolating_upscaler_scales() {
        let up = InterpolatingUpscaler::new(3);
        let out = up.process(DecodedImage::filled(5, 4, [10, 20, 30]));
        assert_eq!((out.width, out.height), (15, 12));
        assert!(up.ready());
    }

    #[test]
    fn test_interpolating_upscaler_factor_one_is_identity() {
        let img = DecodedImage::filled(5, 4, [10, 20, 30]);
        assert_eq!(InterpolatingUpscaler::new(0).process(img.clone()), img);
    }

    #[test]
    fn test_upscaler_is_object_safe() {
        let shared: SharedUpscaler = Arc::new(Offline);
        assert!(!shared.ready());
    }

    #[test]
    fn test_worker_posts_completion() {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = unbounded();
        let request = ExportRequest {
            file_name: "a.png".to_string(),
            crop: DecodedImage::filled(8, 8, [50, 60, 70]),
            target: Some((32, 32)),
            output: dir.path().join("a.jpg"),
            quality: 98,
        };
        let upscaler: SharedUpscaler = Arc::new(InterpolatingUpscaler::new(2));
        let handle = spawn_export_worker(request, Some(upscaler), tx).unwrap();
        handle.join().unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            ControlEvent::ExportFinished(done) => {
                assert_eq!(done.file_name, "a.png");
                assert_eq!(done.result.unwrap(), dir.path().join("a.jpg"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
