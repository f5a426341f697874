//! Camera frame source.
//!
//! `CameraSource` captures frames from a local camera device, with a
//! synthetic fallback for `stub://` device paths so sessions and tests can
//! run without hardware. Real devices require the `ingest-v4l2` feature.

use image::RgbImage;

use super::{CaptureError, Frame};

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (e.g. "/dev/video0") or "stub://<name>" for synthetic.
    pub device: String,
    /// Target frame rate (frames per second); the session paces to this.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://site_camera".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

/// Camera frame source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCameraSource),
    #[cfg(feature = "ingest-v4l2")]
    V4l2(v4l2::DeviceCameraSource),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self, CaptureError> {
        if config.device.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCameraSource::new(config)),
            })
        } else {
            #[cfg(feature = "ingest-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::V4l2(v4l2::DeviceCameraSource::new(config)),
                })
            }
            #[cfg(not(feature = "ingest-v4l2"))]
            {
                Err(CaptureError::Unsupported(
                    config.device,
                    "camera devices require the ingest-v4l2 feature".to_string(),
                ))
            }
        }
    }

    /// Connect to the camera.
    pub fn connect(&mut self) -> Result<(), CaptureError> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(source) => source.connect(),
        }
    }

    /// Capture the next frame.
    pub fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(source) => source.next_frame(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(source) => source.stats(),
        }
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub device: String,
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticCameraSource {
    config: CameraConfig,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticCameraSource {
    fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            scene_state: 0,
        }
    }

    /// Synthetic sources are always "connected".
    fn connect(&mut self) -> Result<(), CaptureError> {
        log::info!(
            "CameraSource: connected to {} (synthetic)",
            self.config.device
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        self.frame_count += 1;
        Ok(Frame {
            image: self.generate_synthetic_image(),
            index: self.frame_count,
        })
    }

    /// Generate synthetic pixel data.
    ///
    /// Simulates a scene that changes occasionally, so downstream consumers
    /// see frame-to-frame variation.
    fn generate_synthetic_image(&mut self) -> RgbImage {
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let (frame_count, scene_state) = (self.frame_count, self.scene_state as u64);
        RgbImage::from_fn(self.config.width, self.config.height, |x, y| {
            let base = (x as u64 + y as u64 + frame_count + scene_state) % 256;
            image::Rgb([base as u8, (base / 2) as u8, (255 - base) as u8])
        })
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.config.device.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// Production V4L2 source
// ----------------------------------------------------------------------------

#[cfg(feature = "ingest-v4l2")]
mod v4l2 {
    use std::time::{Duration, Instant};

    use image::RgbImage;
    use ouroboros::self_referencing;

    use super::{CameraConfig, CameraStats};
    use crate::ingest::{CaptureError, Frame};

    pub(super) struct DeviceCameraSource {
        config: CameraConfig,
        state: Option<DeviceState>,
        frame_count: u64,
        last_frame_at: Option<Instant>,
        last_error: Option<String>,
        active_width: u32,
        active_height: u32,
    }

    #[self_referencing]
    struct DeviceState {
        device: v4l::Device,
        #[borrows(mut device)]
        #[covariant]
        stream: v4l::prelude::MmapStream<'this, v4l::Device>,
    }

    impl DeviceCameraSource {
        pub(super) fn new(config: CameraConfig) -> Self {
            Self {
                active_width: config.width,
                active_height: config.height,
                config,
                state: None,
                frame_count: 0,
                last_frame_at: None,
                last_error: None,
            }
        }

        pub(super) fn connect(&mut self) -> Result<(), CaptureError> {
            use v4l::buffer::Type;
            use v4l::video::Capture;

            let mut device = v4l::Device::with_path(&self.config.device).map_err(|err| {
                CaptureError::Unavailable(self.config.device.clone(), err.to_string())
            })?;
            let mut format = device.format().map_err(|err| {
                CaptureError::Unavailable(self.config.device.clone(), err.to_string())
            })?;
            format.width = self.config.width;
            format.height = self.config.height;
            format.fourcc = v4l::FourCC::new(b"RGB3");

            let format = match device.set_format(&format) {
                Ok(format) => format,
                Err(err) => {
                    log::warn!(
                        "CameraSource: failed to set format on {}: {}",
                        self.config.device,
                        err
                    );
                    device.format().map_err(|err| {
                        CaptureError::Unavailable(self.config.device.clone(), err.to_string())
                    })?
                }
            };

            if self.config.target_fps > 0 {
                let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
                if let Err(err) = device.set_params(&params) {
                    log::warn!(
                        "CameraSource: failed to set fps on {}: {}",
                        self.config.device,
                        err
                    );
                }
            }

            self.active_width = format.width;
            self.active_height = format.height;
            self.last_error = None;

            let state = DeviceStateTryBuilder {
                device,
                stream_builder: |device| {
                    v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4).map_err(
                        |err| {
                            CaptureError::Unavailable(
                                "v4l2 buffer stream".to_string(),
                                err.to_string(),
                            )
                        },
                    )
                },
            }
            .try_build()
            .map_err(|err: CaptureError| {
                self.last_error = Some(err.to_string());
                err
            })?;
            self.state = Some(state);

            log::info!(
                "CameraSource: connected to {} ({}x{})",
                self.config.device,
                self.active_width,
                self.active_height
            );
            Ok(())
        }

        pub(super) fn next_frame(&mut self) -> Result<Frame, CaptureError> {
            use v4l::io::traits::CaptureStream;

            let state = self.state.as_mut().ok_or(CaptureError::NotConnected)?;
            let captured =
                state.with_stream_mut(|stream| stream.next().map(|(buf, _meta)| buf.to_vec()));
            let pixels = match captured {
                Ok(pixels) => pixels,
                Err(err) => {
                    self.last_error = Some(err.to_string());
                    return Err(CaptureError::Unavailable(
                        self.config.device.clone(),
                        err.to_string(),
                    ));
                }
            };

            let image = RgbImage::from_raw(self.active_width, self.active_height, pixels)
                .ok_or_else(|| {
                    CaptureError::Decode(format!(
                        "buffer does not match {}x{} RGB frame",
                        self.active_width, self.active_height
                    ))
                })?;

            self.frame_count += 1;
            self.last_frame_at = Some(Instant::now());

            Ok(Frame {
                image,
                index: self.frame_count,
            })
        }

        pub(super) fn is_healthy(&self) -> bool {
            if self.last_error.is_some() {
                return false;
            }
            let Some(last_frame_at) = self.last_frame_at else {
                return true;
            };
            last_frame_at.elapsed() <= self.health_grace()
        }

        pub(super) fn stats(&self) -> CameraStats {
            CameraStats {
                frames_captured: self.frame_count,
                device: self.config.device.clone(),
            }
        }

        fn health_grace(&self) -> Duration {
            let base_ms = if self.config.target_fps == 0 {
                2_000
            } else {
                (1000 / self.config.target_fps).saturating_mul(6)
            };
            Duration::from_millis(base_ms.max(2_000) as u64)
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config() -> CameraConfig {
        CameraConfig {
            device: "stub://test".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn camera_source_produces_frames() {
        let mut source = CameraSource::new(stub_config()).unwrap();
        source.connect().unwrap();

        let frame = source.next_frame().unwrap();
        assert_eq!(frame.image.width(), 640);
        assert_eq!(frame.image.height(), 480);
        assert_eq!(frame.index, 1);
    }

    #[test]
    fn camera_source_counts_frames() {
        let mut source = CameraSource::new(stub_config()).unwrap();
        source.connect().unwrap();

        source.next_frame().unwrap();
        source.next_frame().unwrap();
        let stats = source.stats();
        assert_eq!(stats.frames_captured, 2);
        assert_eq!(stats.device, "stub://test");
        assert!(source.is_healthy());
    }

    #[cfg(not(feature = "ingest-v4l2"))]
    #[test]
    fn real_device_requires_feature() {
        let config = CameraConfig {
            device: "/dev/video0".to_string(),
            ..stub_config()
        };
        assert!(matches!(
            CameraSource::new(config),
            Err(CaptureError::Unsupported(_, _))
        ));
    }
}
