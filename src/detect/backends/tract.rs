#![cfg(feature = "backend-tract")]

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::result::{BoundingBox, Detection};

/// Configuration for the tract ONNX backend.
#[derive(Clone, Debug)]
pub struct TractConfig {
    /// Path to the ONNX model file.
    pub model_path: PathBuf,
    /// Model input width in pixels. Frames must match.
    pub input_width: u32,
    /// Model input height in pixels. Frames must match.
    pub input_height: u32,
    /// Class labels, indexed by the model's class ids.
    pub labels: Vec<String>,
    /// Detections below this confidence are discarded before the compliance
    /// evaluator ever sees them.
    pub base_confidence: f32,
}

/// Tract-based backend for ONNX object detection.
///
/// Loads a local model file and runs inference on RGB frames. Expects the
/// common YOLO export layout: one output tensor of rows
/// `[cx, cy, w, h, objectness, class scores...]` in input-pixel coordinates.
/// No network I/O; the model file is the only disk access.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    config: TractConfig,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new(config: TractConfig) -> Result<Self> {
        let model_path: &Path = config.model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(
                        1,
                        3,
                        config.input_height as usize,
                        config.input_width as usize
                    ),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        if config.labels.is_empty() {
            return Err(anyhow!("tract backend requires a non-empty label list"));
        }

        Ok(Self { model, config })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != self.config.input_width || height != self.config.input_height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.config.input_width,
                self.config.input_height
            ));
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;

        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn extract_detections(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let row_len = 5 + self.config.labels.len();
        let flat: Vec<f32> = view.iter().copied().collect();
        if flat.len() % row_len != 0 {
            return Err(anyhow!(
                "model output length {} is not a multiple of row length {}",
                flat.len(),
                row_len
            ));
        }

        let mut detections = Vec::new();
        for row in flat.chunks_exact(row_len) {
            let objectness = row[4];
            let (class_id, class_score) = row[5..]
                .iter()
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |best, (idx, &score)| {
                    if score > best.1 {
                        (idx, score)
                    } else {
                        best
                    }
                });
            let confidence = (objectness * class_score).clamp(0.0, 1.0);
            if confidence < self.config.base_confidence {
                continue;
            }

            let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
            let bbox = BoundingBox::new(
                (cx - w / 2.0).max(0.0),
                (cy - h / 2.0).max(0.0),
                (cx + w / 2.0).min(self.config.input_width as f32),
                (cy + h / 2.0).min(self.config.input_height as f32),
            );
            detections.push(Detection::new(
                self.config.labels[class_id].clone(),
                confidence,
                bbox,
            ));
        }

        Ok(detections)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(capability, DetectionCapability::ObjectDetection)
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.extract_detections(outputs)
    }
}
