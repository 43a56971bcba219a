//! # OCR Boundary Types
//!
//! Text recognition runs outside this crate. Its output enters as an
//! [`OcrResult`], which is validated before any segmentation happens.

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Region of the source image the text was read from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Text returned by an external OCR service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub text: String,
    /// Engine confidence in [0, 1]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl OcrResult {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
            bounding_box: None,
        }
    }

    /// Reject confidences outside [0, 1] and degenerate bounding boxes
    pub fn validate(&self) -> AppResult<()> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(AppError::Validation(format!(
                "OCR confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }
        if let Some(bbox) = &self.bounding_box {
            if bbox.width < 0.0 || bbox.height < 0.0 {
                return Err(AppError::Validation(format!(
                    "OCR bounding box has negative size {}x{}",
                    bbox.width, bbox.height
                )));
            }
        }
        Ok(())
    }
}
