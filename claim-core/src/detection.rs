use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Damage classes reported by the external detector, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageClass {
    Scratch,
    Dent,
    Broken,
    Severe,
}

impl DamageClass {
    /// Fixed severity rank: scratch=1, dent=2, broken=3, severe=4
    pub fn severity_rank(&self) -> u8 {
        match self {
            DamageClass::Scratch => 1,
            DamageClass::Dent => 2,
            DamageClass::Broken => 3,
            DamageClass::Severe => 4,
        }
    }

    /// Base repair cost range in INR for a single instance of this class
    pub fn base_cost_range(&self) -> (i64, i64) {
        match self {
            DamageClass::Scratch => (500, 5_000),
            DamageClass::Dent => (1_500, 8_000),
            DamageClass::Broken => (3_000, 15_000),
            DamageClass::Severe => (25_000, 100_000),
        }
    }
}

impl std::fmt::Display for DamageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DamageClass::Scratch => write!(f, "scratch"),
            DamageClass::Dent => write!(f, "dent"),
            DamageClass::Broken => write!(f, "broken"),
            DamageClass::Severe => write!(f, "severe"),
        }
    }
}

/// One classified, localized damage observation from the external detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub class: DamageClass,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    /// Bounding box as [x1, y1, x2, y2] in image coordinates
    pub bbox: [f64; 4],
}

impl Detection {
    pub fn new(class: DamageClass, confidence: f64) -> Self {
        Self {
            class,
            confidence,
            bbox: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Interface to the external object-detection model.
///
/// Detection failures are hard errors: they propagate to the caller and
/// are not covered by the assistant breaker.
#[async_trait]
pub trait DamageDetector: Send + Sync {
    /// Run detection over raw image bytes
    async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>>;
}
