//! Kernel implementation selection.

use crate::{OpsError, OpsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which implementation of the per-pixel kernels to run.
///
/// Both produce identical output; `Simd` falls back to `Scalar` when the
/// crate is built without the `simd` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelPath {
    /// Plain per-pixel loops.
    Scalar,
    /// 8 pixels per step with `wide::i16x8`, scalar tail.
    #[default]
    Simd,
}

impl KernelPath {
    /// Implementation that will actually run for this request.
    #[inline]
    pub fn effective(self) -> Self {
        if cfg!(feature = "simd") {
            self
        } else {
            KernelPath::Scalar
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            KernelPath::Scalar => "scalar",
            KernelPath::Simd => "simd",
        }
    }
}

impl fmt::Display for KernelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KernelPath {
    type Err = OpsError;

    fn from_str(s: &str) -> OpsResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" => Ok(KernelPath::Scalar),
            "simd" | "vector" => Ok(KernelPath::Simd),
            other => Err(OpsError::UnknownKernel(other.to_string())),
        }
    }
}
