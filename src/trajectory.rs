//! Trajectory buffer and binary artifact codec
//!
//! A trajectory is the full state history of one run: index = step number,
//! slot 0 = initial state, length = `total_step + 1`. The artifact format is
//! a flat sequence of little-endian IEEE-754 doubles with no header, so the
//! round trip is bit-exact.

use crate::{Error, Result};

/// Ordered sequence of state values, one per step including step 0.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trajectory {
    values: Vec<f64>,
}

impl Trajectory {
    /// Create an empty trajectory pre-allocated for `total_step` steps
    /// (capacity `total_step + 1`, the extra slot holds the initial state).
    #[must_use]
    pub fn with_step_count(total_step: u64) -> Self {
        let capacity = usize::try_from(total_step).unwrap_or(usize::MAX).saturating_add(1);
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append one state value.
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Number of recorded values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the recorded value at a step index, if present.
    #[must_use]
    pub fn get(&self, step: u64) -> Option<f64> {
        usize::try_from(step).ok().and_then(|i| self.values.get(i).copied())
    }

    /// View the values as a slice, index = step number.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Encode as a flat little-endian f64 blob.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.values.len() * 8);
        for value in &self.values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Decode from a flat little-endian f64 blob.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedArtifact`] if the byte length is not a
    /// multiple of 8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 8 != 0 {
            return Err(Error::MalformedArtifact(format!(
                "byte length {} is not a multiple of 8",
                bytes.len()
            )));
        }
        let values = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                f64::from_le_bytes(buf)
            })
            .collect();
        Ok(Self { values })
    }
}

impl From<Vec<f64>> for Trajectory {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preallocation_capacity() {
        let trajectory = Trajectory::with_step_count(100);
        assert!(trajectory.is_empty());
        assert!(trajectory.values.capacity() >= 101);
    }

    #[test]
    fn test_push_and_index() {
        let mut trajectory = Trajectory::with_step_count(2);
        trajectory.push(1.0);
        trajectory.push(-2.5);
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.get(0), Some(1.0));
        assert_eq!(trajectory.get(1), Some(-2.5));
        assert_eq!(trajectory.get(2), None);
    }

    #[test]
    fn test_round_trip_exact() {
        let original = Trajectory::from(vec![0.0, -9.891_213_503, 13.569_080_01, f64::MIN, 1e-308]);
        let decoded = Trajectory::from_bytes(&original.to_bytes()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_empty_round_trip() {
        let empty = Trajectory::default();
        assert!(empty.to_bytes().is_empty());
        assert_eq!(Trajectory::from_bytes(&[]).unwrap(), empty);
    }

    #[test]
    fn test_truncated_blob_rejected() {
        let mut bytes = Trajectory::from(vec![1.0, 2.0]).to_bytes();
        bytes.pop();
        let err = Trajectory::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact(_)));
    }
}
