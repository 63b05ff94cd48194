//! Processing recipes.
//!
//! A [`Pipeline`] is an ordered list of [`Operation`]s that can be stored as
//! YAML and replayed on any buffer:
//!
//! ```rust
//! use xray_core::PixelBuffer;
//! use xray_ops::Pipeline;
//!
//! let recipe = r#"
//! steps:
//!   - op: median
//!   - op: window_level
//!     center: 100
//!     width: 80
//!   - op: rotate
//!     angle: 90
//! "#;
//!
//! let pipeline = Pipeline::from_yaml(recipe).unwrap();
//! assert_eq!(pipeline.len(), 3);
//!
//! let src = PixelBuffer::filled(6, 4, [100, 100, 100, 255]);
//! let out = pipeline.run(&src).unwrap();
//! assert_eq!(out.dimensions(), (4, 6));
//! assert_eq!(out.pixel(0, 0).unwrap(), [128, 128, 128, 255]);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use xray_core::PixelBuffer;

use crate::{CancelToken, OpsResult, Operation};

/// Ordered list of operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pipeline {
    /// Steps applied first to last.
    #[serde(default)]
    pub steps: Vec<Operation>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a YAML recipe with a top-level `steps` list.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Yaml`](crate::OpsError::Yaml) for malformed YAML,
    /// unknown `op` names or parameters that fail type-level checks (such
    /// as a 45° rotation or an even custom kernel).
    pub fn from_yaml(yaml: &str) -> OpsResult<Self> {
        let pipeline: Pipeline = serde_yaml::from_str(yaml)?;
        debug!(steps = pipeline.steps.len(), "Loaded pipeline");
        Ok(pipeline)
    }

    /// Serializes the recipe back to YAML.
    pub fn to_yaml(&self) -> OpsResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Appends a step.
    pub fn then(mut self, op: Operation) -> Self {
        self.steps.push(op);
        self
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if there are no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step in order. An empty pipeline returns a copy of `src`.
    pub fn run(&self, src: &PixelBuffer) -> OpsResult<PixelBuffer> {
        self.run_cancellable(src, &CancelToken::new())
    }

    /// Runs every step, checking `cancel` before each one and between rows.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its error.
    pub fn run_cancellable(&self, src: &PixelBuffer, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
        let mut current = src.clone();
        for (i, op) in self.steps.iter().enumerate() {
            cancel.check()?;
            debug!(step = i, op = op.name(), "Running pipeline step");
            current = op.apply_cancellable(&current, cancel)?;
        }
        Ok(current)
    }
}

impl FromIterator<Operation> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{GaussianParams, MirrorParams};
    use crate::transform::Mirror;
    use crate::OpsError;

    #[test]
    fn test_empty_pipeline_is_identity() {
        let src = PixelBuffer::filled(3, 3, [1, 2, 3, 4]);
        assert_eq!(Pipeline::new().run(&src).unwrap(), src);
        assert!(Pipeline::from_yaml("steps: []").unwrap().is_empty());
        assert!(Pipeline::from_yaml("{}").unwrap().is_empty());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let p = Pipeline::new()
            .then(Operation::Gaussian(GaussianParams { sigma: 2.5 }))
            .then(Operation::Invert)
            .then(Operation::Mirror(MirrorParams { axis: Mirror::Vertical }));
        let yaml = p.to_yaml().unwrap();
        assert_eq!(Pipeline::from_yaml(&yaml).unwrap(), p);
    }

    #[test]
    fn test_unknown_op_is_yaml_error() {
        let err = Pipeline::from_yaml("steps:\n  - op: sharpen_more\n").unwrap_err();
        assert!(matches!(err, OpsError::Yaml(_)));
    }

    #[test]
    fn test_steps_run_in_order() {
        let src = PixelBuffer::from_fn(2, 1, |x, _| [x as u8 * 100, 0, 0, 255]);
        let p: Pipeline = [Operation::Invert, Operation::Mirror(MirrorParams::default())]
            .into_iter()
            .collect();
        let out = p.run(&src).unwrap();
        assert_eq!(out.pixel(0, 0).unwrap(), [155, 255, 255, 255]);
        assert_eq!(out.pixel(1, 0).unwrap(), [255, 255, 255, 255]);
    }

    #[test]
    fn test_cancelled_before_first_step() {
        let token = CancelToken::new();
        token.cancel();
        let p = Pipeline::new().then(Operation::Invert);
        let src = PixelBuffer::filled(2, 2, [0, 0, 0, 255]);
        assert!(matches!(p.run_cancellable(&src, &token), Err(OpsError::Cancelled)));
    }

    #[test]
    fn test_failing_step_stops_run() {
        let p = Pipeline::from_yaml("steps:\n  - op: invert\n  - op: gaussian\n    sigma: 0\n").unwrap();
        let err = p.run(&PixelBuffer::filled(2, 2, [0, 0, 0, 255])).unwrap_err();
        assert!(err.is_validation());
    }
}
