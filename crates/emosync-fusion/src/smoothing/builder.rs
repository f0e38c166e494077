//! Smoother selection from a preference list.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    OrtSequenceClassifier, PassthroughSmoother, RollingModeSmoother, SequenceClassifier,
    SequenceModelSmoother, TemporalSmoother,
};
use crate::config::{SmoothingConfig, SmoothingKind};
use crate::error::{FusionError, FusionResult};

/// Load the sequence classifier named by the config, if any.
///
/// A missing or unloadable model is not an error here: the builder simply
/// moves on to the next preferred strategy.
pub fn load_sequence_classifier(config: &SmoothingConfig) -> Option<Arc<dyn SequenceClassifier>> {
    let path = config.model_path.as_ref()?;

    match OrtSequenceClassifier::load(path, config.model_output.clone()) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(e) => {
            warn!(
                model_path = %path.display(),
                error = %e,
                "Sequence model unavailable"
            );
            None
        }
    }
}

/// Builds the first available smoother in preference order.
///
/// # Example
///
/// ```ignore
/// let smoother = SmootherBuilder::new(&config.smoothing)
///     .with_classifier(classifier)
///     .build()?;
/// ```
pub struct SmootherBuilder<'a> {
    config: &'a SmoothingConfig,
    classifier: Option<Arc<dyn SequenceClassifier>>,
}

impl<'a> SmootherBuilder<'a> {
    pub fn new(config: &'a SmoothingConfig) -> Self {
        Self {
            config,
            classifier: None,
        }
    }

    /// Provide the loaded sequence classifier.
    pub fn with_classifier(mut self, classifier: Option<Arc<dyn SequenceClassifier>>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Pick the first strategy whose dependencies are present.
    ///
    /// Returns `SmoothingUnavailable` only when the list is exhausted; a list
    /// ending in `passthrough` therefore always succeeds.
    pub fn build(self) -> FusionResult<Box<dyn TemporalSmoother>> {
        for kind in &self.config.preference {
            match kind {
                SmoothingKind::SequenceModel => match &self.classifier {
                    Some(classifier) => {
                        info!(
                            classifier = classifier.name(),
                            window = self.config.sequence_window,
                            "Using sequence-model smoothing"
                        );
                        return Ok(Box::new(SequenceModelSmoother::new(
                            Arc::clone(classifier),
                            self.config.sequence_window,
                        )));
                    }
                    None => debug!("Sequence model not loaded, trying next strategy"),
                },
                SmoothingKind::RollingMode => {
                    info!(window = self.config.rolling_window, "Using rolling-mode smoothing");
                    return Ok(Box::new(RollingModeSmoother::new(self.config.rolling_window)));
                }
                SmoothingKind::Passthrough => {
                    info!("Using pass-through smoothing");
                    return Ok(Box::new(PassthroughSmoother));
                }
            }
        }

        Err(FusionError::smoothing_unavailable(format!(
            "no strategy available among {:?}",
            self.config.preference
        )))
    }
}
