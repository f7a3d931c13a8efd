//! The outward face of the engine: one session per verification run.
//!
//! A [`FixtureSession`] owns a [`GraphBuilder`] and turns engine errors into
//! one [`VerificationFailure`] per requested type. The registry outlives
//! each request, so later requests reuse pairs built by earlier ones, and
//! downstream checks can keep mutating fields through
//! [`FixtureSession::mutator`] under the same rules.

use prefab_core::{TypeCatalog, TypeTag};
use thiserror::Error;

use crate::builder::GraphBuilder;
use crate::config::BuildConfig;
use crate::error::EngineError;
use crate::mutator::FieldMutator;
use crate::objects::{Fixtures, ObjectBuilder};
use crate::trace::BuildEvent;

/// Why fixtures for a type could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot build fixtures for {tag} ({category}): {message}")]
pub struct VerificationFailure {
    pub tag: TypeTag,
    pub category: &'static str,
    pub message: String,
    #[source]
    pub cause: EngineError,
}

impl VerificationFailure {
    fn new(tag: &TypeTag, cause: EngineError) -> Self {
        VerificationFailure {
            tag: tag.clone(),
            category: cause.category(),
            message: cause.to_string(),
            cause,
        }
    }
}

pub struct FixtureSession<'c> {
    builder: GraphBuilder<'c>,
}

impl<'c> FixtureSession<'c> {
    pub fn new(catalog: &'c TypeCatalog) -> Self {
        Self::from_builder(GraphBuilder::new(catalog))
    }

    pub fn with_config(catalog: &'c TypeCatalog, config: BuildConfig) -> Self {
        Self::from_builder(GraphBuilder::with_config(catalog, config))
    }

    /// Wraps a builder that already carries manual prefabs, hints or a
    /// custom instantiator.
    pub fn from_builder(builder: GraphBuilder<'c>) -> Self {
        FixtureSession { builder }
    }

    pub fn builder(&mut self) -> &mut GraphBuilder<'c> {
        &mut self.builder
    }

    pub fn mutator(&mut self) -> FieldMutator<'_, 'c> {
        FieldMutator::new(&mut self.builder)
    }

    /// Red, black, red copy and default values for `tag`.
    pub fn fixtures_for(&mut self, tag: &TypeTag) -> Result<Fixtures, VerificationFailure> {
        match ObjectBuilder::new(&mut self.builder).build(tag) {
            Ok(fixtures) => {
                tracing::debug!(
                    %tag,
                    skipped = fixtures.unsupported.len(),
                    registered = self.builder.registry().len(),
                    "fixtures ready"
                );
                Ok(fixtures)
            }
            Err(err) => {
                let failure = VerificationFailure::new(tag, err);
                tracing::warn!(%tag, category = failure.category, "cannot build fixtures");
                Err(failure)
            }
        }
    }

    /// Ends the session: static fields go back to their original values.
    /// Returns the recorded trace, empty unless tracing was enabled.
    pub fn finish(mut self) -> Vec<BuildEvent> {
        self.builder.release_statics();
        self.builder.take_trace()
    }
}
