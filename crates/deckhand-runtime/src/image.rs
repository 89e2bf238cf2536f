//! Image builder for prebuilt job images
//!
//! Resolves the image of a model version by naming convention, assuming the
//! image was pushed to the registry ahead of time.

use async_trait::async_trait;
use deckhand_core::{Container, DeckhandError, DeckhandResult, Model, Project, Version};
use tracing::debug;

use crate::traits::ImageBuilder;

/// Image builder resolving `<registry>/<project>-<model>:<version>`
pub struct PrebuiltImageBuilder {
    registry: String,
}

impl PrebuiltImageBuilder {
    pub fn new(registry: impl Into<String>) -> Self {
        Self {
            registry: registry.into().trim_end_matches('/').to_string(),
        }
    }

    /// Image reference for a model version
    pub fn image_ref(&self, project: &Project, model: &Model, version: &Version) -> String {
        format!(
            "{}/{}-{}:{}",
            self.registry, project.name, model.name, version.id
        )
    }
}

#[async_trait]
impl ImageBuilder for PrebuiltImageBuilder {
    async fn build_image(
        &self,
        project: &Project,
        model: &Model,
        version: &Version,
    ) -> DeckhandResult<String> {
        if self.registry.is_empty() {
            return Err(DeckhandError::ImageBuild(
                "no image registry configured".to_string(),
            ));
        }

        let image_ref = self.image_ref(project, model, version);
        debug!(image = %image_ref, "Resolved prebuilt image");
        Ok(image_ref)
    }

    async fn get_containers(
        &self,
        _project: &Project,
        _model: &Model,
        _version: &Version,
    ) -> DeckhandResult<Vec<Container>> {
        Ok(Vec::new())
    }
}
