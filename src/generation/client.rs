//! One model invocation per frame, turned into a stored image reference or a typed failure.

use crate::error::GenerationError;
use crate::generation::request::ImageRef;
use crate::provider::ImageModel;
use crate::sheet::Position;
use crate::storage::{frame_object_key, ObjectStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct FrameGenerationClient {
    model: Arc<dyn ImageModel>,
    objects: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl FrameGenerationClient {
    pub fn new(model: Arc<dyn ImageModel>, objects: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self {
            model,
            objects,
            timeout,
        }
    }

    pub fn model(&self) -> &dyn ImageModel {
        self.model.as_ref()
    }

    /// Generate and store one frame image. No retry; the timeout covers invoke and store.
    pub async fn generate(
        &self,
        sheet_id: &str,
        position: Position,
        prompt: &str,
    ) -> Result<ImageRef, GenerationError> {
        let started = Instant::now();
        let attempt = async {
            let image = self.model.invoke(prompt).await?;
            if image.bytes.is_empty() {
                return Err(GenerationError::NoImage);
            }
            let key = frame_object_key(sheet_id, position, &image.bytes, &image.mime_type);
            let url = self
                .objects
                .store(&image.bytes, &image.mime_type, &key)
                .await?;
            Ok((url, image.mime_type))
        };

        let (url, mime_type) = tokio::time::timeout(self.timeout, attempt)
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout.as_secs()))??;

        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            sheet_id,
            row = position.row,
            col = position.col,
            duration_ms,
            provider = self.model.provider_name(),
            "Frame image stored"
        );
        Ok(ImageRef {
            url,
            mime_type,
            duration_ms,
        })
    }
}
