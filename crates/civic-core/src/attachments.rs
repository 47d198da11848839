//! Attachment manager
//!
//! Holds the images attached to a form. Additions keep arrival order and are
//! truncated to the configured cap (first come, first kept). Each accepted
//! image owns a [`PreviewHandle`]; removing the image, taking the images for
//! submission, clearing, or dropping the manager revokes it.

use crate::config::CivicConfig;
use crate::error::AttachmentError;
use crate::preview::{PreviewHandle, PreviewId, PreviewRegistry};
use serde::{Deserialize, Serialize};

/// Raw image selected by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlob {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageBlob {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Size in bytes
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Limits applied when images are added
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLimits {
    /// `None` for no count cap
    pub max_count: Option<usize>,
    pub max_image_bytes: usize,
    pub accepted_content_prefix: String,
}

impl AttachmentLimits {
    /// Limits for a report form
    #[must_use]
    pub fn from_config(config: &CivicConfig) -> Self {
        Self {
            max_count: Some(config.max_attachments),
            max_image_bytes: config.max_image_bytes,
            accepted_content_prefix: config.accepted_content_prefix.clone(),
        }
    }

    /// Same per-image checks without a count cap; the owning report enforces
    /// its cap when the images are merged
    #[must_use]
    pub fn without_count_cap(mut self) -> Self {
        self.max_count = None;
        self
    }

    pub(crate) fn check(&self, image: &ImageBlob) -> Option<SkipReason> {
        if !image
            .content_type
            .to_ascii_lowercase()
            .starts_with(&self.accepted_content_prefix)
        {
            return Some(SkipReason::UnsupportedType);
        }
        if image.size() > self.max_image_bytes {
            return Some(SkipReason::TooLarge {
                size: image.size(),
                limit: self.max_image_bytes,
            });
        }
        None
    }
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self::from_config(&CivicConfig::default())
    }
}

/// Why an offered image was not kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "kebab-case", tag = "reason")]
pub enum SkipReason {
    /// Content type outside the accepted prefix
    #[error("unsupported content type")]
    UnsupportedType,
    #[error("{size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    /// Arrived after the cap was reached
    #[error("attachment limit reached")]
    OverLimit,
}

/// An offered image that was not kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedImage {
    pub file_name: String,
    pub reason: SkipReason,
}

/// Result of one `add_images` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub accepted: usize,
    pub skipped: Vec<SkippedImage>,
}

/// Accepted image plus its live preview
#[derive(Debug)]
pub struct Attachment {
    image: ImageBlob,
    preview: PreviewHandle,
}

impl Attachment {
    #[inline]
    #[must_use]
    pub fn image(&self) -> &ImageBlob {
        &self.image
    }

    #[inline]
    #[must_use]
    pub fn preview_id(&self) -> PreviewId {
        self.preview.id()
    }

    #[must_use]
    pub fn preview_url(&self) -> String {
        self.preview.url()
    }

    /// Give up the preview and keep the image
    #[must_use]
    pub fn into_image(self) -> ImageBlob {
        let Attachment { image, preview } = self;
        preview.release();
        image
    }
}

/// Ordered, capped image list with preview lifetimes
#[derive(Debug)]
pub struct AttachmentManager {
    registry: PreviewRegistry,
    limits: AttachmentLimits,
    items: Vec<Attachment>,
}

impl AttachmentManager {
    #[must_use]
    pub fn new(registry: PreviewRegistry, limits: AttachmentLimits) -> Self {
        Self {
            registry,
            limits,
            items: Vec::new(),
        }
    }

    /// Append images in arrival order, keeping only the first `max_count`
    /// overall. Returns the resulting sequence.
    pub fn add_images(&mut self, files: impl IntoIterator<Item = ImageBlob>) -> &[Attachment] {
        let report = self.add_images_with_report(files);
        if !report.skipped.is_empty() {
            tracing::debug!(
                accepted = report.accepted,
                skipped = report.skipped.len(),
                "some images were not attached"
            );
        }
        &self.items
    }

    /// Like [`add_images`](Self::add_images), reporting what was skipped
    pub fn add_images_with_report(
        &mut self,
        files: impl IntoIterator<Item = ImageBlob>,
    ) -> AddReport {
        let mut report = AddReport::default();

        for image in files {
            if let Some(reason) = self.limits.check(&image) {
                tracing::warn!(file_name = %image.file_name, ?reason, "image rejected");
                report.skipped.push(SkippedImage {
                    file_name: image.file_name,
                    reason,
                });
                continue;
            }
            if self.is_full() {
                report.skipped.push(SkippedImage {
                    file_name: image.file_name,
                    reason: SkipReason::OverLimit,
                });
                continue;
            }

            let preview = self.registry.acquire(&image.file_name, image.size());
            self.items.push(Attachment { image, preview });
            report.accepted += 1;
        }

        report
    }

    /// Remove the image at `index` and revoke its preview
    ///
    /// # Errors
    /// - `AttachmentError::OutOfRange` if `index >= len`; nothing changes
    pub fn remove_image(&mut self, index: usize) -> Result<ImageBlob, AttachmentError> {
        if index >= self.items.len() {
            return Err(AttachmentError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index).into_image())
    }

    /// Hand over all images, revoking their previews
    pub fn take_images(&mut self) -> Vec<ImageBlob> {
        self.items.drain(..).map(Attachment::into_image).collect()
    }

    /// Drop all images and previews
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.items
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.limits
            .max_count
            .is_some_and(|max| self.items.len() >= max)
    }

    #[inline]
    #[must_use]
    pub fn limits(&self) -> &AttachmentLimits {
        &self.limits
    }

    /// File names in order, for display
    #[must_use]
    pub fn file_names(&self) -> Vec<&str> {
        self.items.iter().map(|a| a.image.file_name.as_str()).collect()
    }
}
