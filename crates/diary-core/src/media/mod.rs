//! Image uploads to the external asset host.
//!
//! `AssetUploadPipeline` turns an ordered batch of local image selections
//! into an ordered list of public asset URLs, or fails the whole batch.
//! A failed or cancelled batch discards whatever it already uploaded.

mod host;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::models::ImageSelection;
use crate::{Error, Result};

pub use host::HttpAssetHost;

/// An asset stored on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Public URL recorded in the entry's media list.
    pub url: String,
    /// Host-issued token that allows deleting the asset without credentials.
    pub delete_token: Option<String>,
}

/// Storage service for uploaded images.
pub trait AssetHost {
    fn upload(&self, image: &ImageSelection)
        -> impl Future<Output = Result<UploadedAsset>> + Send;

    /// Delete a previously uploaded asset.
    fn discard(&self, asset: &UploadedAsset) -> impl Future<Output = Result<()>> + Send;
}

/// An absent host rejects every upload, so image-free entries still work
/// without asset host configuration.
impl<H: AssetHost + Sync> AssetHost for Option<H> {
    async fn upload(&self, image: &ImageSelection) -> Result<UploadedAsset> {
        match self {
            Some(host) => host.upload(image).await,
            None => Err(Error::Config(format!(
                "cannot upload {}: asset host is not configured",
                image.file_name
            ))),
        }
    }

    async fn discard(&self, asset: &UploadedAsset) -> Result<()> {
        match self {
            Some(host) => host.discard(asset).await,
            None => Ok(()),
        }
    }
}

/// Lifecycle of one image within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Pending,
    Uploading,
    Succeeded(String),
    Failed(String),
}

/// One image of the batch currently being submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask<'a> {
    pub index: usize,
    pub source: &'a ImageSelection,
    pub state: UploadState,
}

/// Sequential, fail-fast uploader with best-effort rollback.
#[derive(Debug, Clone)]
pub struct AssetUploadPipeline<H: AssetHost> {
    host: H,
}

impl<H: AssetHost> AssetUploadPipeline<H> {
    pub const fn new(host: H) -> Self {
        Self { host }
    }

    /// Upload `selections` one at a time, in order.
    ///
    /// `output[i]` is the URL of `selections[i]`. The first failure aborts the
    /// batch; assets uploaded before it are discarded on a best-effort basis.
    pub async fn upload_all(&self, selections: &[ImageSelection]) -> Result<Vec<String>> {
        self.upload_all_observed(selections, &CancellationToken::new(), |_| {})
            .await
    }

    /// Same as [`Self::upload_all`], reporting every task state change and
    /// stopping with `Cancelled` once `cancel` fires.
    pub async fn upload_all_observed(
        &self,
        selections: &[ImageSelection],
        cancel: &CancellationToken,
        mut observer: impl FnMut(&UploadTask<'_>),
    ) -> Result<Vec<String>> {
        if selections.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!("Uploading {} image(s)", selections.len());
        let mut tasks: Vec<UploadTask<'_>> = selections
            .iter()
            .enumerate()
            .map(|(index, source)| UploadTask {
                index,
                source,
                state: UploadState::Pending,
            })
            .collect();
        let mut uploaded: Vec<UploadedAsset> = Vec::with_capacity(selections.len());

        for task in &mut tasks {
            task.state = UploadState::Uploading;
            observer(task);

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                result = self.host.upload(task.source) => Some(result),
            };

            match outcome {
                Some(Ok(asset)) => {
                    tracing::debug!("Uploaded {} -> {}", task.source.file_name, asset.url);
                    task.state = UploadState::Succeeded(asset.url.clone());
                    observer(task);
                    uploaded.push(asset);
                }
                Some(Err(error)) => {
                    let server_message = error.server_message().map(ToString::to_string);
                    let message = server_message
                        .clone()
                        .unwrap_or_else(|| error.to_string());
                    tracing::warn!(
                        "Upload of {} failed, aborting batch: {}",
                        task.source.file_name,
                        message
                    );
                    task.state = UploadState::Failed(message.clone());
                    observer(task);
                    self.discard_uploaded(&uploaded).await;
                    return Err(Error::Upload {
                        index: task.index,
                        message,
                        server_message,
                    });
                }
                None => {
                    tracing::info!(
                        "Upload batch cancelled at {}",
                        task.source.file_name
                    );
                    task.state = UploadState::Failed(Error::Cancelled.to_string());
                    observer(task);
                    self.discard_uploaded(&uploaded).await;
                    return Err(Error::Cancelled);
                }
            }
        }

        Ok(uploaded.into_iter().map(|asset| asset.url).collect())
    }

    async fn discard_uploaded(&self, uploaded: &[UploadedAsset]) {
        for asset in uploaded {
            if asset.delete_token.is_none() {
                tracing::warn!("No delete token for {}; asset left on host", asset.url);
                continue;
            }
            match self.host.discard(asset).await {
                Ok(()) => tracing::info!("Discarded orphaned asset {}", asset.url),
                Err(error) => {
                    tracing::warn!("Failed to discard orphaned asset {}: {}", asset.url, error);
                }
            }
        }
    }
}
