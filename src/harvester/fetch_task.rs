//! Fetch task: downloads one job's URL, classifies it and reports the image.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::probe::ImageProbe;
use crate::provenance::ProvenanceClassifier;
use crate::sink::ResultSink;
use crate::types::{Event, ImageId, Job};

/// Shared context for the jobs of one run
pub(crate) struct FetchTaskContext {
    pub(crate) client: reqwest::Client,
    pub(crate) sink: Arc<ResultSink>,
    pub(crate) classifier: ProvenanceClassifier,
    pub(crate) probe: Arc<dyn ImageProbe>,
    /// Cancelled by `stop`
    pub(crate) cancel_token: CancellationToken,
}

/// Whether a Content-Type header value names an image media type
///
/// Case-insensitive; parameters such as `; charset=` are ignored.
pub(crate) fn is_image_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .map(|media| media.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

/// Fetch a single job
///
/// On success the bytes are cached under a fresh [`ImageId`] and an
/// `Image` event is pushed. Cancellation is honoured while waiting on
/// the network; once the body is in memory the job runs to completion.
pub(crate) async fn fetch_one(ctx: &FetchTaskContext, job: &Job) -> Result<ImageId, FetchError> {
    let response = tokio::select! {
        biased;
        _ = ctx.cancel_token.cancelled() => return Err(FetchError::Cancelled),
        response = ctx.client.get(&job.url).send() => response?,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();
    if !is_image_content_type(&content_type) {
        return Err(FetchError::NotAnImage { content_type });
    }

    let body = tokio::select! {
        biased;
        _ = ctx.cancel_token.cancelled() => return Err(FetchError::Cancelled),
        body = response.bytes() => body?,
    };

    let classification = ctx.classifier.classify(&body);
    let dimensions = ctx.probe.probe_dimensions(&body)?;

    tracing::debug!(
        url = %job.url,
        bytes = body.len(),
        resolution = %dimensions,
        recognized = classification.recognized,
        "Image fetched"
    );

    let id = ImageId::new();
    ctx.sink.put_bytes(id, body);
    ctx.sink.push(Event::Image {
        id,
        title: job.title(),
        url: job.url.clone(),
        resolution: dimensions.to_string(),
        is_recognized_source: classification.recognized,
        tokens: job.tokens.clone(),
    });

    Ok(id)
}
