use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

/// Face bounding box in coordinates relative to the full image, [0, 1].
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Landmark point in coordinates relative to the face bounding box.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Face {
    pub bbox: BoundingBox,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

/// External detection capability. Detection and landmark extraction are a
/// black box behind this boundary; the rest of the crate only consumes
/// relative geometry.
#[async_trait]
pub trait FaceEngine: Send + Sync {
    async fn detect(&self, image: Bytes) -> anyhow::Result<Vec<Face>>;
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    faces: Vec<Face>,
}

/// Client for a detector sidecar speaking `POST /detect`.
pub struct HttpFaceEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFaceEngine {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FaceEngine for HttpFaceEngine {
    async fn detect(&self, image: Bytes) -> anyhow::Result<Vec<Face>> {
        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .context("face engine request")?
            .error_for_status()
            .context("face engine status")?;
        let parsed: DetectResponse = response.json().await.context("face engine response")?;
        debug!(faces = parsed.faces.len(), "detection complete");
        Ok(parsed.faces)
    }
}
