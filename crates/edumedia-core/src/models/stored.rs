use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Resource kind as understood by the remote media service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Video,
    Raw,
    #[default]
    Auto,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
            ResourceKind::Raw => "raw",
            ResourceKind::Auto => "auto",
        }
    }

    /// Best guess from a MIME type, used where the service cannot auto-detect.
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.trim().to_lowercase();
        if ct.starts_with("image/") {
            ResourceKind::Image
        } else if ct.starts_with("video/") || ct.starts_with("audio/") {
            ResourceKind::Video
        } else {
            ResourceKind::Raw
        }
    }
}

impl FromStr for ResourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(ResourceKind::Image),
            "video" => Ok(ResourceKind::Video),
            "raw" => Ok(ResourceKind::Raw),
            "auto" => Ok(ResourceKind::Auto),
            _ => Err(anyhow::anyhow!("Invalid resource kind: {}", s)),
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Result of a successful upload. Created once per upload and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObjectDescriptor {
    pub secure_url: String,
    pub public_id: String,
    pub format: String,
    pub resource_kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}
