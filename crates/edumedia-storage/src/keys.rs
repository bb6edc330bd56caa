//! Public id handling shared by the backends and the deletion client.
//!
//! Delivery URL layout: `{base}/{kind}/upload/[v{version}/]{public_id}.{ext}`.

use edumedia_core::ResourceKind;
use url::Url;

use crate::traits::{StorageError, StorageResult};

/// Identity of a stored resource recovered from its delivery URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    pub public_id: String,
    pub resource_kind: ResourceKind,
}

fn is_version_segment(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// `c_scale,w_480`, `q_auto` and similar delivery transformations
fn is_transformation_segment(segment: &str) -> bool {
    if segment.contains(',') {
        return true;
    }
    match segment.split_once('_') {
        Some((key, value)) => {
            (1..=3).contains(&key.len())
                && key.chars().all(|c| c.is_ascii_lowercase())
                && !value.is_empty()
        }
        None => false,
    }
}

/// Recover the public id and resource kind from a delivery URL.
///
/// Takes everything after the `upload` segment, drops a leading version
/// segment (optionally preceded by transformations), and strips the file
/// extension of the last segment. The kind is read from the segment before
/// `upload` and defaults to image. Returns `None` when the URL does not
/// parse, has no `upload` segment, or nothing follows it.
pub fn parse_resource_url(url: &str) -> Option<ResourceLocator> {
    let parsed = Url::parse(url.trim()).ok()?;
    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    let upload_idx = segments.iter().position(|s| *s == "upload")?;

    let resource_kind = upload_idx
        .checked_sub(1)
        .and_then(|i| segments.get(i))
        .and_then(|s| match *s {
            "video" => Some(ResourceKind::Video),
            "raw" => Some(ResourceKind::Raw),
            _ => None,
        })
        .unwrap_or(ResourceKind::Image);

    let mut rest = &segments[upload_idx + 1..];
    let transformations = rest
        .iter()
        .take_while(|s| is_transformation_segment(s))
        .count();
    // A `v<digits>` segment only counts as the version when it leads the id.
    if rest.get(transformations).is_some_and(|s| is_version_segment(s)) {
        rest = &rest[transformations + 1..];
    }
    if rest.is_empty() {
        return None;
    }

    let joined = rest.join("/");
    let last_segment_start = joined.rfind('/').map(|i| i + 1).unwrap_or(0);
    let public_id = match joined[last_segment_start..].rfind('.') {
        Some(dot) if dot > 0 => &joined[..last_segment_start + dot],
        _ => joined.as_str(),
    };

    let public_id = urlencoding::decode(public_id)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| public_id.to_string());

    if public_id.is_empty() {
        return None;
    }

    Some(ResourceLocator {
        public_id,
        resource_kind,
    })
}

/// Public id derived from an uploaded filename: the stem, restricted to a
/// URL-safe alphabet.
pub fn public_id_from_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Reject public ids and folders that could escape a storage root.
pub fn validate_public_id(public_id: &str) -> StorageResult<()> {
    if public_id.is_empty()
        || public_id.contains("..")
        || public_id.starts_with('/')
        || public_id.contains('\\')
    {
        return Err(StorageError::InvalidKey(format!(
            "Public id contains invalid characters: {}",
            public_id
        )));
    }
    Ok(())
}
