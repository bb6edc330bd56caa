use crate::constants::DEFAULT_DELIVERY_QUALITY;
use crate::models::ResourceKind;

/// A derived variant the remote service generates from the original upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EagerTransform {
    /// Target width; height follows the aspect ratio.
    pub width: u32,
}

impl EagerTransform {
    pub fn scaled(width: u32) -> Self {
        Self { width }
    }

    /// Transformation directive in the service's URL syntax, e.g. `c_scale,w_1024`.
    pub fn directive(&self) -> String {
        format!("c_scale,w_{}", self.width)
    }
}

/// Options sent with one remote upload. Built fresh for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    pub resource_kind: ResourceKind,
    pub filename: String,
    pub content_type: String,
    pub folder: Option<String>,
    pub use_filename: bool,
    pub unique_filename: bool,
    pub overwrite: bool,
    pub quality: String,
    /// `Some(false)` forces synchronous processing on the remote side.
    pub deferred_processing: Option<bool>,
    pub eager: Vec<EagerTransform>,
    pub eager_async: bool,
}

impl UploadOptions {
    /// Base options shared by every destination.
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            resource_kind: ResourceKind::Auto,
            filename: filename.into(),
            content_type: content_type.into(),
            folder: None,
            use_filename: true,
            unique_filename: true,
            overwrite: true,
            quality: DEFAULT_DELIVERY_QUALITY.to_string(),
            deferred_processing: None,
            eager: Vec::new(),
            eager_async: false,
        }
    }

    pub fn with_folder(mut self, folder: Option<String>) -> Self {
        self.folder = folder;
        self
    }

    pub fn with_quality(mut self, quality: Option<String>) -> Self {
        if let Some(q) = quality.filter(|q| !q.trim().is_empty()) {
            self.quality = q;
        }
        self
    }

    /// Folder, if one was supplied and is not blank.
    pub fn qualified_folder(&self) -> Option<&str> {
        self.folder
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// Copy of these options with the folder qualifier removed.
    pub fn without_folder(&self) -> Self {
        Self {
            folder: None,
            ..self.clone()
        }
    }

    /// `|`-joined eager directives, or `None` when no variants are requested.
    pub fn eager_directive(&self) -> Option<String> {
        if self.eager.is_empty() {
            return None;
        }
        Some(
            self.eager
                .iter()
                .map(EagerTransform::directive)
                .collect::<Vec<_>>()
                .join("|"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_options() {
        let opts = UploadOptions::new("photo.jpg", "image/jpeg");
        assert_eq!(opts.resource_kind, ResourceKind::Auto);
        assert!(opts.use_filename && opts.unique_filename && opts.overwrite);
        assert_eq!(opts.quality, "auto:good");
        assert!(opts.folder.is_none());
        assert!(opts.eager_directive().is_none());
    }

    #[test]
    fn test_quality_override_ignores_blank() {
        let opts = UploadOptions::new("a.jpg", "image/jpeg").with_quality(Some("  ".to_string()));
        assert_eq!(opts.quality, "auto:good");
        let opts = UploadOptions::new("a.jpg", "image/jpeg").with_quality(Some("80".to_string()));
        assert_eq!(opts.quality, "80");
    }

    #[test]
    fn test_qualified_folder() {
        let blank = UploadOptions::new("a", "b").with_folder(Some("   ".to_string()));
        assert_eq!(blank.qualified_folder(), None);
        let course = UploadOptions::new("a", "b").with_folder(Some("course-101".to_string()));
        assert_eq!(course.qualified_folder(), Some("course-101"));
        assert!(course.without_folder().folder.is_none());
    }

    #[test]
    fn test_eager_directive() {
        let mut opts = UploadOptions::new("a", "b");
        opts.eager = vec![EagerTransform::scaled(1024), EagerTransform::scaled(480)];
        assert_eq!(
            opts.eager_directive().as_deref(),
            Some("c_scale,w_1024|c_scale,w_480")
        );
    }
}
