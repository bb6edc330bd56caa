//! Per-folder upload policies.
//!
//! Rules are plain data checked in order; the first matching rule decides.
//! Adding a destination category means adding a rule, not a code path.

use edumedia_core::constants::{CHAT_IMAGES_FOLDER, COURSE_FOLDER_MARKER, COURSE_VARIANT_WIDTHS};
use edumedia_core::{EagerTransform, UploadOptions};

/// How a rule selects folders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderMatcher {
    Exact(String),
    Contains(String),
}

impl FolderMatcher {
    pub fn matches(&self, folder: &str) -> bool {
        match self {
            FolderMatcher::Exact(name) => folder == name,
            FolderMatcher::Contains(needle) => folder.contains(needle.as_str()),
        }
    }
}

/// Options a destination adds on top of the base upload options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationPolicy {
    /// `Some(false)` forces the service to finish processing before responding
    pub deferred_processing: Option<bool>,
    /// Derived-width variants to generate
    pub eager: Vec<EagerTransform>,
    /// Generate `eager` variants after the upload call has returned
    pub eager_async: bool,
}

impl DestinationPolicy {
    /// Chat needs the final URL in the response.
    pub fn synchronous() -> Self {
        Self {
            deferred_processing: Some(false),
            ..Default::default()
        }
    }

    /// Responsive variants at the given widths, generated in the background.
    pub fn responsive(widths: &[u32]) -> Self {
        Self {
            eager: widths.iter().copied().map(EagerTransform::scaled).collect(),
            eager_async: true,
            ..Default::default()
        }
    }

    pub fn apply(&self, options: &mut UploadOptions) {
        if self.deferred_processing.is_some() {
            options.deferred_processing = self.deferred_processing;
        }
        if !self.eager.is_empty() {
            options.eager = self.eager.clone();
            options.eager_async = self.eager_async;
        }
    }
}

#[derive(Debug, Clone)]
struct DestinationRule {
    matcher: FolderMatcher,
    policy: DestinationPolicy,
}

/// Ordered folder rules
#[derive(Debug, Clone)]
pub struct DestinationRegistry {
    rules: Vec<DestinationRule>,
}

impl Default for DestinationRegistry {
    /// Chat images are processed synchronously; anything under a course
    /// folder gets 1024/768/480 px variants.
    fn default() -> Self {
        Self::empty()
            .with_rule(
                FolderMatcher::Exact(CHAT_IMAGES_FOLDER.to_string()),
                DestinationPolicy::synchronous(),
            )
            .with_rule(
                FolderMatcher::Contains(COURSE_FOLDER_MARKER.to_string()),
                DestinationPolicy::responsive(&COURSE_VARIANT_WIDTHS),
            )
    }
}

impl DestinationRegistry {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, matcher: FolderMatcher, policy: DestinationPolicy) -> Self {
        self.rules.push(DestinationRule { matcher, policy });
        self
    }

    pub fn policy_for(&self, folder: Option<&str>) -> Option<&DestinationPolicy> {
        let folder = folder?;
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(folder))
            .map(|rule| &rule.policy)
    }

    /// Apply the policy of the options' folder, if any rule matches.
    pub fn apply(&self, options: &mut UploadOptions) {
        if let Some(policy) = self.policy_for(options.qualified_folder()) {
            policy.apply(options);
        }
    }
}
