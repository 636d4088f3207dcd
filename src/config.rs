//! Configuration for an extraction run.
//!
//! All behaviour is controlled through [`ExtractConfig`], built via its
//! [`ExtractConfigBuilder`]. Keeping every knob in one struct makes it easy
//! to share a config across documents and to diff two runs to understand why
//! their outputs differ.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};

/// Realistic browser User-Agent used for image downloads; some servers
/// reject unidentified clients outright.
pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Configuration for a document-to-Markdown extraction.
///
/// Built via [`ExtractConfig::builder()`] or [`ExtractConfig::default()`].
///
/// # Example
/// ```rust
/// use mdextract::{EnhanceLevel, ExtractConfig};
///
/// let config = ExtractConfig::builder()
///     .extract_images(false)
///     .enhance_level(EnhanceLevel::Binarized)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Run the OCR pipeline over embedded images. Default: true.
    ///
    /// Disabling this skips all network and tesseract activity for images;
    /// image tags simply contribute no text.
    pub extract_images: bool,

    /// Strip navigation, footers, forms and other page chrome before
    /// flattening HTML to text. Default: true.
    pub strip_non_content: bool,

    /// Image preprocessing tier applied before OCR. Default: [`EnhanceLevel::Scaled`].
    pub enhance_level: EnhanceLevel,

    /// Minimum per-word OCR confidence (0–100) for a word to be kept.
    /// Default: 60.0.
    ///
    /// Words at or below the threshold are discarded; words tesseract
    /// reports without a confidence (separators, layout rows) are skipped
    /// entirely, never treated as zero.
    pub ocr_confidence: f32,

    /// Emit `![](src)` for images that produced no alt text and no OCR
    /// text, instead of nothing. Default: false.
    pub include_empty_images: bool,

    /// Timeout for page and image fetches, in seconds. Default: 2.
    ///
    /// Deliberately short: a slow ad server must not stall the whole
    /// document, and every fetch failure is recoverable.
    pub fetch_timeout_secs: u64,

    /// User-Agent header sent with HTTP requests.
    pub user_agent: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            extract_images: true,
            strip_non_content: true,
            enhance_level: EnhanceLevel::default(),
            ocr_confidence: 60.0,
            include_empty_images: false,
            fetch_timeout_secs: 2,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ExtractConfig {
    /// Create a new builder for `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractConfig`].
#[derive(Debug)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn extract_images(mut self, v: bool) -> Self {
        self.config.extract_images = v;
        self
    }

    pub fn strip_non_content(mut self, v: bool) -> Self {
        self.config.strip_non_content = v;
        self
    }

    pub fn enhance_level(mut self, level: EnhanceLevel) -> Self {
        self.config.enhance_level = level;
        self
    }

    pub fn ocr_confidence(mut self, threshold: f32) -> Self {
        self.config.ocr_confidence = threshold;
        self
    }

    pub fn include_empty_images(mut self, v: bool) -> Self {
        self.config.include_empty_images = v;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractConfig, ExtractError> {
        let c = &self.config;
        if !(0.0..=100.0).contains(&c.ocr_confidence) {
            return Err(ExtractError::InvalidConfig(format!(
                "OCR confidence must be 0–100, got {}",
                c.ocr_confidence
            )));
        }
        if c.user_agent.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "User-Agent must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Preprocessing tier applied to an image before recognition.
///
/// Higher tiers help OCR on small or noisy source text at the cost of more
/// CPU per image. The thresholding in [`EnhanceLevel::Binarized`] can hurt
/// anti-aliased screenshots, which is why it is not the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnhanceLevel {
    /// No preprocessing; OCR runs on the decoded bitmap as-is.
    Off,
    /// 6× Lanczos upscale, grayscale, contrast boost. (default)
    #[default]
    Scaled,
    /// [`EnhanceLevel::Scaled`] plus Gaussian blur, binary threshold and a
    /// light median denoise.
    Binarized,
}

impl EnhanceLevel {
    /// Map the historical numeric levels (0/1/2) onto the enum.
    /// Anything above 2 saturates at the highest tier.
    pub fn from_numeric(level: u8) -> Self {
        match level {
            0 => EnhanceLevel::Off,
            1 => EnhanceLevel::Scaled,
            _ => EnhanceLevel::Binarized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = ExtractConfig::builder().build().unwrap();
        assert!(c.extract_images);
        assert!(c.strip_non_content);
        assert_eq!(c.enhance_level, EnhanceLevel::Scaled);
        assert_eq!(c.ocr_confidence, 60.0);
        assert_eq!(c.fetch_timeout_secs, 2);
    }

    #[test]
    fn confidence_out_of_range_rejected() {
        let err = ExtractConfig::builder().ocr_confidence(120.0).build();
        assert!(matches!(err, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn timeout_clamped_to_at_least_one_second() {
        let c = ExtractConfig::builder().fetch_timeout_secs(0).build().unwrap();
        assert_eq!(c.fetch_timeout_secs, 1);
    }

    #[test]
    fn numeric_levels_map_onto_tiers() {
        assert_eq!(EnhanceLevel::from_numeric(0), EnhanceLevel::Off);
        assert_eq!(EnhanceLevel::from_numeric(1), EnhanceLevel::Scaled);
        assert_eq!(EnhanceLevel::from_numeric(2), EnhanceLevel::Binarized);
        assert_eq!(EnhanceLevel::from_numeric(9), EnhanceLevel::Binarized);
    }
}
