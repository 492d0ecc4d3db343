//! Configuration for a CV review session.
//!
//! Every knob lives in [`ReviewConfig`], built via [`ReviewConfigBuilder`] or
//! loaded from the environment with [`ReviewConfig::from_env`]. The only value
//! without a default is the API key.

use crate::error::ConfigError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Environment variable holding the API key used for OCR (and, with the
/// default provider, for chat).
pub const API_KEY_VAR: &str = "MISTRAL_API_KEY";

pub const DEFAULT_API_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_OCR_MODEL: &str = "mistral-ocr-latest";
pub const DEFAULT_CHAT_PROVIDER: &str = "mistral";
pub const DEFAULT_CHAT_MODEL: &str = "mistral-medium-2505";

/// Configuration for a review session.
///
/// # Example
/// ```rust
/// use cv_review::ReviewConfig;
///
/// let config = ReviewConfig::builder()
///     .api_key("sk-test")
///     .chat_model("mistral-large-latest")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.temperature, 0.0);
/// ```
#[derive(Clone)]
pub struct ReviewConfig {
    /// Bearer token for the OCR endpoint. Never printed by `Debug`.
    pub api_key: String,

    /// Base URL of the OCR API; `/ocr` is appended. Default: Mistral's public API.
    pub api_base_url: String,

    /// OCR model identifier. Default: `mistral-ocr-latest`.
    pub ocr_model: String,

    /// Ask the OCR service to return extracted images inline. Default: true.
    pub include_image_base64: bool,

    /// edgequake-llm provider name used for chat. Default: `mistral`.
    pub chat_provider: String,

    /// Chat model identifier. Default: `mistral-medium-2505`.
    pub chat_model: String,

    /// Sampling temperature for every chat call. Default: 0.0.
    ///
    /// Zero keeps the review reproducible for a given CV and question.
    pub temperature: f32,

    /// Optional cap on reply length. Default: provider default.
    pub max_tokens: Option<usize>,

    /// Timeout applied to each remote call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Optional progress callback for spinners and logs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            include_image_base64: true,
            chat_provider: DEFAULT_CHAT_PROVIDER.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            api_timeout_secs: 60,
            system_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base_url", &self.api_base_url)
            .field("ocr_model", &self.ocr_model)
            .field("include_image_base64", &self.include_image_base64)
            .field("chat_provider", &self.chat_provider)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ReviewProgressCallback>"),
            )
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl ReviewConfig {
    /// Create a new builder for `ReviewConfig`.
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder {
            config: Self::default(),
        }
    }

    /// Builder pre-filled with the API key from the environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Fails with [`ConfigError::MissingCredential`] when `MISTRAL_API_KEY`
    /// is unset or empty.
    pub fn from_env() -> Result<ReviewConfigBuilder, ConfigError> {
        dotenvy::dotenv().ok();

        let key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential { var: API_KEY_VAR })?;

        Ok(Self::builder().api_key(key))
    }
}

/// Builder for [`ReviewConfig`].
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
}

impl fmt::Debug for ReviewConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ReviewConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = model.into();
        self
    }

    pub fn include_image_base64(mut self, v: bool) -> Self {
        self.config.include_image_base64 = v;
        self
    }

    pub fn chat_provider(mut self, name: impl Into<String>) -> Self {
        self.config.chat_provider = name.into();
        self
    }

    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.config.chat_model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReviewConfig, ConfigError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential { var: API_KEY_VAR });
        }
        if c.api_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.ocr_model.trim().is_empty() || c.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Model identifiers must not be empty".into(),
            ));
        }
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        if matches!(c.max_tokens, Some(0)) {
            return Err(ConfigError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
