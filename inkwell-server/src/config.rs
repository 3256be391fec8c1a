use crate::error::{ConfigError, ConfigResult};
use std::net::SocketAddr;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_SKETCH_MODEL: &str = "heavylildude/magnus-frontend:latest";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorMode {
    /// Deterministic keyword layouts, no network.
    #[default]
    Rules,
    /// Hosted model providers.
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Local Ollama-compatible endpoint that describes sketches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriberConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_url: Option<String>,
    pub mode: GeneratorMode,
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub gemini: ProviderConfig,
    pub describer: Option<DescriberConfig>,
    /// `cdn` or a base URL serving the preview scripts.
    pub preview_assets: Option<String>,
}

impl ServerConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let provider = |key: &str, model: &str, default_model: &str, base: &str, default_base: &str| {
            ProviderConfig {
                api_key: get(key),
                model: get(model).unwrap_or_else(|| default_model.to_string()),
                base_url: get(base)
                    .unwrap_or_else(|| default_base.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            }
        };

        let addr_text = get("INKWELL_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_text
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddr(addr_text.clone()))?;

        let mode = match get("INKWELL_GENERATOR").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("rules") => GeneratorMode::Rules,
            Some("live") => GeneratorMode::Live,
            Some(other) => return Err(ConfigError::InvalidMode(other.to_string())),
        };

        let ollama_url = get("OLLAMA_BASE_URL");
        let sketch_model = get("SKETCH_MODEL");
        let describer = if ollama_url.is_some() || sketch_model.is_some() {
            Some(DescriberConfig {
                base_url: ollama_url
                    .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: sketch_model.unwrap_or_else(|| DEFAULT_SKETCH_MODEL.to_string()),
            })
        } else {
            None
        };

        Ok(ServerConfig {
            addr,
            database_url: get("DATABASE_URL"),
            mode,
            openai: provider(
                "OPENAI_API_KEY",
                "OPENAI_MODEL",
                DEFAULT_OPENAI_MODEL,
                "OPENAI_BASE_URL",
                OPENAI_BASE_URL,
            ),
            anthropic: provider(
                "ANTHROPIC_API_KEY",
                "ANTHROPIC_MODEL",
                DEFAULT_ANTHROPIC_MODEL,
                "ANTHROPIC_BASE_URL",
                ANTHROPIC_BASE_URL,
            ),
            gemini: provider(
                "GEMINI_API_KEY",
                "GEMINI_MODEL",
                DEFAULT_GEMINI_MODEL,
                "GEMINI_BASE_URL",
                GEMINI_BASE_URL,
            ),
            describer,
            preview_assets: get("INKWELL_PREVIEW_ASSETS"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ConfigResult<ServerConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.addr.to_string(), DEFAULT_ADDR);
        assert_eq!(cfg.mode, GeneratorMode::Rules);
        assert_eq!(cfg.openai.model, "gpt-4o-mini");
        assert_eq!(cfg.anthropic.model, "claude-3-5-sonnet-latest");
        assert_eq!(cfg.gemini.model, "gemini-1.5-pro");
        assert!(!cfg.openai.is_configured());
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.describer, None);
    }

    #[test]
    fn reads_providers_and_trims_base_urls() {
        let cfg = config(&[
            ("INKWELL_GENERATOR", "LIVE"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1/"),
            ("ANTHROPIC_API_KEY", "  "),
        ])
        .unwrap();
        assert_eq!(cfg.mode, GeneratorMode::Live);
        assert_eq!(cfg.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.openai.base_url, "http://localhost:9000/v1");
        assert!(!cfg.anthropic.is_configured());
    }

    #[test]
    fn describer_is_opt_in() {
        let cfg = config(&[("SKETCH_MODEL", "llava")]).unwrap();
        assert_eq!(
            cfg.describer,
            Some(DescriberConfig {
                base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
                model: "llava".to_string()
            })
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            config(&[("INKWELL_ADDR", "nowhere")]),
            Err(ConfigError::InvalidAddr("nowhere".into()))
        );
        assert_eq!(
            config(&[("INKWELL_GENERATOR", "magic")]),
            Err(ConfigError::InvalidMode("magic".into()))
        );
    }
}
