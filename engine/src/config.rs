use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};
use thiserror::Error;

use didactic_catalog::{CatalogCache, CatalogSource};
use didactic_types::Locale;

use crate::atomic_write::atomic_write;
use crate::routing::RoutingPolicy;

/// Contents of `~/.didactic/config.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct DidacticConfig {
    pub app: Option<AppConfig>,
    pub catalog: Option<CatalogConfig>,
    pub routing: Option<RoutingConfig>,
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Default locale (`nl` or `en`).
    pub locale: Option<String>,
}

/// Rule document overrides. Bundled catalogs are used for unset locales.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
    pub nl: Option<String>,
    pub en: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoutingConfig {
    pub directive_prefix: Option<String>,
    /// Characters.
    pub length_threshold: Option<usize>,
    /// Prior messages in the conversation.
    pub depth_threshold: Option<usize>,
    pub fast_model: Option<String>,
    pub deep_model: Option<String>,
    /// `0` disables the reasoning budget for the deep tier.
    pub deep_thinking_budget: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportConfig {
    pub dir: Option<String>,
}

/// Expand `${VAR}` references. Unset variables expand to nothing; an
/// unclosed `${` is kept literally.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// [`expand_env_vars`], then a leading `~/` becomes the home directory.
pub fn expand_path(value: &str) -> PathBuf {
    let expanded = expand_env_vars(value.trim());
    if let Some(rest) = expanded.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(expanded)
}

impl DidacticConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file is `Ok(None)`.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Configured default locale. Unknown values fall back to Dutch.
    #[must_use]
    pub fn locale(&self) -> Locale {
        let Some(raw) = self.app.as_ref().and_then(|app| app.locale.as_deref()) else {
            return Locale::default();
        };
        Locale::parse(raw).unwrap_or_else(|err| {
            tracing::warn!("{err}; using {}", Locale::default());
            Locale::default()
        })
    }

    /// Routing thresholds with defaults for everything unset.
    #[must_use]
    pub fn routing_policy(&self) -> RoutingPolicy {
        let mut policy = RoutingPolicy::default();
        let Some(routing) = &self.routing else {
            return policy;
        };
        if let Some(prefix) = &routing.directive_prefix {
            policy.directive_prefix.clone_from(prefix);
        }
        if let Some(threshold) = routing.length_threshold {
            policy.length_threshold = threshold;
        }
        if let Some(threshold) = routing.depth_threshold {
            policy.depth_threshold = threshold;
        }
        if let Some(model) = &routing.fast_model {
            policy.fast_model.clone_from(model);
        }
        if let Some(model) = &routing.deep_model {
            policy.deep_model.clone_from(model);
        }
        if let Some(budget) = routing.deep_thinking_budget {
            policy.deep_thinking_budget = (budget > 0).then_some(budget);
        }
        if let Some(temperature) = routing.temperature {
            policy.temperature = temperature;
        }
        policy
    }

    /// Where the rule document for `locale` comes from.
    #[must_use]
    pub fn catalog_source(&self, locale: Locale) -> CatalogSource {
        let configured = self.catalog.as_ref().and_then(|catalog| match locale {
            Locale::Nl => catalog.nl.as_deref(),
            Locale::En => catalog.en.as_deref(),
        });
        match configured {
            Some(path) if !path.trim().is_empty() => CatalogSource::File(expand_path(path)),
            _ => CatalogSource::Bundled,
        }
    }

    /// A catalog cache wired to the configured sources.
    #[must_use]
    pub fn catalog_cache(&self) -> CatalogCache {
        Locale::all()
            .iter()
            .fold(CatalogCache::new(), |cache, &locale| {
                cache.with_source(locale, self.catalog_source(locale))
            })
    }

    /// Directory for snapshot exports.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .as_ref()
            .and_then(|export| export.dir.as_deref())
            .filter(|dir| !dir.trim().is_empty())
            .map(expand_path)
            .unwrap_or_else(default_export_dir)
    }

    /// Persist the default locale to the config file.
    ///
    /// Uses `toml_edit` to preserve comments and formatting.
    /// Creates the config file and parent directory if they don't exist.
    pub fn persist_locale(locale: Locale) -> std::io::Result<PathBuf> {
        let path = match config_path() {
            Some(path) => path,
            None => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not determine config path",
                ));
            }
        };
        persist_locale_at(&path, locale)?;
        Ok(path)
    }
}

/// [`DidacticConfig::persist_locale`] against an explicit file.
pub fn persist_locale_at(path: &Path, locale: Locale) -> std::io::Result<()> {
    // Load existing config or create empty document
    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    if !doc.contains_key("app") {
        doc["app"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["app"]["locale"] = toml_edit::value(locale.as_str());

    atomic_write(path, doc.to_string().as_bytes())?;
    tracing::info!(path = %path.display(), locale = %locale, "persisted default locale");
    Ok(())
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".didactic").join("config.toml"))
}

fn default_export_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".didactic").join("exports"))
        .unwrap_or_else(|| PathBuf::from(".didactic").join("exports"))
}
