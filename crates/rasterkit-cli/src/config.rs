use {
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
    std::path::{Path, PathBuf},
    tap::prelude::*,
    tracing::info,
};

/// BC encoder defaults, overridable per-invocation with `--quality`/`--metric`.
#[derive(Debug, Clone, Serialize, Deserialize, derivative::Derivative)]
#[derivative(Default)]
#[serde(deny_unknown_fields)]
pub struct EncodeDefaults {
    #[derivative(Default(value = "\"high\".to_string()"))]
    pub quality: String,
    #[derivative(Default(value = "\"uniform\".to_string()"))]
    pub metric: String,
    pub weight_colour_by_alpha: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, derivative::Derivative)]
#[derivative(Default)]
#[serde(deny_unknown_fields)]
pub struct RasterkitConfig {
    pub encode: EncodeDefaults,
}

pub static CONFIG_FILE_NAME: &str = "rasterkit.yaml";

impl RasterkitConfig {
    pub fn write_default() -> Result<String> {
        Self::default()
            .pipe_ref(serde_yaml::to_string)
            .context("serializing default config")
    }

    /// Looks for `rasterkit.yaml` next to the given path (or the current directory if
    /// unset), falling back to defaults when no file is present.
    pub fn find(explicit: &Option<PathBuf>) -> Result<(Option<PathBuf>, Self)> {
        let candidate = explicit.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        if !candidate.exists() {
            return Ok((None, Self::default()));
        }
        Self::read(&candidate).map(|(path, config)| (Some(path), config))
    }

    fn read(path: &Path) -> Result<(PathBuf, Self)> {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading config at '{}'", path.display()))
            .and_then(|raw| serde_yaml::from_str(&raw).with_context(|| format!("parsing config at '{}'", path.display())))
            .tap_ok(|_: &Self| info!("loaded config from '{}'", path.display()))
            .map(|config| (path.to_owned(), config))
    }
}
