use serde::Deserialize;
use std::{collections::HashMap, path::Path};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Configuration {
    pub network: Option<NetworkConfiguration>,
    pub site: Option<SiteConfiguration>,
    pub rewrite: Option<RewriteConfiguration>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NetworkConfiguration {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Static content served behind the rewrite middleware.
#[derive(Deserialize, Debug, Clone)]
pub struct SiteConfiguration {
    pub path: Option<String>,
    pub remote_path: Option<String>,
    pub index: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RewriteConfiguration {
    /// Inline Apache-style directives.
    pub rules: Option<String>,
    /// Files holding Apache-style directives.
    pub apache: Option<Vec<String>>,
    /// Files holding an IIS `<rewrite>` section, `web.config` included.
    pub iis: Option<Vec<String>>,
    /// Rewrite maps superseding the maps declared in the IIS files.
    pub maps: Option<HashMap<String, RewriteMapConfiguration>>,
    pub server_name: Option<String>,
    pub match_timeout_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RewriteMapConfiguration {
    pub default_value: Option<String>,
    #[serde(default)]
    pub entries: HashMap<String, String>,
}

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    /// Pick the format from the file extension, yaml unless `.toml`.
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

pub fn parse_configuration(
    content: &str,
    format: Format,
) -> Result<Configuration, Box<dyn std::error::Error + Send + Sync>> {
    let config = match format {
        Format::Yaml => serde_yaml::from_str::<Configuration>(content)?,
        Format::Toml => toml::from_str::<Configuration>(content)?,
    };
    Ok(config)
}

pub async fn load_configuration(
    path: &str,
) -> Result<Configuration, Box<dyn std::error::Error + Send + Sync>> {
    let res = tokio::fs::read_to_string(path).await?;
    parse_configuration(&res, Format::from_path(path))
}
