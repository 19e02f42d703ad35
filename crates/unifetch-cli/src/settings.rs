//! Client settings from config file, environment and flags

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::Args;
use config::{Config, ConfigError, Environment, File, Map};
use unifetch::ClientOptions;

/// Prefix of the environment variables read into [`ClientOptions`]
pub const ENV_PREFIX: &str = "UNIFETCH";

/// Client options given on the command line
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Prefix for relative request paths
    #[arg(long)]
    pub base_url: Option<String>,
    /// Request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Transport to send the request with (fetch, event, client)
    #[arg(long)]
    pub adapter: Option<String>,
    /// Response decoding (text, json, blob, arraybuffer)
    #[arg(long)]
    pub response_type: Option<String>,
    /// Extra header as 'Key: Value', may be repeated
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,
}

impl Overrides {
    /// Convert the flags into partial client options
    pub fn into_options(self) -> Result<ClientOptions> {
        let mut options = ClientOptions {
            base_url: self.base_url,
            timeout: self.timeout_ms,
            adapter: self.adapter,
            response_type: self.response_type.map(Into::into),
            headers: None,
        };

        for header in self.headers {
            let (key, value) = parse_header(&header)?;
            options = options.header(key, value);
        }

        Ok(options)
    }
}

fn parse_header(header: &str) -> Result<(&str, &str)> {
    let (key, value) = header
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid header '{}', expected 'Key: Value'", header))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("Invalid header '{}', name is empty", header));
    }

    Ok((key, value.trim()))
}

/// Layered settings: config file, then environment, then flags
#[derive(Debug, Default)]
pub struct Settings {
    config_file: Option<PathBuf>,
    env: Option<Map<String, String>>,
}

impl Settings {
    /// Settings reading `config_file` (if any) and the process environment
    pub fn new<P>(config_file: Option<P>) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            config_file: config_file.map(Into::into),
            env: None,
        }
    }

    /// Read environment variables from `env` instead of the process
    #[cfg(test)]
    fn with_env(mut self, env: Map<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Load the options, `overrides` taking precedence over every other source
    pub fn load(&self, overrides: ClientOptions) -> Result<ClientOptions, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = &self.config_file {
            builder = builder.add_source(File::from(path.as_path()));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(self.env.clone()),
            )
            .build()?;

        let options: ClientOptions = config.try_deserialize()?;
        if let Some(path) = self.config_file() {
            tracing::debug!("Loaded client options from {}", path.display());
        }

        Ok(options.merge(overrides))
    }

    /// Config file in use, if any
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }
}
