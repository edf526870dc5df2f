use self::{cli::Cli, path::ConfigPath};
use anyhow::{ensure, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::env;

mod cli;
pub(crate) mod path;

pub(crate) const CONFIG_ENV_VAR: &str = "UPLOADCONFIG_CONFIG";
const DEFAULT_ETCD_PREFIX: &str = "/registry";

/// All parsed CLI arguments, coalesced into a single struct for convenience
#[derive(serde::Serialize)]
pub(crate) struct UploaderConfig {
    pub(crate) dry_run: bool,
    pub(crate) etcd_endpoint: String,
    pub(crate) etcd_prefix: String,
    pub(crate) master_configuration: ConfigPath,
    pub(crate) node_name: Option<String>,
    pub(crate) threads: Option<usize>,
    pub(crate) summary_file: Option<ConfigPath>,

    pub(crate) config_file_raw: Option<String>,
    pub(crate) cli_raw: Option<String>,
}

impl UploaderConfig {
    pub(crate) fn parse_from_config_file(config_bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_yaml::from_slice(config_bytes)?;

        let mut value = value.as_object().context("config file must be a YAML object")?.clone();

        let dry_run = value
            .remove("dry_run")
            .unwrap_or(Value::Bool(false))
            .as_bool()
            .context("dry_run must be a boolean")?;

        let etcd_endpoint = value
            .remove("etcd_endpoint")
            .context("etcd_endpoint must be set")?
            .as_str()
            .context("etcd_endpoint must be a string")?
            .to_string();

        let etcd_prefix = match value.remove("etcd_prefix") {
            Some(value) => value.as_str().context("etcd_prefix must be a string")?.to_string(),
            None => DEFAULT_ETCD_PREFIX.to_string(),
        };

        let master_configuration = {
            let value = value.remove("master_configuration").context("master_configuration must be set")?;
            let path = value.as_str().context("master_configuration must be a string")?;
            ConfigPath::existing_file(path).context("master_configuration")?
        };

        let node_name = match value.remove("node_name") {
            Some(value) => Some(value.as_str().context("node_name must be a string")?.to_string()),
            None => None,
        };

        let threads = match value.remove("threads") {
            Some(value) => Some(
                value
                    .as_u64()
                    .context("threads must be an integer")?
                    .try_into()
                    .context("threads must be an integer")?,
            ),
            None => None,
        };

        let summary_file = match value.remove("summary_file") {
            Some(value) => {
                let path = value.as_str().context("summary_file must be a string")?;
                Some(ConfigPath::new(path).with_context(|| format!("summary_file {}", path))?)
            }
            None => None,
        };

        ensure!(
            value.is_empty(),
            "unknown keys {:?} in config file",
            value.keys().map(|key| key.to_string()).collect::<Vec<String>>().join(", ")
        );

        Ok(Self {
            dry_run,
            etcd_endpoint,
            etcd_prefix,
            master_configuration,
            node_name,
            threads,
            summary_file,

            cli_raw: None,
            config_file_raw: Some(String::from_utf8_lossy(config_bytes).to_string()),
        })
    }

    pub(crate) fn parse_from_cli(cli: Cli) -> Result<Self> {
        Ok(Self {
            dry_run: cli.dry_run,
            etcd_endpoint: cli.etcd_endpoint,
            etcd_prefix: cli.etcd_prefix,
            master_configuration: ConfigPath::from(cli.master_configuration),
            node_name: cli.node_name,
            threads: cli.threads,
            summary_file: cli.summary_file.map(ConfigPath::from),

            config_file_raw: None,
            cli_raw: Some(serde_json::to_string(&env::args().collect::<Vec<String>>())?),
        })
    }

    pub(crate) fn new() -> Result<Self> {
        Ok(match env::var(CONFIG_ENV_VAR) {
            Ok(var) => {
                let num_args = env::args().len();

                ensure!(
                    num_args == 1,
                    "{CONFIG_ENV_VAR} is set, but there are {num_args} CLI arguments. {CONFIG_ENV_VAR} is meant to be used with no arguments."
                );

                Self::parse_from_config_file(&std::fs::read(&var).context(format!("reading {} file {}", CONFIG_ENV_VAR, var))?)
                    .context(format!("parsing {} file {}", CONFIG_ENV_VAR, var))?
            }
            Err(_) => Self::parse_from_cli(Cli::parse()).context("CLI parsing")?,
        })
    }
}
