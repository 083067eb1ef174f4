use crate::error::Result;
use crate::readers::ReadMode;
use crate::utils::constants::{
    DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE, ENV_INPUT_FILE, ENV_OUTPUT_FILE, ENV_READ_MODE,
    ENV_WORKERS,
};
use config::{Config, Environment, Map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use validator::Validate;

/// Settings for one run, resolved from defaults, then environment, then CLI flags.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RunConfig {
    pub input_file: PathBuf,

    pub output_file: PathBuf,

    /// Explicit worker count; sized from the file when absent
    #[validate(range(min = 1))]
    pub workers: Option<usize>,

    pub read_mode: ReadMode,
}

/// Values given on the command line. `None` leaves the lower layers in effect.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub workers: Option<usize>,
    pub read_mode: Option<ReadMode>,
}

impl RunConfig {
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(&vars, overrides)
    }

    /// Resolve against an explicit set of environment variables.
    pub fn load_from(vars: &HashMap<String, String>, overrides: &ConfigOverrides) -> Result<Self> {
        let settings = Config::builder()
            .set_default("input_file", DEFAULT_INPUT_FILE)?
            .set_default("output_file", DEFAULT_OUTPUT_FILE)?
            .set_default("read_mode", "mmap")?
            // INPUT_FILE -> input_file, OUTPUT_FILE -> output_file
            .add_source(
                Environment::default().source(Some(pick(vars, &[ENV_INPUT_FILE, ENV_OUTPUT_FILE]))),
            )
            // STATS_WORKERS -> workers, STATS_READ_MODE -> read_mode
            .add_source(
                Environment::with_prefix("STATS")
                    .try_parsing(true)
                    .source(Some(pick(vars, &[ENV_WORKERS, ENV_READ_MODE]))),
            )
            .set_override_option("input_file", path_value(&overrides.input_file))?
            .set_override_option("output_file", path_value(&overrides.output_file))?
            .set_override_option("workers", overrides.workers.map(|w| w as i64))?
            .set_override_option("read_mode", overrides.read_mode.map(ReadMode::as_str))?
            .build()?;

        let config: RunConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

fn pick(vars: &HashMap<String, String>, names: &[&str]) -> Map<String, String> {
    names
        .iter()
        .filter_map(|name| vars.get(*name).map(|value| (name.to_string(), value.clone())))
        .collect()
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}
