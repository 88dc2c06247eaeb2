//! Runtime configuration, read from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::U256;
use eyre::{eyre, Result};

use crate::arb::optimizer::{SearchParams, MIN_SEARCH_INTERVALS};

/// Scenario used when `LSTARB_SCENARIO` is not set
pub const DEFAULT_SCENARIO: &str = "scenarios/lst-weth.json";

/// Settings for one run of the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scenario JSON to deploy
    pub scenario: PathBuf,
    /// Extra log destination
    pub log_file: Option<PathBuf>,
    /// Optimizer settings
    pub search: SearchParams,
}

impl Config {
    /// Builds the configuration from environment variables.
    ///
    /// # Returns
    /// * `Result<Self>` - The configuration or an error
    ///
    /// # Errors
    /// * If a numeric variable does not parse
    /// * If `LSTARB_SEARCH_INTERVALS` is below [`MIN_SEARCH_INTERVALS`]
    ///
    /// # Environment Variables
    /// * `LSTARB_SCENARIO` - Scenario path, defaults to [`DEFAULT_SCENARIO`]
    /// * `LSTARB_LOG_FILE` - Optional log file
    /// * `LSTARB_SEARCH_INTERVALS` - Grid intervals per round, at least 3, defaults to 10
    /// * `LSTARB_SEARCH_TOLERANCE` - Bracket width to stop at, in wei
    /// * `LSTARB_SEARCH_CEILING` - Largest amount tried, in wei
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = SearchParams::default();
        let intervals = parse(&lookup, "LSTARB_SEARCH_INTERVALS")?.unwrap_or(defaults.intervals);
        if intervals < MIN_SEARCH_INTERVALS {
            return Err(eyre!(
                "invalid LSTARB_SEARCH_INTERVALS={intervals}: need at least {MIN_SEARCH_INTERVALS}"
            ));
        }
        Ok(Self {
            scenario: lookup("LSTARB_SCENARIO")
                .map_or_else(|| PathBuf::from(DEFAULT_SCENARIO), PathBuf::from),
            log_file: lookup("LSTARB_LOG_FILE")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            search: SearchParams {
                intervals,
                tolerance: parse::<U256>(&lookup, "LSTARB_SEARCH_TOLERANCE")?
                    .unwrap_or(defaults.tolerance),
                ceiling: parse::<U256>(&lookup, "LSTARB_SEARCH_CEILING")?.unwrap_or(defaults.ceiling),
            },
        })
    }
}

/// Parses `key` if it is set.
fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|err| eyre!("invalid {key}={raw}: {err}"))
        })
        .transpose()
}
