use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// Pure-Rust branch-and-bound MILP solver, driven through `good_lp`.
    #[default]
    #[serde(rename = "microlp")]
    MicroLp,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "microlp" => Ok(Self::MicroLp),
            other => Err(Error::SolverUnavailable {
                reason: format!("unknown solver backend `{other}`"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub backend: BackendKind,
    /// Wall-clock limit per optimization, forwarded to backends that support one.
    pub time_limit_secs: Option<f64>,
    /// Compute an irreducible infeasible subset when a model is infeasible.
    pub diagnose_infeasible: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::MicroLp,
            time_limit_secs: None,
            diagnose_infeasible: true,
        }
    }
}

pub const ENV_BACKEND: &str = "STRATA_SOLVER_BACKEND";
pub const ENV_TIME_LIMIT: &str = "STRATA_SOLVER_TIME_LIMIT";
pub const ENV_DIAGNOSE: &str = "STRATA_SOLVER_DIAGNOSE";

impl SolverConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from `STRATA_SOLVER_*` keys resolved through `lookup`.
    ///
    /// Absent keys keep their defaults; present but malformed ones are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_BACKEND) {
            config.backend = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_TIME_LIMIT) {
            let secs = raw.trim().parse::<f64>().map_err(|_| Error::SolverUnavailable {
                reason: format!("{ENV_TIME_LIMIT} must be a number of seconds, got `{raw}`"),
            })?;
            config.time_limit_secs = Some(secs);
        }
        if let Some(raw) = lookup(ENV_DIAGNOSE) {
            config.diagnose_infeasible = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(Error::SolverUnavailable {
                        reason: format!("{ENV_DIAGNOSE} must be a boolean, got `{raw}`"),
                    });
                }
            };
        }
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file. A missing or malformed file is an error.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| Error::SolverUnavailable {
            reason: format!("cannot read solver configuration {}: {err}", path.display()),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|err| Error::SolverUnavailable {
            reason: format!("invalid solver configuration {}: {err}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.time_limit_secs {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(Error::SolverUnavailable {
                    reason: format!("time limit must be positive and finite, got {secs}"),
                });
            }
        }
        Ok(())
    }
}
