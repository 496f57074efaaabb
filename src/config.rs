use crate::errors::{EngineError, EngineResult};
use crate::state::SAMPLE_PATHS;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub dashboard_dir: PathBuf,
    pub reference_data_path: Option<PathBuf>,
    pub simulation: SimulationDefaults,
}

/// Monte Carlo sizing used when a request leaves it unspecified, plus hard caps.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationDefaults {
    pub num_trials: usize,
    pub num_steps: usize,
    pub sample_paths: usize,
    pub max_trials: usize,
    pub max_steps: usize,
    pub seed: Option<u64>,
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        Self {
            num_trials: 1000,
            num_steps: 252,
            sample_paths: SAMPLE_PATHS,
            max_trials: 100_000,
            max_steps: 5_000,
            seed: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| EngineError::Config(format!("SERVER_PORT: {e}")))?;

        let num_trials = parse_count("MC_NUM_TRIALS", "1000")?;
        let num_steps = parse_count("MC_NUM_STEPS", "252")?;
        let sample_paths = env_var_or("MC_SAMPLE_PATHS", "10")
            .parse::<usize>()
            .map_err(|e| EngineError::Config(format!("MC_SAMPLE_PATHS: {e}")))?;
        let max_trials = parse_count("MC_MAX_TRIALS", "100000")?;
        let max_steps = parse_count("MC_MAX_STEPS", "5000")?;

        if sample_paths > SAMPLE_PATHS {
            return Err(EngineError::Config(format!(
                "MC_SAMPLE_PATHS: at most {SAMPLE_PATHS} paths are retained"
            )));
        }
        if num_trials > max_trials || num_steps > max_steps {
            return Err(EngineError::Config(
                "MC_NUM_TRIALS/MC_NUM_STEPS exceed MC_MAX_TRIALS/MC_MAX_STEPS".into(),
            ));
        }

        let seed = match std::env::var("MC_SEED") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|e| EngineError::Config(format!("MC_SEED: {e}")))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            server_port,
            dashboard_dir: PathBuf::from(env_var_or("DASHBOARD_DIR", "dashboard/dist")),
            reference_data_path: std::env::var("REFERENCE_DATA_PATH").ok().map(PathBuf::from),
            simulation: SimulationDefaults {
                num_trials,
                num_steps,
                sample_paths,
                max_trials,
                max_steps,
                seed,
            },
        })
    }
}

fn parse_count(key: &str, default: &str) -> EngineResult<usize> {
    let n = env_var_or(key, default)
        .parse::<usize>()
        .map_err(|e| EngineError::Config(format!("{key}: {e}")))?;
    if n == 0 {
        return Err(EngineError::Config(format!("{key}: must be positive")));
    }
    Ok(n)
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
