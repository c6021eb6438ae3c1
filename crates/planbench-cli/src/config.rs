use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6432,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Qualified collection name the candidates run against.
    pub collection: String,
    /// Directory for benchmark records and the execution-time summary.
    pub results_dir: String,
    /// A query slower than this is considered slow.
    pub threshold_ms: u64,
    /// JSON file holding the candidate queries.
    pub workload: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            collection: "trips_db.fhvhv_trips".to_string(),
            results_dir: "./results/benchmarking".to_string(),
            threshold_ms: 200,
            workload: "./workloads/trips.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bench: BenchConfig,
}

impl Config {
    /// Load config from a TOML file, with environment variable
    /// overrides. Falls back to defaults if the file is not found.
    /// PLANBENCH_CONFIG overrides the path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut cfg_path = path.as_ref().to_path_buf();
        if let Ok(env_path) = env::var("PLANBENCH_CONFIG") {
            cfg_path = env_path.into();
        }

        match fs::read_to_string(&cfg_path) {
            Ok(s) => {
                let mut cfg: Config = toml::from_str(&s)?;
                Self::apply_env_overrides(&mut cfg);
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut cfg = Config::default();
                Self::apply_env_overrides(&mut cfg);
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply PLANBENCH_* environment variable overrides.
    fn apply_env_overrides(cfg: &mut Config) {
        if let Ok(v) = env::var("PLANBENCH_HOST") {
            cfg.server.host = v;
        }

        if let Ok(v) = env::var("PLANBENCH_PORT")
            && let Ok(p) = v.parse::<u16>()
        {
            cfg.server.port = p;
        }

        if let Ok(v) = env::var("PLANBENCH_COLLECTION") {
            cfg.bench.collection = v;
        }

        if let Ok(v) = env::var("PLANBENCH_RESULTS_DIR") {
            cfg.bench.results_dir = v;
        }

        if let Ok(v) = env::var("PLANBENCH_THRESHOLD_MS")
            && let Ok(t) = v.parse::<u64>()
        {
            cfg.bench.threshold_ms = t;
        }

        if let Ok(v) = env::var("PLANBENCH_WORKLOAD") {
            cfg.bench.workload = v;
        }
    }
}
