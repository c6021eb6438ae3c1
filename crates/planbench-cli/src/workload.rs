use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use planbench_common::CandidateQuery;

/// Load and validate a workload file: a JSON array of candidate
/// queries, each carrying a filter (or pipeline) and a proposed index.
pub fn load_workload(path: &Path) -> anyhow::Result<Vec<CandidateQuery>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading workload file {}", path.display()))?;
    let candidates: Vec<CandidateQuery> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing workload file {}", path.display()))?;

    if candidates.is_empty() {
        bail!("workload file {} holds no candidates", path.display());
    }

    let mut seen = HashSet::new();
    for candidate in &candidates {
        if !seen.insert(candidate.name.as_str()) {
            bail!("duplicate candidate name '{}'", candidate.name);
        }
        candidate
            .validate()
            .with_context(|| format!("candidate '{}'", candidate.name))?;
    }

    Ok(candidates)
}
