//! Result persistence
//!
//! Scenario snapshots go to `<output>/raw/` as JSON, one file per scenario
//! run. Text reports and the master summary go to `<output>/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use toolbench_core::OutputSettings;

use crate::master::{MasterResults, OverallScore};
use crate::results::{BenchmarkResults, ModelSummary, Skipped};
use crate::scoring::{ModelScore, Ranking};

#[derive(Error, Debug)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type IoResult<T> = Result<T, IoError>;

pub const MASTER_JSON: &str = "master_results.json";
pub const MASTER_REPORT: &str = "master_report.txt";

/// Point-in-time record of one scenario's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    pub id: Uuid,
    pub scenario: String,
    pub timestamp: DateTime<Utc>,
    pub interrupted: bool,
    pub models: Vec<ModelSummary>,
    pub scores: Vec<ModelScore>,
    pub winner: Option<String>,
    pub disqualified: Vec<String>,
    pub skipped: Vec<Skipped>,
}

impl ScenarioSnapshot {
    pub fn capture(results: &BenchmarkResults) -> Self {
        let ranking = Ranking::rank(results);
        Self {
            id: Uuid::new_v4(),
            scenario: results.scenario_name().to_string(),
            timestamp: Utc::now(),
            interrupted: results.interrupted(),
            models: results.iter().map(|m| m.summary()).collect(),
            scores: ranking.sorted().into_iter().cloned().collect(),
            winner: ranking.winner().map(|w| w.model_name.clone()),
            disqualified: ranking.disqualified().to_vec(),
            skipped: results.skipped().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Best first
    pub ranking: Vec<OverallScore>,
    pub winner: Option<String>,
    pub scenarios: Vec<ScenarioSnapshot>,
}

impl MasterSnapshot {
    pub fn capture(master: &MasterResults) -> Self {
        Self {
            timestamp: Utc::now(),
            ranking: master.overall_ranking().into_iter().cloned().collect(),
            winner: master.overall_winner().map(|w| w.model_name.clone()),
            scenarios: master.scenarios().iter().map(ScenarioSnapshot::capture).collect(),
        }
    }
}

pub struct ResultsIo {
    output_dir: PathBuf,
    raw_dir: PathBuf,
}

impl ResultsIo {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            raw_dir: output_dir.join("raw"),
            output_dir,
        }
    }

    pub fn from_settings(settings: &OutputSettings) -> Self {
        Self::new(&settings.dir)
    }

    pub fn ensure_directories(&self) -> IoResult<()> {
        fs::create_dir_all(&self.output_dir)?;
        fs::create_dir_all(&self.raw_dir)?;
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn write_snapshot(&self, snapshot: &ScenarioSnapshot) -> IoResult<PathBuf> {
        self.ensure_directories()?;

        let filename = format!(
            "{}_{}_{}.json",
            safe_name(&snapshot.scenario),
            snapshot.timestamp.format("%Y%m%d_%H%M%S"),
            snapshot.id.simple()
        );
        let path = self.raw_dir.join(filename);

        write_json(&path, snapshot)?;

        Ok(path)
    }

    pub fn read_snapshot(&self, path: impl AsRef<Path>) -> IoResult<ScenarioSnapshot> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Every readable snapshot in the raw directory, oldest first
    pub fn read_all_snapshots(&self) -> IoResult<Vec<ScenarioSnapshot>> {
        let mut snapshots = Vec::new();

        if !self.raw_dir.exists() {
            return Ok(snapshots);
        }

        for entry in fs::read_dir(&self.raw_dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                match self.read_snapshot(&path) {
                    Ok(snapshot) => snapshots.push(snapshot),
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to read snapshot"),
                }
            }
        }

        snapshots.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(snapshots)
    }

    /// Write a text report named after the scenario
    pub fn write_report(&self, name: &str, content: &str) -> IoResult<PathBuf> {
        self.ensure_directories()?;

        let path = self.output_dir.join(format!("{}.txt", safe_name(name)));
        let mut file = File::create(&path)?;
        file.write_all(content.as_bytes())?;

        Ok(path)
    }

    pub fn write_master(&self, snapshot: &MasterSnapshot, report: &str) -> IoResult<PathBuf> {
        self.ensure_directories()?;

        let path = self.output_dir.join(MASTER_JSON);
        write_json(&path, snapshot)?;

        let mut file = File::create(self.output_dir.join(MASTER_REPORT))?;
        file.write_all(report.as_bytes())?;

        Ok(path)
    }

    pub fn read_master(&self) -> IoResult<MasterSnapshot> {
        let reader = BufReader::new(File::open(self.output_dir.join(MASTER_JSON))?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Pretty-printed JSON, flushed so a failed write is reported
fn write_json<T: Serialize>(path: &Path, value: &T) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Lowercase, with anything outside `[a-z0-9]` replaced by `_`
fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ModelResults;
    use std::env::temp_dir;
    use toolbench_core::{RunOutcome, TokenUsage};

    fn temp_io() -> ResultsIo {
        ResultsIo::new(temp_dir().join(format!("toolbench_io_test_{}", Uuid::new_v4())).join("output"))
    }

    fn results() -> BenchmarkResults {
        let mut bench = BenchmarkResults::new("Simple Channel/Renaming");
        let mut model = ModelResults::new("groq/llama-3.1-8b-instant");
        model.add_run(RunOutcome::completed(800, TokenUsage::new(100, 20), 0.00001, 2, 1.0));
        bench.add_result(model);
        let mut broken = ModelResults::new("groq/qwen3-32b-preview");
        broken.add_run(RunOutcome::failure("boom"));
        bench.add_result(broken);
        bench
    }

    #[test]
    fn test_ensure_directories() {
        let io = temp_io();
        assert!(io.ensure_directories().is_ok());
        assert!(io.output_dir().exists());
        assert!(io.raw_dir().exists());
    }

    #[test]
    fn test_snapshot_captures_ranking() {
        let snapshot = ScenarioSnapshot::capture(&results());

        assert_eq!(snapshot.models.len(), 2);
        assert_eq!(snapshot.scores.len(), 1);
        assert_eq!(snapshot.winner.as_deref(), Some("groq/llama-3.1-8b-instant"));
        assert_eq!(snapshot.disqualified, vec!["groq/qwen3-32b-preview".to_string()]);
    }

    #[test]
    fn test_write_and_read_snapshot() {
        let io = temp_io();
        let snapshot = ScenarioSnapshot::capture(&results());

        let path = io.write_snapshot(&snapshot).unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("simple_channel_renaming_"));

        let read = io.read_snapshot(&path).unwrap();
        assert_eq!(read.id, snapshot.id);
        assert_eq!(read.winner, snapshot.winner);

        let all = io.read_all_snapshots().unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_read_all_without_directory() {
        let io = temp_io();
        assert!(io.read_all_snapshots().unwrap().is_empty());
    }

    #[test]
    fn test_write_report_and_master() {
        let io = temp_io();
        let path = io.write_report("Simple Channel Renaming", "report body").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "report body");

        let mut master = MasterResults::new();
        master.add_scenario(results());
        io.write_master(&MasterSnapshot::capture(&master), "master body").unwrap();

        let read = io.read_master().unwrap();
        assert_eq!(read.winner.as_deref(), Some("groq/llama-3.1-8b-instant"));
        assert_eq!(read.scenarios.len(), 1);
        assert!(io.output_dir().join(MASTER_REPORT).exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_buffered_write_failure_is_reported() {
        // Writes to /dev/full fail once the buffer is flushed.
        let snapshot = ScenarioSnapshot::capture(&results());
        let result = write_json(Path::new("/dev/full"), &snapshot);
        assert!(matches!(result, Err(IoError::Io(_))));
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("Complex Mixing: EQ/Comp"), "complex_mixing__eq_comp");
    }
}
