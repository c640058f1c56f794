//! Pipeline driver (§10): wires lexer → engine → reorderer → oracle
//! builder together and commits whichever output sinks are configured.
//!
//! This is a library entry point, not a CLI: no argument parsing, no
//! process exit codes, no terminal output. A caller embeds [`Pipeline`]
//! the way any other library type is embedded.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use recon_model::Record;

use crate::config::PipelineConfig;
use crate::engine::{self, EngineConfig, EngineStats};
use crate::error::ReconError;
use crate::oracle::{self, OracleStats};
use crate::reorder::{self, StreamItem};

pub struct Pipeline {
    config: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub engine_stats: EngineStats,
    pub oracle_stats: OracleStats,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline over the trace at `input_path`, writing
    /// every sink the config enables, and returning a summary of both
    /// the engine's and the oracle's run.
    pub fn run(&self, input_path: impl AsRef<Path>) -> Result<PipelineReport, ReconError> {
        let input_path = input_path.as_ref();
        let engine_config = EngineConfig {
            strict: self.config.parsing.strict,
            verbose: self.config.diagnostics.verbose,
        };

        let engine_output = engine::run(input_path, engine_config)?;
        let stream = reorder::reorder(&engine_output.events, engine_output.deaths)?;

        if let Some(path) = &self.config.output.augmented_trace {
            let contents = render_augmented_trace(&stream);
            write_atomic(path, contents.as_bytes())?;
        }

        let oracle_output = oracle::build(&stream, self.config.oracle.include_pre_existing_frees)?;

        if let Some(path) = &self.config.output.oracle_text {
            write_atomic(path, oracle_output.text.as_bytes())?;
        }
        if let Some(path) = &self.config.output.oracle_csv {
            write_atomic(path, oracle_output.csv.as_bytes())?;
        }

        Ok(PipelineReport {
            engine_stats: engine_output.stats,
            oracle_stats: oracle_output.stats,
        })
    }
}

/// Re-serialize a reordered stream back to wire text (§6), stamping
/// `M`/`E`/`X`/`T`/`H` and `D` records with the clock the engine
/// computed for them so the output round-trips through the lexer.
fn render_augmented_trace(stream: &[StreamItem]) -> String {
    let mut out = String::new();
    for item in stream {
        match item {
            StreamItem::Event(event) => render_record(&mut out, event.clock, &event.record),
            StreamItem::Death(death) => {
                use std::fmt::Write as _;
                let _ = writeln!(out, "D {} {} {}", death.object, death.thread, death.clock);
            }
        }
    }
    out
}

fn render_record(out: &mut String, clock: u64, record: &Record) {
    use std::fmt::Write as _;
    match record {
        Record::Alloc(a) => {
            let _ = writeln!(
                out,
                "{} {} {} {} {} {} {}",
                a.tag(),
                a.object,
                a.size,
                a.type_id,
                a.site,
                a.length,
                a.thread
            );
        }
        Record::Update(u) => {
            let _ = writeln!(out, "U {} {} {} {}", u.receiver, u.target, u.field, u.thread);
        }
        Record::Witness(w) => {
            let _ = writeln!(out, "W {} {} {}", w.object, w.class, w.thread);
        }
        Record::MethodEntry(m) => {
            let _ = writeln!(out, "M {} {} {} {}", m.method, m.receiver, m.thread, clock);
        }
        Record::MethodExit(e) => {
            let _ = writeln!(out, "{} {} {} {}", e.kind.tag(), e.method, e.thread, clock);
        }
        Record::Death(_) => {
            // Deaths never appear as Event items; they are their own
            // StreamItem variant.
        }
    }
}

/// Write `contents` to a sibling temp file and rename it into place, so
/// a crash mid-write never leaves a truncated output file at `path`
/// (§5, §7).
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let temp_path: PathBuf = dir.join(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputPaths;
    use std::io::Write as _;

    fn trace_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn end_to_end_run_produces_matching_alloc_and_free_oracle_lines() {
        let input = trace_file("M 10 0 1\nN 1 16 7 3 0 1\nE 10 1\n");
        let dir = tempfile::tempdir().unwrap();
        let oracle_text = dir.path().join("oracle.txt");
        let oracle_csv = dir.path().join("oracle.csv");
        let augmented = dir.path().join("augmented.trace");

        let config = PipelineConfig {
            output: OutputPaths {
                augmented_trace: Some(augmented.clone()),
                oracle_text: Some(oracle_text.clone()),
                oracle_csv: Some(oracle_csv.clone()),
            },
            ..PipelineConfig::default()
        };

        let report = Pipeline::new(config).run(input.path()).unwrap();
        assert_eq!(report.oracle_stats.allocs, 1);
        assert_eq!(report.oracle_stats.frees, 1);

        let text = std::fs::read_to_string(&oracle_text).unwrap();
        assert!(text.contains("alloc(id=1"));
        assert!(text.contains("free(id=1"));

        let csv = std::fs::read_to_string(&oracle_csv).unwrap();
        assert!(csv.starts_with("timestamp,event_type,object_id,size,site_id,thread_id,type_id"));

        let trace = std::fs::read_to_string(&augmented).unwrap();
        assert!(trace.lines().any(|l| l.starts_with('D')));
    }

    #[test]
    fn disabled_sinks_are_never_written() {
        let input = trace_file("M 10 0 1\nN 1 16 7 3 0 1\nE 10 1\n");
        let config = PipelineConfig::default();
        let report = Pipeline::new(config).run(input.path()).unwrap();
        assert_eq!(report.oracle_stats.allocs, 1);
    }
}
