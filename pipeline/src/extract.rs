use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::batch::BatchReport;
use crate::{PipelineError, Result};

const ARCHIVE_EXTENSIONS: [&str; 3] = ["rar", "zip", "7z"];

pub trait Extractor {
    /// Unpacks the archive into `destination`, returning the name of the tool that did it.
    fn extract(&self, archive: &Path, destination: &Path) -> Result<String>;
}

/// Runs external tools one after the other until one of them succeeds.
/// A tool that is not installed counts as a failed attempt.
pub struct CommandExtractor {
    tools: Vec<String>,
    timeout: Duration,
}

#[derive(Debug)]
enum Attempt {
    Success,
    Failed(String),
}

impl CommandExtractor {
    pub fn new(tools: Vec<String>, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    fn command(tool: &str, archive: &Path, destination: &Path) -> Command {
        let mut command = Command::new(tool);
        match tool {
            "unar" => {
                command.arg("-o").arg(destination).arg("-f").arg(archive);
            }
            "unrar" => {
                command.arg("x").arg("-o+").arg(archive).arg(destination);
            }
            "7z" => {
                let mut output = std::ffi::OsString::from("-o");
                output.push(destination);
                command.arg("x").arg(archive).arg(output).arg("-y");
            }
            _ => {
                command.arg(archive).arg(destination);
            }
        }
        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        command
    }

    fn run(&self, tool: &str, archive: &Path, destination: &Path) -> Attempt {
        let mut child = match Self::command(tool, archive, destination).spawn() {
            Ok(c) => c,
            Err(e) => return Attempt::Failed(format!("could not start: {}", e)),
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Attempt::Success,
                Ok(Some(status)) => return Attempt::Failed(format!("exited with {}", status)),
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Attempt::Failed(format!("timed out after {:?}", self.timeout));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(50)),
                Err(e) => return Attempt::Failed(e.to_string()),
            }
        }
    }
}

impl Extractor for CommandExtractor {
    #[tracing::instrument(skip(self))]
    fn extract(&self, archive: &Path, destination: &Path) -> Result<String> {
        std::fs::create_dir_all(destination).map_err(|e| PipelineError::io(destination, e))?;

        for tool in self.tools.iter() {
            match self.run(tool, archive, destination) {
                Attempt::Success => {
                    tracing::debug!(tool = %tool, "Extracted archive");
                    return Ok(tool.clone());
                }
                Attempt::Failed(reason) => {
                    tracing::debug!(tool = %tool, reason = %reason, "Extractor failed, trying next");
                }
            }
        }

        Err(PipelineError::Extraction {
            archive: archive.display().to_string(),
            tried: self.tools.join(", "),
        })
    }
}

fn archives(input: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(input).map_err(|e| PipelineError::io(input, e))?;

    let mut archives = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::io(input, e))?.path();
        let is_archive = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| ARCHIVE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_archive {
            archives.push(path);
        }
    }
    archives.sort();

    Ok(archives)
}

/// Unpacks every archive of `input` into `output/<archive name>/`.
pub fn extract_all(extractor: &dyn Extractor, input: &Path, output: &Path) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for archive in archives(input)? {
        let name = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match extractor.extract(&archive, &output.join(&name)) {
            Ok(_) => report.processed.push(name),
            Err(e) => report.skip(&name, e),
        }
    }

    tracing::info!(
        extracted = report.processed.len(),
        failed = report.skipped.len(),
        "Extracted archives"
    );
    Ok(report)
}
