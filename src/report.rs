use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ReportError;
use crate::stats::RunStats;

/// What to do when an append to a report fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Drop the failure and keep crawling.
    #[default]
    Swallow,
    /// Keep crawling, but remember the first failure for the end of the run.
    Surface,
}

/// `<region>_<term with spaces as underscores>_job_results.html`
pub fn report_filename(region: &str, term: &str) -> String {
    format!("{}_{}_job_results.html", region, term.replace(' ', "_"))
}

pub fn header_fragment(term: &str) -> String {
    format!(
        "<html>\n<head><title>Job Search || {}</title></head>\n<body>\n",
        html_escape::encode_text(term)
    )
}

pub const TAIL_FRAGMENT: &str = "\n</body>\n</html>";

/// Opens reports inside one output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    policy: WritePolicy,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, policy: WritePolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file itself is created by the first append.
    pub fn open(&self, region: &str, term: &str) -> Report {
        Report {
            path: self.dir.join(report_filename(region, term)),
            policy: self.policy,
            failure: None,
        }
    }
}

/// One report file, only ever appended to.
#[derive(Debug)]
pub struct Report {
    path: PathBuf,
    policy: WritePolicy,
    failure: Option<ReportError>,
}

impl Report {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `fragment` and a newline.
    pub fn append(&mut self, fragment: &str) {
        if let Err(source) = append_line(&self.path, fragment) {
            match self.policy {
                WritePolicy::Swallow => {
                    debug!("Dropped write to {}: {}", self.path.display(), source);
                }
                WritePolicy::Surface => {
                    warn!("⚠️ Write to {} failed: {}", self.path.display(), source);
                    if self.failure.is_none() {
                        self.failure = Some(ReportError {
                            path: self.path.clone(),
                            source,
                        });
                    }
                }
            }
        }
    }

    pub fn write_header(&mut self, term: &str) {
        self.append(&header_fragment(term));
    }

    pub fn write_stats(&mut self, stats: &RunStats) {
        self.append(&stats.fragment());
    }

    pub fn write_tail(&mut self) {
        self.append(TAIL_FRAGMENT);
    }

    /// First remembered failure, if any (never set under `Swallow`).
    pub fn finish(self) -> Result<PathBuf, ReportError> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(self.path),
        }
    }
}

fn append_line(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", text)?;
    file.flush()
}
