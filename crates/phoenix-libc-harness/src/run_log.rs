//! JSONL run log and artifact manifest for conformance runs.
//!
//! Every line of a run log is one [`CaseRecord`]. Records are tagged with a
//! trace of the form `<campaign>/<run>#<seq>` so that lines from concurrent
//! runs can be told apart after the files are concatenated. The
//! [`ArtifactManifest`] pins the reports a run produced by SHA-256.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use phoenix_libc_core::errno;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// How a fixture case (or a whole run) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// The harness has no executor for the case's function.
    Unsupported,
}

/// One line of a run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub at: String,
    pub trace: String,
    pub severity: Severity,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    /// Symbolic errno (`"EINVAL"`), or the decimal value when unnamed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ns: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl CaseRecord {
    /// A record with only the mandatory fields; the trace is assigned by
    /// [`RunLog::record`].
    #[must_use]
    pub fn event(severity: Severity, event: impl Into<String>) -> Self {
        Self {
            at: utc_now(),
            trace: String::new(),
            severity,
            event: event.into(),
            campaign: None,
            family: None,
            function: None,
            locale: None,
            verdict: None,
            errno: None,
            elapsed_ns: None,
            wall_ms: None,
            artifacts: Vec::new(),
            detail: None,
        }
    }

    #[must_use]
    pub fn campaign(mut self, campaign: &str) -> Self {
        self.campaign = Some(campaign.to_owned());
        self
    }

    /// Tag the record with the case it describes.
    #[must_use]
    pub fn case(mut self, family: &str, function: &str, locale: &str) -> Self {
        self.family = Some(family.to_owned());
        self.function = Some(function.to_owned());
        self.locale = Some(locale.to_owned());
        self
    }

    #[must_use]
    pub fn verdict(mut self, verdict: Verdict) -> Self {
        self.verdict = Some(verdict);
        self
    }

    #[must_use]
    pub fn errno(mut self, code: i32) -> Self {
        self.errno = Some(errno_name(code));
        self
    }

    #[must_use]
    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ns = Some(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn wall_clock(mut self, elapsed: Duration) -> Self {
        self.wall_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn artifacts<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artifacts.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

fn errno_name(code: i32) -> String {
    let name = match code {
        errno::EINVAL => "EINVAL",
        errno::ENOMEM => "ENOMEM",
        errno::EOVERFLOW => "EOVERFLOW",
        errno::EILSEQ => "EILSEQ",
        errno::EINTR => "EINTR",
        errno::EBADF => "EBADF",
        errno::ENFILE => "ENFILE",
        errno::EMFILE => "EMFILE",
        other => return other.to_string(),
    };
    name.to_owned()
}

/// Appends [`CaseRecord`]s as JSON lines to `W`.
pub struct RunLog<W: Write> {
    out: W,
    campaign: String,
    run: String,
    seq: u64,
}

impl RunLog<BufWriter<File>> {
    /// Create (truncating) a log file at `path`.
    pub fn create(path: &Path, campaign: &str, run: &str) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?), campaign, run))
    }
}

impl RunLog<Vec<u8>> {
    #[must_use]
    pub fn in_memory(campaign: &str, run: &str) -> Self {
        Self::new(Vec::new(), campaign, run)
    }

    /// Lines recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.out)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl<W: Write> RunLog<W> {
    pub fn new(out: W, campaign: &str, run: &str) -> Self {
        Self {
            out,
            campaign: campaign.to_owned(),
            run: run.to_owned(),
            seq: 0,
        }
    }

    /// Write `record`, assigning its trace and defaulting its campaign.
    /// Returns the trace written.
    pub fn record(&mut self, mut record: CaseRecord) -> io::Result<String> {
        self.seq += 1;
        if record.trace.is_empty() {
            record.trace = format!("{}/{}#{}", self.campaign, self.run, self.seq);
        }
        if record.campaign.is_none() {
            record.campaign = Some(self.campaign.clone());
        }
        let line = serde_json::to_string(&record).map_err(io::Error::other)?;
        writeln!(self.out, "{line}")?;
        Ok(record.trace)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Split a trace into campaign, run and sequence number.
#[must_use]
pub fn parse_trace(trace: &str) -> Option<(&str, &str, u64)> {
    let (prefix, seq) = trace.rsplit_once('#')?;
    let (campaign, run) = prefix.split_once('/')?;
    if campaign.is_empty() || run.is_empty() {
        return None;
    }
    Some((campaign, run, seq.parse().ok()?))
}

/// A problem found on one line of a run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIssue {
    pub line: usize,
    pub field: &'static str,
    pub problem: String,
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} ({}): {}", self.line, self.field, self.problem)
    }
}

const MANDATORY: [&str; 4] = ["at", "trace", "severity", "event"];

/// Check one log line, reporting every problem rather than the first.
pub fn check_line(text: &str, line: usize) -> Result<CaseRecord, Vec<LineIssue>> {
    let issue = |field: &'static str, problem: String| LineIssue {
        line,
        field,
        problem,
    };
    let value: Value = serde_json::from_str(text)
        .map_err(|e| vec![issue("<line>", format!("not JSON: {e}"))])?;
    let Value::Object(fields) = &value else {
        return Err(vec![issue("<line>", "not a JSON object".to_owned())]);
    };

    let mut issues: Vec<LineIssue> = MANDATORY
        .iter()
        .copied()
        .filter(|key| !fields.contains_key(*key))
        .map(|key| issue(key, "missing".to_owned()))
        .collect();
    if let Some(v) = fields.get("severity")
        && Severity::deserialize(v).is_err()
    {
        issues.push(issue("severity", format!("unknown severity {v}")));
    }
    if let Some(v) = fields.get("verdict")
        && Verdict::deserialize(v).is_err()
    {
        issues.push(issue("verdict", format!("unknown verdict {v}")));
    }
    if let Some(trace) = fields.get("trace").and_then(Value::as_str)
        && parse_trace(trace).is_none()
    {
        issues.push(issue(
            "trace",
            format!("expected <campaign>/<run>#<seq>, got {trace:?}"),
        ));
    }
    if !issues.is_empty() {
        return Err(issues);
    }
    serde_json::from_value(value).map_err(|e| vec![issue("<record>", e.to_string())])
}

/// Result of checking a whole log file.
#[derive(Debug, Default)]
pub struct LogCheck {
    /// Non-blank lines seen.
    pub records: usize,
    pub issues: Vec<LineIssue>,
}

impl LogCheck {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check every non-blank line of the log at `path`.
pub fn check_file(path: &Path) -> io::Result<LogCheck> {
    let text = std::fs::read_to_string(path)?;
    let mut check = LogCheck::default();
    for (idx, raw) in text.lines().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        check.records += 1;
        if let Err(found) = check_line(raw, idx + 1) {
            check.issues.extend(found);
        }
    }
    Ok(check)
}

/// Size and digest of one produced file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    pub role: String,
    pub sha256: String,
    pub bytes: u64,
}

/// The files a run produced, keyed by path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub run: String,
    pub created: String,
    pub files: BTreeMap<String, FileDigest>,
}

impl ArtifactManifest {
    #[must_use]
    pub fn new(run: &str) -> Self {
        Self {
            run: run.to_owned(),
            created: utc_now(),
            files: BTreeMap::new(),
        }
    }

    /// Hash the file at `path` and record it under `role`.
    pub fn record_file(&mut self, path: &Path, role: &str) -> io::Result<&FileDigest> {
        let bytes = std::fs::read(path)?;
        let digest = FileDigest {
            role: role.to_owned(),
            sha256: sha256_hex(&bytes),
            bytes: bytes.len() as u64,
        };
        let key = path.display().to_string();
        self.files.insert(key.clone(), digest);
        Ok(&self.files[&key])
    }

    /// Paths whose contents no longer match the recorded digest, including
    /// files that have disappeared.
    #[must_use]
    pub fn changed(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter(|(path, digest)| {
                std::fs::read(path).map_or(true, |bytes| sha256_hex(&bytes) != digest.sha256)
            })
            .map(|(path, _)| path.as_str())
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().fold(String::with_capacity(64), |mut hex, b| {
        use std::fmt::Write as _;
        let _ = write!(hex, "{b:02x}");
        hex
    })
}

/// Current time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[must_use]
pub fn utc_now() -> String {
    let since_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    utc_stamp(since_epoch.as_secs(), since_epoch.subsec_millis())
}

fn utc_stamp(secs: u64, millis: u32) -> String {
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    let tod = secs % 86_400;
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        tod / 3600,
        tod / 60 % 60,
        tod % 60,
    )
}

// Proleptic Gregorian date from days since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (yoe + era * 400 + i64::from(month <= 2), month, day)
}
