//! Log redaction for patient identifiers.
//!
//! Screening logs mention record IDs and, through free-text notes, sometimes
//! contact details. Every formatted log line passes through [`redact`] before
//! reaching stdout or the log file:
//! - UUIDs (screening, follow-up and most patient IDs)
//! - `patient=...` / `patient_id: ...` key-value pairs
//! - national ID numbers
//! - phone numbers and email addresses
//!
//! Risk scores, levels and clinical categories are left intact; they are what
//! the logs are for.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

/// Lines longer than this are cut before redaction.
///
/// Overridable via `CERVICARE_SANITIZE_MAX_BYTES`.
const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024;

const TRUNCATION_MARKER: &str = " [TRUNCATED]";

static RULES: OnceLock<RedactionRules> = OnceLock::new();

struct RedactionRules {
    any: RegexSet,
    ordered: Vec<(Regex, &'static str)>,
}

/// Order matters: contextual patient IDs go before the generic digit rules.
const RULE_TABLE: &[(&str, &str)] = &[
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[UUID]",
    ),
    (
        r"(?i)\bpatient(?:[_-]?id)?\s*[:=]\s*[A-Za-z0-9_-]+",
        "patient=[PATIENT]",
    ),
    (
        r"(?i)\b(?:national[_ -]?id|nid|id[_ -]?number)\s*[:=#]?\s*[A-Za-z0-9-]{6,20}\b",
        "[NATIONAL-ID]",
    ),
    (r"\b\d{3}-\d{2}-\d{4}\b", "[NATIONAL-ID]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[EMAIL]",
    ),
    (r"\+\d{1,3}[-.\s]?\d{2,4}[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b", "[PHONE]"),
    (r"\b0\d{2,3}[-.\s]?\d{3}[-.\s]?\d{3,4}\b", "[PHONE]"),
];

fn rules() -> &'static RedactionRules {
    RULES.get_or_init(|| {
        let any = RegexSet::new(RULE_TABLE.iter().map(|(p, _)| *p)).expect("valid redaction set");
        let ordered = RULE_TABLE
            .iter()
            .map(|(p, r)| (Regex::new(p).expect("valid redaction pattern"), *r))
            .collect();
        RedactionRules { any, ordered }
    })
}

fn max_line_bytes() -> usize {
    std::env::var("CERVICARE_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_MAX_LINE_BYTES)
}

fn clip(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Replace patient identifiers and contact details in `input`.
#[must_use]
pub fn redact(input: &str) -> String {
    redact_within(input, max_line_bytes())
}

fn redact_within(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let (text, clipped) = clip(input, max_bytes);

    let mut out = if rules.any.is_match(text) {
        let mut current = text.to_string();
        for (regex, replacement) in &rules.ordered {
            if regex.is_match(&current) {
                current = regex.replace_all(&current, *replacement).into_owned();
            }
        }
        current
    } else {
        text.to_string()
    };

    if clipped {
        out.push_str(TRUNCATION_MARKER);
    }
    out
}

/// True if `input` holds anything [`redact`] would replace.
#[must_use]
pub fn contains_identifier(input: &str) -> bool {
    let (text, _) = clip(input, max_line_bytes());
    rules().any.is_match(text)
}

/// Replace the default panic hook with one that reports through `tracing`,
/// so panic messages reach the redacting writer instead of raw stderr.
pub fn route_panics_through_tracing() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!("Panic at {location}: {message}");
    }));
}

/// `MakeWriter` wrapper that redacts each formatted line before it reaches
/// the inner sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = LineRedactor<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        LineRedactor {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

/// Buffers bytes until a newline, then writes the redacted line.
pub struct LineRedactor<W: std::io::Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: std::io::Write> LineRedactor<W> {
    fn emit(&mut self, line: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(line);
        self.inner.write_all(redact(&text).as_bytes())
    }

    fn drain_complete_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for LineRedactor<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_complete_lines()?;

        // A single unterminated line past twice the cap is flushed as-is (clipped).
        if self.pending.len() > max_line_bytes().saturating_mul(2) {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_complete_lines()?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for LineRedactor<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}
