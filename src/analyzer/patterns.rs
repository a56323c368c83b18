//! Error-line recognition for QC job logs.
//!
//! A line is an error line when it matches any pattern of one ordered set.
//! Matching is unanchored and case-sensitive, and a line matching several
//! patterns still counts once. Coverage grows by appending a pattern.

use regex::RegexSet;
use std::sync::OnceLock;

/// Built-in error patterns, grouped by the tools that emit them.
pub const ERROR_PATTERNS: &[&str] = &[
    // Alignment and indexing tools (htslib, samtools, bwa, picard)
    r"\[E::",
    r"Assertion `?.*'? failed",
    r"\[bam_sort_core\] .*(fail|error)",
    r"fail to (open|locate|read)",
    // Truncation and format problems
    r"EOF marker is absent",
    r"[Tt]runcated (file|input|BAM|CRAM|gzip)",
    r"input is probably truncated",
    r"unexpected end of (file|input)",
    r"[Ii]nvalid (BAM|CRAM|SAM|FASTQ|VCF|BCF|BGZF|gzip)",
    r"not in (bgzf|BGZF|gzip) format",
    r"[Ff]ailed to (open|read|write|index|load|create|parse)",
    r"(couldn't|could not|Could not|Couldn't) (open|read|write|parse|load|find)",
    r"[Mm]alformed",
    r"SAM validation error",
    // FastQC anomalies
    r"Too many tiles",
    r"Invalid (initial|maximum) heap size",
    r"memory (setting|value) .* out of range",
    r"OutOfMemoryError",
    r"Out of memory",
    r"Cannot allocate memory",
    r"std::bad_alloc",
    r"oom[-_ ]kill",
    // Signals and crashes
    r"Segmentation fault",
    r"core dumped",
    r"[Kk]illed by signal",
    r"terminated by signal",
    r"SIG(KILL|SEGV|BUS|ABRT|TERM)",
    // Resource exhaustion and I/O
    r"No space left on device",
    r"Disk quota exceeded",
    r"Too many open files",
    r"Permission denied",
    r"No such file or directory",
    r"Input/output error",
    r"Stale file handle",
    r"Broken pipe",
    // Runtimes and schedulers
    r"Traceback \(most recent call last\)",
    r"Exception in thread",
    r"\bERROR\b",
    r"DUE TO TIME LIMIT",
    r"CANCELLED AT",
    r"exceeded (memory|time) limit",
];

fn builtin_set() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| RegexSet::new(ERROR_PATTERNS).expect("built-in error patterns are valid"))
}

/// Whether `line` matches any built-in error pattern.
pub fn is_error_line(line: &str) -> bool {
    builtin_set().is_match(line)
}

/// Built-in patterns plus user-supplied extras.
#[derive(Debug, Clone, Default)]
pub struct ErrorPatterns {
    extra: Option<RegexSet>,
}

impl ErrorPatterns {
    /// Compile the extra patterns appended to the built-in set.
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> Result<Self, regex::Error> {
        if extra.is_empty() {
            return Ok(Self::default());
        }
        let set = RegexSet::new(extra.iter().map(|p| p.as_ref()))?;
        Ok(Self { extra: Some(set) })
    }

    pub fn is_match(&self, line: &str) -> bool {
        is_error_line(line) || self.extra.as_ref().is_some_and(|set| set.is_match(line))
    }
}
