// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data Provider and Data Injector (spec §4.6, C4). The provider exposes
//! snapshot queries over state owned elsewhere (the external log store
//! and reverse proxy are out of scope per spec §1); the injector formats
//! a snapshot into the banner text a PTY session writes as synthetic
//! input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Keyword sets used both by [`DataProvider::get_test_failures`]/
/// [`DataProvider::get_build_output`] classification and by the PTY
/// Manager's auto-injection pattern analyzer (spec §4.4, §4.6).
pub const TEST_KEYWORDS: &[&str] = &["test", "spec", "jest", "mocha", "pytest", "go test"];
pub const BUILD_KEYWORDS: &[&str] = &[
    "build",
    "compile",
    "webpack",
    "vite",
    "rollup",
    "tsc",
    "go build",
    "make",
    "cmake",
];

/// Case-insensitive substring match against any of `keywords`.
pub fn matches_any_keyword(haystack: &str, keywords: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    keywords.iter().any(|k| haystack.contains(k))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    pub error_type: String,
    pub severity: String,
    pub process: String,
    pub time: DateTime<Utc>,
    pub message: String,
    pub stack: Vec<String>,
    pub context_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub process: String,
    pub time: DateTime<Utc>,
    pub line: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntry {
    pub url: String,
    pub proxy_url: String,
    pub process_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRequestEntry {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub duration_ms: u64,
    pub time: DateTime<Utc>,
    pub host: String,
    pub path: String,
    pub error: Option<String>,
    pub process: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub processes: Vec<serde_json::Value>,
}

/// Snapshot queries consumed by PTY injection (spec §4.6's table). The
/// concrete implementation lives with whatever owns the log store and
/// proxy — out of scope here (spec §1) — so production code supplies its
/// own; [`InMemoryDataProvider`] below is the one shipped for tests and
/// for a daemon that hasn't wired a real log/proxy source yet.
pub trait DataProvider: Send + Sync {
    fn get_last_error(&self) -> Option<ErrorContext>;
    fn get_recent_logs(&self, n: usize) -> Vec<LogEntry>;
    fn get_test_failures(&self) -> Vec<ErrorContext>;
    fn get_build_output(&self) -> Vec<String>;
    fn get_process_info(&self) -> ProcessSnapshot;
    fn get_detected_urls(&self) -> Vec<UrlEntry>;
    fn get_recent_proxy_requests(&self, n: usize) -> Vec<ProxyRequestEntry>;
}

/// In-memory backing store a daemon can push into directly; satisfies
/// the same query contract a real log/proxy-backed provider would.
#[derive(Default)]
pub struct InMemoryDataProvider {
    inner: parking_lot::RwLock<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    errors: Vec<ErrorContext>,
    logs: Vec<LogEntry>,
    urls: Vec<UrlEntry>,
    proxy_requests: Vec<ProxyRequestEntry>,
    process_info: ProcessSnapshot,
}

impl InMemoryDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_error(&self, error: ErrorContext) {
        self.inner.write().errors.push(error);
    }

    pub fn push_log(&self, log: LogEntry) {
        self.inner.write().logs.push(log);
    }

    pub fn push_url(&self, url: UrlEntry) {
        self.inner.write().urls.push(url);
    }

    pub fn push_proxy_request(&self, request: ProxyRequestEntry) {
        self.inner.write().proxy_requests.push(request);
    }

    pub fn set_process_info(&self, info: ProcessSnapshot) {
        self.inner.write().process_info = info;
    }
}

impl DataProvider for InMemoryDataProvider {
    fn get_last_error(&self) -> Option<ErrorContext> {
        self.inner.read().errors.last().cloned()
    }

    fn get_recent_logs(&self, n: usize) -> Vec<LogEntry> {
        let logs = &self.inner.read().logs;
        logs.iter().rev().take(n).rev().cloned().collect()
    }

    fn get_test_failures(&self) -> Vec<ErrorContext> {
        self.inner
            .read()
            .errors
            .iter()
            .filter(|e| {
                matches_any_keyword(&e.message, TEST_KEYWORDS)
                    || matches_any_keyword(&e.process, TEST_KEYWORDS)
                    || e.context_lines
                        .iter()
                        .any(|line| matches_any_keyword(line, TEST_KEYWORDS))
            })
            .cloned()
            .collect()
    }

    fn get_build_output(&self) -> Vec<String> {
        let logs = &self.inner.read().logs;
        logs.iter()
            .filter(|l| matches_any_keyword(&l.line, BUILD_KEYWORDS) || matches_any_keyword(&l.process, BUILD_KEYWORDS))
            .rev()
            .take(20)
            .rev()
            .map(|l| l.line.clone())
            .collect()
    }

    fn get_process_info(&self) -> ProcessSnapshot {
        self.inner.read().process_info.clone()
    }

    fn get_detected_urls(&self) -> Vec<UrlEntry> {
        self.inner.read().urls.clone()
    }

    fn get_recent_proxy_requests(&self, n: usize) -> Vec<ProxyRequestEntry> {
        let requests = &self.inner.read().proxy_requests;
        requests.iter().rev().take(n).rev().cloned().collect()
    }
}

/// Fixed label set for the data-injection banner (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectLabel {
    Error,
    LastError,
    RecentLogs,
    TestFailure,
    BuildOutput,
    ProcessInfo,
    DetectedUrls,
    ProxyRequest,
    SystemMessage,
    Data,
}

impl InjectLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            InjectLabel::Error => "ERROR",
            InjectLabel::LastError => "LAST ERROR",
            InjectLabel::RecentLogs => "RECENT LOGS",
            InjectLabel::TestFailure => "TEST FAILURE",
            InjectLabel::BuildOutput => "BUILD OUTPUT",
            InjectLabel::ProcessInfo => "PROCESS INFO",
            InjectLabel::DetectedUrls => "DETECTED URLS",
            InjectLabel::ProxyRequest => "PROXY REQUEST",
            InjectLabel::SystemMessage => "SYSTEM MESSAGE",
            InjectLabel::Data => "DATA",
        }
    }
}

/// Formats provider snapshots for human consumption, truncating per spec
/// §4.6's defaults (20 lines, 2000 chars).
pub struct DataInjector {
    pub max_lines: usize,
    pub max_chars: usize,
}

impl Default for DataInjector {
    fn default() -> Self {
        Self {
            max_lines: 20,
            max_chars: 2000,
        }
    }
}

impl DataInjector {
    fn truncate(&self, text: String) -> String {
        let mut lines: Vec<&str> = text.lines().collect();
        let truncated_lines = lines.len() > self.max_lines;
        lines.truncate(self.max_lines);
        let mut joined = lines.join("\n");
        if truncated_lines {
            joined.push_str("\n...");
        }
        if joined.len() > self.max_chars {
            joined.truncate(self.max_chars);
            joined.push_str("...");
        }
        joined
    }

    /// `Type`, `Severity`, `Process`, `Time (HH:MM:SS)`, `Message`, up to
    /// 5 stack lines, then up to `max_lines` context lines (spec §4.6).
    pub fn format_error_context(&self, ctx: &ErrorContext) -> String {
        let mut body = String::new();
        body.push_str(&format!("Type: {}\n", ctx.error_type));
        body.push_str(&format!("Severity: {}\n", ctx.severity));
        body.push_str(&format!("Process: {}\n", ctx.process));
        body.push_str(&format!("Time: {}\n", ctx.time.format("%H:%M:%S")));
        body.push_str(&format!("Message: {}\n", ctx.message));
        for line in ctx.stack.iter().take(5) {
            body.push_str(line);
            body.push('\n');
        }
        for line in ctx.context_lines.iter().take(self.max_lines) {
            body.push_str(line);
            body.push('\n');
        }
        self.truncate(body)
    }

    pub fn format_recent_logs(&self, logs: &[LogEntry]) -> String {
        let body = logs
            .iter()
            .map(|l| format!("[{}] {}: {}", l.time.format("%H:%M:%S"), l.process, l.line))
            .collect::<Vec<_>>()
            .join("\n");
        self.truncate(body)
    }

    pub fn format_test_failures(&self, failures: &[ErrorContext]) -> String {
        let body = failures
            .iter()
            .map(|f| self.format_error_context(f))
            .collect::<Vec<_>>()
            .join("\n---\n");
        self.truncate(body)
    }

    pub fn format_build_output(&self, lines: &[String]) -> String {
        self.truncate(lines.join("\n"))
    }

    pub fn format_process_info(&self, info: &ProcessSnapshot) -> String {
        let body = serde_json::to_string_pretty(info).unwrap_or_default();
        self.truncate(body)
    }

    /// `URL → ProxyURL (ProcessName)` per entry (spec §4.6).
    pub fn format_detected_urls(&self, urls: &[UrlEntry]) -> String {
        let body = urls
            .iter()
            .map(|u| format!("{} \u{2192} {} ({})", u.url, u.proxy_url, u.process_name))
            .collect::<Vec<_>>()
            .join("\n");
        self.truncate(body)
    }

    pub fn format_proxy_request(&self, request: &ProxyRequestEntry) -> String {
        let mut body = String::new();
        body.push_str(&format!("Method: {}\n", request.method));
        body.push_str(&format!("URL: {}\n", request.url));
        body.push_str(&format!("Status: {}\n", request.status));
        body.push_str(&format!("Duration: {}ms\n", request.duration_ms));
        body.push_str(&format!("Time: {}\n", request.time.format("%H:%M:%S")));
        body.push_str(&format!("Host: {}\n", request.host));
        body.push_str(&format!("Path: {}\n", request.path));
        if let Some(err) = &request.error {
            body.push_str(&format!("Error: {err}\n"));
        }
        if let Some(process) = &request.process {
            body.push_str(&format!("Process: {process}\n"));
        }
        self.truncate(body)
    }

    pub fn format_system_message(&self, text: &str) -> String {
        self.truncate(text.to_string())
    }

    pub fn format_raw(&self, text: &str) -> String {
        self.truncate(text.to_string())
    }
}

#[cfg(test)]
#[path = "data_provider_tests.rs"]
mod tests;
