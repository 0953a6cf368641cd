// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming-JSON line accumulator (spec §4.4): when a coder is invoked
//! with `--output-format stream-json`, its stdout is newline-delimited
//! JSON records rather than raw terminal escape sequences. This parser
//! extracts the human-readable, ANSI-colored text from each record and
//! is the only thing fed to the VT emulator in that mode; raw bytes
//! still go to the scrollback untouched.

use serde::Deserialize;

const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";
const GRAY: &str = "\x1b[90m";
const RESET: &str = "\x1b[0m";

/// What the parser decided to render for a line, surfaced for tests so
/// assertions don't have to re-derive the ANSI wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamJsonRender {
    Status(String),
    Text(String),
    Newline,
    Error(String),
    Debug(String),
    Raw(String),
    Ignored,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Record {
    #[serde(rename = "message_start")]
    MessageStart,
    #[serde(rename = "content_block_start")]
    ContentBlockStart,
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: Delta },
    #[serde(rename = "content_block_stop")]
    ContentBlockStop,
    #[serde(rename = "message_delta")]
    MessageDelta { #[serde(default)] delta: Delta },
    #[serde(rename = "message_stop")]
    MessageStop,
    #[serde(rename = "error")]
    Error { error: ErrorPayload },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: String,
}

/// Buffers a partial trailing line across chunk boundaries and parses
/// each complete line independently.
pub struct StreamJsonParser {
    buffer: String,
    debug_mode: bool,
}

impl StreamJsonParser {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            debug_mode: false,
        }
    }

    pub fn set_debug_mode(&mut self, value: bool) {
        self.debug_mode = value;
    }

    /// Appends `chunk`, parses every complete line it now contains, and
    /// returns the concatenated renderable text to be fed to the VT
    /// emulator.
    pub fn feed(&mut self, chunk: &[u8]) -> String {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut rendered = String::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].to_string();
            self.buffer.drain(..=pos);
            Self::append_rendered(&mut rendered, self.render_line(&line));
        }
        rendered
    }

    fn append_rendered(rendered: &mut String, render: StreamJsonRender) {
        match render {
            StreamJsonRender::Status(text) => {
                rendered.push_str(CYAN);
                rendered.push_str(&text);
                rendered.push_str(RESET);
                rendered.push('\n');
            }
            StreamJsonRender::Text(text) => rendered.push_str(&text),
            StreamJsonRender::Newline => rendered.push('\n'),
            StreamJsonRender::Error(message) => {
                rendered.push_str(RED);
                rendered.push_str("\u{274c} Error: ");
                rendered.push_str(&message);
                rendered.push_str(RESET);
                rendered.push('\n');
            }
            StreamJsonRender::Debug(line) => {
                rendered.push_str(GRAY);
                rendered.push_str(&line);
                rendered.push_str(RESET);
                rendered.push('\n');
            }
            StreamJsonRender::Raw(line) => {
                rendered.push_str(&line);
                rendered.push('\n');
            }
            StreamJsonRender::Ignored => {}
        }
    }

    /// Classifies a single complete line, exposed for tests that want
    /// the render decision without driving the chunk buffer.
    fn render_line(&self, line: &str) -> StreamJsonRender {
        if line.trim().is_empty() {
            return StreamJsonRender::Ignored;
        }
        match serde_json::from_str::<Record>(line) {
            Ok(Record::MessageStart) => {
                StreamJsonRender::Status("\u{1f916} Claude is thinking\u{2026}".to_string())
            }
            Ok(Record::ContentBlockStart) | Ok(Record::ContentBlockStop) => {
                StreamJsonRender::Newline
            }
            Ok(Record::ContentBlockDelta { delta }) => match delta.text {
                Some(text) if !text.is_empty() => StreamJsonRender::Text(text),
                _ => StreamJsonRender::Ignored,
            },
            Ok(Record::MessageDelta { delta }) => match delta.stop_reason {
                Some(reason) => StreamJsonRender::Status(format!("\u{1f539} {reason}")),
                None => StreamJsonRender::Ignored,
            },
            Ok(Record::MessageStop) => {
                StreamJsonRender::Status("\u{1f3af} Response complete".to_string())
            }
            Ok(Record::Error { error }) => StreamJsonRender::Error(error.message),
            Ok(Record::Other) => {
                if self.debug_mode {
                    StreamJsonRender::Debug(format!("[debug] unrecognized record: {line}"))
                } else {
                    StreamJsonRender::Ignored
                }
            }
            Err(_) => StreamJsonRender::Raw(line.to_string()),
        }
    }
}

impl Default for StreamJsonParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "stream_json_tests.rs"]
mod tests;
