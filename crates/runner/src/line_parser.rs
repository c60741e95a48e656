// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-line signal extraction for renderer output.
//!
//! Blender's background-mode log is the only format this worker needs to
//! understand line-by-line: a `Fra:N Mem:...` progress line per frame, a
//! `Saved: '<path>'` line when a frame finishes writing, and an
//! `Error:`/`Warning:` prefix for anything that should change the command's
//! outcome.

/// A structured signal extracted from one line of subprocess output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSignal {
    /// Render progress, 0.0..=1.0.
    Progress(f32),
    /// A frame (or file) was saved to `path`.
    Saved { path: String },
    /// The line indicates a failure; the command should be failed.
    Error { message: String },
    /// The line is a non-fatal warning worth annotating.
    Warning { message: String },
}

/// Parse one line of Blender background-mode output for a progress
/// percentage, a "Saved: <path>" notice, or an error/warning marker.
///
/// Returns `None` for ordinary lines that carry no structured signal — they
/// are still forwarded verbatim as log fragments by the caller.
pub fn parse_blender_line(line: &str, frame_start: i64, frame_end: i64) -> Option<ParsedSignal> {
    if let Some(path) = line.strip_prefix("Saved: ") {
        return Some(ParsedSignal::Saved {
            path: path.trim().trim_matches('\'').to_string(),
        });
    }

    if let Some(rest) = line.strip_prefix("Error:") {
        return Some(ParsedSignal::Error {
            message: rest.trim().to_string(),
        });
    }

    if let Some(rest) = line.strip_prefix("Warning:") {
        return Some(ParsedSignal::Warning {
            message: rest.trim().to_string(),
        });
    }

    if let Some(frame) = parse_frame_number(line) {
        let span = (frame_end - frame_start).max(0) as f32 + 1.0;
        let done = (frame - frame_start).max(0) as f32 + 1.0;
        return Some(ParsedSignal::Progress((done / span).clamp(0.0, 1.0)));
    }

    None
}

/// Extract the frame number from a `Fra:N` prefix, as Blender emits at the
/// start of every progress line in background mode.
fn parse_frame_number(line: &str) -> Option<i64> {
    let rest = line.strip_prefix("Fra:")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_saved_notice() {
        let signal = parse_blender_line("Saved: '/tmp/output/0001.png'", 1, 10);
        assert_eq!(
            signal,
            Some(ParsedSignal::Saved {
                path: "/tmp/output/0001.png".to_string()
            })
        );
    }

    #[test]
    fn parses_error_line() {
        let signal = parse_blender_line("Error: File not found", 1, 10);
        assert_eq!(
            signal,
            Some(ParsedSignal::Error {
                message: "File not found".to_string()
            })
        );
    }

    #[test]
    fn parses_warning_line() {
        let signal = parse_blender_line("Warning: deprecated setting", 1, 10);
        assert_eq!(
            signal,
            Some(ParsedSignal::Warning {
                message: "deprecated setting".to_string()
            })
        );
    }

    #[test]
    fn parses_frame_progress() {
        let signal = parse_blender_line("Fra:5 Mem:120.00M | Scene", 1, 10);
        assert_eq!(signal, Some(ParsedSignal::Progress(0.5)));
    }

    #[test]
    fn progress_clamped_at_completion() {
        let signal = parse_blender_line("Fra:10 Mem:120.00M | Scene", 1, 10);
        assert_eq!(signal, Some(ParsedSignal::Progress(1.0)));
    }

    #[test]
    fn ordinary_line_returns_none() {
        assert_eq!(parse_blender_line("Blender 4.1.0", 1, 10), None);
    }
}
