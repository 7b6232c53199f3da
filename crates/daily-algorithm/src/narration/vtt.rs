//! WebVTT / SRT cue parsing.

use std::sync::LazyLock;

use regex::Regex;

use super::SubtitleCue;

static RE_CUE_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(\d+):)?(\d{2}):(\d{2})[.,](\d{3})\s+-->\s+(?:(\d+):)?(\d{2}):(\d{2})[.,](\d{3})",
    )
    .unwrap()
});

fn to_millis(hours: Option<&str>, minutes: &str, seconds: &str, millis: &str) -> u64 {
    let parse = |s: &str| s.parse::<u64>().unwrap_or(0);
    hours.map(parse).unwrap_or(0) * 3_600_000
        + parse(minutes) * 60_000
        + parse(seconds) * 1_000
        + parse(millis)
}

/// Parses cues from subtitle text. Cue text lines are joined with a space;
/// headers, identifiers and cues without text are skipped.
pub fn parse_cues(content: &str) -> Vec<SubtitleCue> {
    let mut cues = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(caps) = RE_CUE_TIMING.captures(line.trim()) else {
            continue;
        };

        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("0");
        let start = to_millis(caps.get(1).map(|m| m.as_str()), group(2), group(3), group(4));
        let end = to_millis(caps.get(5).map(|m| m.as_str()), group(6), group(7), group(8));

        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            let next = next.trim();
            if next.is_empty() {
                break;
            }
            text_lines.push(next.to_string());
            lines.next();
        }

        let text = text_lines.join(" ");
        if !text.is_empty() {
            cues.push(SubtitleCue::new(text, start, end));
        }
    }

    cues
}
