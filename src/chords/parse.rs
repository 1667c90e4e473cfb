// Interval Parser - Turn generated text into chord shapes
// Line mode for voicing lists, JSON mode for full sketches

use thiserror::Error;

use super::types::{ChordSpec, SketchSpec};

/// Generator output could not be read as a sketch document
///
/// Callers degrade to `SketchSpec::default()` and log this; it never aborts
/// a regeneration on its own.
#[derive(Debug, Error)]
#[error("Could not parse sketch JSON: {0}")]
pub struct ParseFailure(#[from] serde_json::Error);

/// Parse line-mode output: one chord per non-blank line
///
/// Each line looks like `[0, 4, 7]`. Tokens that are not plain non-negative
/// integers are dropped, and a line with nothing left becomes a major triad
/// so that every requested slot still sounds.
pub fn parse_simple(text: &str) -> Vec<ChordSpec> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let intervals = parse_simple_line(line);
            if intervals.is_empty() {
                ChordSpec::major_triad()
            } else {
                ChordSpec::new(intervals)
            }
        })
        .collect()
}

/// Extract the integer tokens from one line, without the triad fallback
pub fn parse_simple_line(line: &str) -> Vec<i32> {
    line.trim()
        .trim_matches(|c| c == '[' || c == ']' || c == ' ')
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|token| token.parse::<i32>().ok())
        .collect()
}

/// Parse JSON-mode output into a sketch
///
/// Absent fields take their defaults. A reply wrapped in a Markdown code
/// fence is unwrapped first; anything else that is not a JSON object of the
/// expected shape is a `ParseFailure`.
pub fn parse_structured(text: &str) -> Result<SketchSpec, ParseFailure> {
    let body = strip_code_fence(text);
    Ok(serde_json::from_str(body)?)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_bracketed_line() {
        let chords = parse_simple("[0, 4, 7]");
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].intervals, vec![0, 4, 7]);
    }

    #[test]
    fn test_simple_garbage_line_defaults_to_triad() {
        let chords = parse_simple("garbage");
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].intervals, vec![0, 4, 7]);
    }

    #[test]
    fn test_simple_skips_blank_lines() {
        let chords = parse_simple("[0, 3, 7]\n\n   \n[0, 4, 7, 11]\n");
        assert_eq!(chords.len(), 2);
        assert_eq!(chords[0].intervals, vec![0, 3, 7]);
        assert_eq!(chords[1].intervals, vec![0, 4, 7, 11]);
    }

    #[test]
    fn test_simple_drops_invalid_tokens() {
        assert_eq!(parse_simple_line("[0, -3, x, 7, 10.5, 14]"), vec![0, 7, 14]);
        assert_eq!(parse_simple_line("0,4,7"), vec![0, 4, 7]);
    }

    #[test]
    fn test_simple_empty_text() {
        assert!(parse_simple("").is_empty());
        assert!(parse_simple("\n\n").is_empty());
    }

    #[test]
    fn test_simple_uses_default_timing() {
        let chords = parse_simple("[0, 5, 7]");
        assert_eq!(chords[0].duration_beats, 1.0);
        assert_eq!(chords[0].velocity, 100);
    }

    #[test]
    fn test_structured_full_document() {
        let text = r#"{"tempo_bpm":120,"base_note":64,"chords":[{"intervals":[0,3,7],"duration_beats":2,"velocity":80}]}"#;
        let sketch = parse_structured(text).unwrap();

        assert_eq!(sketch.tempo_bpm, 120.0);
        assert_eq!(sketch.base_note, 64);
        assert_eq!(sketch.chords.len(), 1);
        assert_eq!(sketch.chords[0].intervals, vec![0, 3, 7]);
        assert_eq!(sketch.chords[0].duration_beats, 2.0);
        assert_eq!(sketch.chords[0].velocity, 80);
    }

    #[test]
    fn test_structured_missing_fields_use_defaults() {
        let sketch = parse_structured(r#"{"chords":[{"intervals":[2,5,9]},{}]}"#).unwrap();

        assert_eq!(sketch.tempo_bpm, 90.0);
        assert_eq!(sketch.base_note, 60);
        assert_eq!(sketch.chords.len(), 2);
        assert_eq!(sketch.chords[0].duration_beats, 1.0);
        assert_eq!(sketch.chords[0].velocity, 100);
        assert!(sketch.chords[1].is_empty());
    }

    #[test]
    fn test_structured_malformed_falls_back() {
        let result = parse_structured("Sure! Here is a chord progression: C G Am F");
        assert!(result.is_err());

        let sketch = result.unwrap_or_default();
        assert!(sketch.chords.is_empty());
        assert_eq!(sketch.tempo_bpm, 90.0);
        assert_eq!(sketch.base_note, 60);
    }

    #[test]
    fn test_structured_code_fence() {
        let text = "```json\n{\"tempo_bpm\": 100, \"chords\": [{\"intervals\": [0, 4, 7]}]}\n```";
        let sketch = parse_structured(text).unwrap();
        assert_eq!(sketch.tempo_bpm, 100.0);
        assert_eq!(sketch.chords.len(), 1);
    }

    #[test]
    fn test_structured_wrong_shape_is_failure() {
        assert!(parse_structured("[1, 2, 3]").is_err());
        assert!(parse_structured(r#"{"chords": "none"}"#).is_err());
    }
}
