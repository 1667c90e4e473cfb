// Output file naming
// Progression files are named from their parameters; regenerated sketches get
// a random suffix so concurrent runs never collide

use uuid::Uuid;

use crate::arranger::{Subdivision, TimeSignature};

/// Longest clip-name fragment embedded in a regenerated file name
pub const MAX_FILENAME_NAME_CHARS: usize = 30;

/// Lowercase, runs of anything but [a-z0-9] collapsed to '-', trimmed
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Runs of anything but [A-Za-z0-9_-] collapsed to '_', capped in length
pub fn sanitize_for_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    out.chars().take(MAX_FILENAME_NAME_CHARS).collect()
}

/// Deterministic default name for a progression file
///
/// Identical parameters and vibe text always give the same name.
pub fn progression_filename<S: AsRef<str>>(
    time_signature: TimeSignature,
    subdivision: Subdivision,
    bars: u32,
    roots: &[S],
    vibe: &str,
) -> String {
    let roots = roots
        .iter()
        .map(|r| r.as_ref())
        .collect::<Vec<_>>()
        .join("-");
    format!(
        "chordprog_{}-{}_div{}_bars{}_roots_{}_{}.mid",
        time_signature.beats_per_bar,
        time_signature.beat_unit,
        subdivision.value(),
        bars,
        roots,
        slugify(vibe)
    )
}

/// Six hex characters of a fresh v4 UUID
pub fn random_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(6);
    suffix
}

/// `regen_<sanitized name>_<random suffix>.mid`
pub fn regen_filename(clip_name: &str) -> String {
    format!(
        "regen_{}_{}.mid",
        sanitize_for_filename(clip_name),
        random_suffix()
    )
}
