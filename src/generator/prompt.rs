// Generator prompts
// Request text for sketches and voicings, plus the per-call nonce that keeps
// repeated requests from returning identical output

use uuid::Uuid;

/// Longest clip-name fragment embedded in a sketch prompt
pub const MAX_PROMPT_NAME_CHARS: usize = 50;

/// Random token appended to every request (request decorrelation)
pub fn request_nonce() -> String {
    let mut nonce = Uuid::new_v4().simple().to_string();
    nonce.truncate(8);
    nonce
}

/// Keep word characters, whitespace and hyphens, then cap the length
pub fn sanitize_for_prompt(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .take(MAX_PROMPT_NAME_CHARS)
        .collect()
}

/// Prompt asking for a structured JSON sketch inspired by a clip name
///
/// `clip_name` should already be sanitized.
pub fn sketch_prompt(clip_name: &str, nonce: &str) -> String {
    format!(
        "Create a chord-based MIDI sketch inspired by the name '{clip_name}'.\n\
         Return your response in JSON format ONLY, no explanation or markdown.\n\
         Example structure:\n\
         {{\n  \"tempo_bpm\": 90,\n  \"base_note\": 60,\n  \"chords\": [\n    \
         {{\"intervals\": [0, 4, 7], \"duration_beats\": 1, \"velocity\": 100}},\n    \
         {{\"intervals\": [2, 5, 9], \"duration_beats\": 2, \"velocity\": 90}}\n  ]\n}}\n\n\
         Use a musically expressive interpretation of the clip name.\n\
         # unique_id={nonce}"
    )
}

/// Prompt asking for one interval list per root, one per line
pub fn voicing_prompt<S: AsRef<str>>(vibe: &str, roots: &[S], nonce: &str) -> String {
    let roots = roots
        .iter()
        .map(|r| r.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Create a unique and creative chord voicing progression for a {vibe} style. \
         Use the root notes [{roots}] and express each chord as a list of semitone intervals \
         from the root (e.g., [0, 4, 7]). Vary the chord types and extensions. \
         Be inventive, no two runs should sound the same.\n\
         Return only one list of intervals per chord root.\n\
         # unique_id={nonce}"
    )
}
