// Pitch classes - Chromatic note-name table

/// The twelve chromatic pitch classes, index = semitones above C
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Semitone offset of a root name above C (case-insensitive)
///
/// Returns `None` for anything outside the sharp-spelled chromatic table.
pub fn pitch_class_offset(name: &str) -> Option<u8> {
    let upper = name.to_uppercase();
    PITCH_CLASS_NAMES
        .iter()
        .position(|&pc| pc == upper)
        .map(|idx| idx as u8)
}

/// Return the first root name that is not a recognized pitch class
pub fn find_unknown_root<S: AsRef<str>>(roots: &[S]) -> Option<&str> {
    roots
        .iter()
        .map(|r| r.as_ref())
        .find(|r| pitch_class_offset(r).is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_offsets() {
        assert_eq!(pitch_class_offset("C"), Some(0));
        assert_eq!(pitch_class_offset("F#"), Some(6));
        assert_eq!(pitch_class_offset("B"), Some(11));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(pitch_class_offset("a"), Some(9));
        assert_eq!(pitch_class_offset("g#"), Some(8));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(pitch_class_offset("H"), None);
        assert_eq!(pitch_class_offset("Bb"), None);
        assert_eq!(pitch_class_offset(""), None);
    }

    #[test]
    fn test_find_unknown_root() {
        assert_eq!(find_unknown_root(&["C", "G", "A"]), None);
        assert_eq!(find_unknown_root(&["C", "H", "X"]), Some("H"));
    }
}
