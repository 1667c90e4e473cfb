// MIDI Export - Write compiled chord tracks as Standard MIDI Files using midly
// Single track, optional leading tempo and time-signature meta events

use std::fs;
use std::path::Path;

use midly::{
    num::{u28, u4},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use thiserror::Error;

use super::compile::{CompiledTrack, EventKind};
use super::grid::TimeSignature;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("ticks per beat must be between 1 and 32767 (got {0})")]
    InvalidPpq(u16),

    #[error("Failed to encode MIDI: {0}")]
    Encode(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// MIDI export options
#[derive(Debug, Clone)]
pub struct MidiExportOptions {
    /// Pulses per quarter note (PPQ) - 480 unless configured otherwise
    pub ppq: u16,

    /// Emit the track's tempo event when it has one
    pub include_tempo: bool,

    /// Emit the track's time-signature event when it has one
    pub include_time_signature: bool,

    /// Track name meta event
    pub track_name: Option<String>,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: 480,
            include_tempo: true,
            include_time_signature: true,
            track_name: Some("Chords".to_string()),
        }
    }
}

impl MidiExportOptions {
    pub fn with_ppq(ppq: u16) -> Self {
        MidiExportOptions {
            ppq,
            ..Default::default()
        }
    }
}

/// Export a compiled track to MIDI file bytes
pub fn export_midi(
    compiled: &CompiledTrack,
    options: &MidiExportOptions,
) -> Result<Vec<u8>, MidiError> {
    if options.ppq == 0 || options.ppq > 0x7FFF {
        return Err(MidiError::InvalidPpq(options.ppq));
    }

    let header = Header {
        format: Format::SingleTrack,
        timing: Timing::Metrical(options.ppq.into()),
    };

    let mut track = Track::new();

    if let Some(name) = &options.track_name {
        add_track_name(&mut track, name);
    }

    if options.include_tempo {
        if let Some(us_per_beat) = compiled.tempo_us_per_beat {
            add_tempo(&mut track, us_per_beat);
        }
    }

    if options.include_time_signature {
        if let Some(signature) = &compiled.time_signature {
            add_time_signature(&mut track, signature);
        }
    }

    for event in &compiled.events {
        let message = match event.kind {
            EventKind::NoteOn => MidiMessage::NoteOn {
                key: event.pitch.into(),
                vel: event.velocity.into(),
            },
            EventKind::NoteOff => MidiMessage::NoteOff {
                key: event.pitch.into(),
                vel: event.velocity.into(),
            },
        };
        track.push(TrackEvent {
            delta: event.delta_ticks.into(),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message,
            },
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header,
        tracks: vec![track],
    };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| MidiError::Encode(e.to_string()))?;

    Ok(bytes)
}

/// Encode and write a compiled track to `path`
///
/// The file is only created once encoding has succeeded.
pub fn write_midi_file(
    compiled: &CompiledTrack,
    options: &MidiExportOptions,
    path: &Path,
) -> Result<(), MidiError> {
    let bytes = export_midi(compiled, options)?;
    fs::write(path, bytes).map_err(|source| MidiError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn add_track_name<'a>(track: &mut Track<'a>, name: &'a str) {
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });
}

fn add_tempo(track: &mut Track<'_>, us_per_beat: u32) {
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(us_per_beat.into())),
    });
}

fn add_time_signature(track: &mut Track<'_>, signature: &TimeSignature) {
    // MIDI clocks per metronome click (24 for quarter note)
    let clocks_per_click = 24u8;

    // 32nd notes per quarter note (8)
    let thirty_seconds_per_quarter = 8u8;

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
            signature.beats_per_bar as u8,
            signature.beat_unit_exponent(),
            clocks_per_click,
            thirty_seconds_per_quarter,
        )),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arranger::compile::TimedEvent;
    use midly::num::u15;
    use tempfile::TempDir;

    fn triad_track() -> CompiledTrack {
        CompiledTrack {
            tempo_us_per_beat: Some(500_000),
            time_signature: None,
            events: vec![
                TimedEvent::note_on(60, 100),
                TimedEvent::note_on(64, 100),
                TimedEvent::note_on(67, 100),
                TimedEvent::note_off(60, 480),
                TimedEvent::note_off(64, 0),
                TimedEvent::note_off(67, 0),
            ],
        }
    }

    #[test]
    fn test_export_round_trips_through_midly() {
        let bytes = export_midi(&triad_track(), &MidiExportOptions::default()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();

        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
        assert_eq!(smf.tracks.len(), 1);

        // name + tempo + 6 notes + end of track
        let track = &smf.tracks[0];
        assert_eq!(track.len(), 9);

        match &track[1].kind {
            TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                assert_eq!(u32::from(*tempo), 500_000)
            }
            other => panic!("Expected Tempo event, got {:?}", other),
        }

        assert_eq!(u32::from(track[5].delta), 480);
        match &track[5].kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOff { key, .. },
                ..
            } => assert_eq!(u8::from(*key), 60),
            other => panic!("Expected NoteOff event, got {:?}", other),
        }
    }

    #[test]
    fn test_time_signature_event() {
        let compiled = CompiledTrack {
            tempo_us_per_beat: None,
            time_signature: Some(TimeSignature::new(6, 8)),
            events: Vec::new(),
        };
        let options = MidiExportOptions {
            track_name: None,
            ..Default::default()
        };
        let bytes = export_midi(&compiled, &options).unwrap();
        let smf = Smf::parse(&bytes).unwrap();

        let track = &smf.tracks[0];
        assert_eq!(track.len(), 2);
        match &track[0].kind {
            TrackEventKind::Meta(MetaMessage::TimeSignature(num, den, _, _)) => {
                assert_eq!(*num, 6);
                assert_eq!(*den, 3);
            }
            other => panic!("Expected TimeSignature event, got {:?}", other),
        }
    }

    #[test]
    fn test_meta_events_can_be_disabled() {
        let options = MidiExportOptions {
            ppq: 960,
            include_tempo: false,
            include_time_signature: false,
            track_name: None,
        };
        let bytes = export_midi(&triad_track(), &options).unwrap();
        let smf = Smf::parse(&bytes).unwrap();

        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(960)));
        assert_eq!(smf.tracks[0].len(), 7);
    }

    #[test]
    fn test_invalid_ppq() {
        let result = export_midi(&triad_track(), &MidiExportOptions::with_ppq(0));
        assert!(matches!(result, Err(MidiError::InvalidPpq(0))));
    }

    #[test]
    fn test_write_midi_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("triad.mid");

        write_midi_file(&triad_track(), &MidiExportOptions::default(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(Smf::parse(&bytes).is_ok());
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("triad.mid");

        let result = write_midi_file(&triad_track(), &MidiExportOptions::default(), &path);
        assert!(matches!(result, Err(MidiError::Io { .. })));
    }
}
