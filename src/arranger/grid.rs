// Chord Grid - Time signature, subdivision, and slot counting
// Decides how many chord slots an arrangement has before any MIDI work

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Most chord slots one arrangement may hold (4096 bars of 4/4 in sixteenths)
pub const MAX_TOTAL_SLOTS: usize = 65_536;

/// Caller-supplied arrangement parameters are structurally invalid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("subdivision must be one of 1, 2, 4, 8, 16 (got {0})")]
    InvalidSubdivision(u32),

    #[error("bars must be >= 1 (got {0})")]
    InvalidBars(u32),

    #[error("invalid time signature: {0}")]
    InvalidTimeSignature(String),

    #[error("invalid root note: {0}")]
    UnknownRoot(String),

    #[error("at least one root note is required")]
    NoRoots,

    #[error("at least one chord shape is required")]
    NoChords,

    #[error(
        "{bars} bar(s) of {beats_per_bar} beats at 1/{subdivision} do not divide into whole chord slots"
    )]
    FractionalSlots {
        beats_per_bar: u32,
        subdivision: u32,
        bars: u32,
    },

    #[error("arrangement needs {slots} chord slots, more than the limit of {max}")]
    TooManySlots { slots: u64, max: usize },
}

/// Musical time signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Beats in one bar (numerator)
    pub beats_per_bar: u32,

    /// Note value that gets one beat (denominator, a power of two)
    pub beat_unit: u32,
}

impl TimeSignature {
    pub const fn new(beats_per_bar: u32, beat_unit: u32) -> Self {
        TimeSignature {
            beats_per_bar,
            beat_unit,
        }
    }

    /// 4/4
    pub const fn common() -> Self {
        Self::new(4, 4)
    }

    /// Check that the signature can be written as a MIDI time signature
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.beats_per_bar == 0 || self.beats_per_bar > u8::MAX as u32 {
            return Err(ValidationError::InvalidTimeSignature(format!(
                "{} beats per bar",
                self.beats_per_bar
            )));
        }
        if !self.beat_unit.is_power_of_two() || self.beat_unit > 32 {
            return Err(ValidationError::InvalidTimeSignature(format!(
                "beat unit {} is not a power of two up to 32",
                self.beat_unit
            )));
        }
        Ok(())
    }

    /// Denominator as the power of two MIDI stores (4 -> 2)
    pub fn beat_unit_exponent(&self) -> u8 {
        self.beat_unit.trailing_zeros() as u8
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::common()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats_per_bar, self.beat_unit)
    }
}

impl FromStr for TimeSignature {
    type Err = ValidationError;

    /// Parse "3/4" style signatures
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTimeSignature(s.to_string());

        let (num, den) = s.split_once('/').ok_or_else(invalid)?;
        let beats_per_bar = num.trim().parse().map_err(|_| invalid())?;
        let beat_unit = den.trim().parse().map_err(|_| invalid())?;

        let signature = TimeSignature::new(beats_per_bar, beat_unit);
        signature.validate()?;
        Ok(signature)
    }
}

/// Length of one chord slot, as a fraction of a whole note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subdivision {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

impl Subdivision {
    /// Denominator of the note value (Quarter -> 4)
    pub fn value(&self) -> u32 {
        match self {
            Subdivision::Whole => 1,
            Subdivision::Half => 2,
            Subdivision::Quarter => 4,
            Subdivision::Eighth => 8,
            Subdivision::Sixteenth => 16,
        }
    }

    /// Ticks in one slot; subdivisions are measured against a quarter-note beat
    pub fn ticks_per_slot(&self, ticks_per_beat: u16) -> u32 {
        ticks_per_beat as u32 * 4 / self.value()
    }
}

impl TryFrom<u32> for Subdivision {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Subdivision::Whole),
            2 => Ok(Subdivision::Half),
            4 => Ok(Subdivision::Quarter),
            8 => Ok(Subdivision::Eighth),
            16 => Ok(Subdivision::Sixteenth),
            other => Err(ValidationError::InvalidSubdivision(other)),
        }
    }
}

/// Number of chord slots: bars * beats_per_bar * subdivision / 4
///
/// Fails when bars is zero, when the product does not divide evenly (the
/// signature and subdivision do not fit together), or when the result
/// exceeds `MAX_TOTAL_SLOTS`.
pub fn total_slots(
    time_signature: TimeSignature,
    subdivision: Subdivision,
    bars: u32,
) -> Result<usize, ValidationError> {
    time_signature.validate()?;
    if bars < 1 {
        return Err(ValidationError::InvalidBars(bars));
    }

    let sixteenths =
        bars as u64 * time_signature.beats_per_bar as u64 * subdivision.value() as u64;
    if sixteenths % 4 != 0 {
        return Err(ValidationError::FractionalSlots {
            beats_per_bar: time_signature.beats_per_bar,
            subdivision: subdivision.value(),
            bars,
        });
    }

    let slots = sixteenths / 4;
    if slots > MAX_TOTAL_SLOTS as u64 {
        return Err(ValidationError::TooManySlots {
            slots,
            max: MAX_TOTAL_SLOTS,
        });
    }

    Ok(slots as usize)
}
