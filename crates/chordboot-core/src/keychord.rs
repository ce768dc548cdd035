//! Key-chord table and the held-key detector.

use chordboot_provider::KeyInput;
use std::thread;
use std::time::Duration;

/// Upper bound on registered chords across every configuration tier.
pub const KEY_CHORD_MAX: usize = 16;

/// Upper bound on keys inside one chord.
pub const KEY_CHORD_MAX_KEYS: usize = 3;

/// A set of key codes that must all be held at once.
///
/// Duplicate codes are kept as written. A chord without keys never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChord {
    keys: Vec<u32>,
}

impl KeyChord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chord from `codes`, keeping at most [`KEY_CHORD_MAX_KEYS`].
    pub fn from_keys<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut chord = Self::new();
        for code in codes {
            chord.push(code);
        }
        chord
    }

    /// Append `code`; returns `false` when the chord is already full.
    pub fn push(&mut self, code: u32) -> bool {
        if self.keys.len() >= KEY_CHORD_MAX_KEYS {
            return false;
        }
        self.keys.push(code);
        true
    }

    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// True when every key of a non-empty chord is currently held.
    pub fn is_held<K>(&self, input: &K) -> bool
    where
        K: KeyInput + ?Sized,
    {
        !self.keys.is_empty() && self.keys.iter().all(|code| input.key_pressed(*code))
    }
}

/// Index of the first chord in table order whose keys are all held.
pub fn detect<K>(chords: &[KeyChord], input: &K) -> Option<usize>
where
    K: KeyInput + ?Sized,
{
    chords.iter().position(|chord| chord.is_held(input))
}

/// Block for `window`, then sample the chords once.
///
/// The sleep always runs to completion; keys must still be held when it ends.
pub fn wait_and_detect<K>(chords: &[KeyChord], input: &K, window: Duration) -> Option<usize>
where
    K: KeyInput + ?Sized,
{
    if !window.is_zero() {
        thread::sleep(window);
    }
    detect(chords, input)
}
