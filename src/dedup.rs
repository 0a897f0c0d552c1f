//! Message Deduplication
//!
//! Remembers which (speaker, line) pairs have already been shown this session
//! so quest remarks triggered by ordinary conversation appear once.

use std::collections::HashSet;
use tracing::debug;

/// Session-scoped record of lines already spoken.
///
/// Cleared on every session load, never on save or quest progress: reloading
/// lets the player hear one-time remarks again.
#[derive(Debug, Default)]
pub struct MessageDedup {
    spoken: HashSet<(String, String)>,
}

impl MessageDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `speaker` may say `message` now.
    ///
    /// The first natural request for a pair is granted and recorded; later
    /// ones are refused. A `forced` request (the player is holding an item
    /// that brings up the topic) is always granted and leaves the record
    /// untouched, so it never suppresses a later natural trigger.
    pub fn should_speak(&mut self, speaker: &str, message: &str, forced: bool) -> bool {
        if forced {
            return true;
        }

        let fresh = self
            .spoken
            .insert((speaker.to_string(), message.to_string()));
        if !fresh {
            debug!("Suppressing repeated line from {}", speaker);
        }
        fresh
    }

    /// True if the pair was already recorded this session.
    pub fn has_spoken(&self, speaker: &str, message: &str) -> bool {
        self.spoken
            .contains(&(speaker.to_string(), message.to_string()))
    }

    /// Forget everything (session load).
    pub fn clear(&mut self) {
        self.spoken.clear();
    }

    pub fn len(&self) -> usize {
        self.spoken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spoken.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_requests_speak_once() {
        let mut dedup = MessageDedup::new();
        let pairs = [("Clint", "a"), ("Clint", "b"), ("Robin", "a")];

        for (speaker, message) in pairs {
            assert!(dedup.should_speak(speaker, message, false));
        }
        for _ in 0..3 {
            for (speaker, message) in pairs {
                assert!(!dedup.should_speak(speaker, message, false));
            }
        }
        assert_eq!(dedup.len(), 3);
    }

    #[test]
    fn test_forced_requests_always_speak() {
        let mut dedup = MessageDedup::new();
        for _ in 0..5 {
            assert!(dedup.should_speak("Robin", "hello", true));
        }

        // Forcing never recorded the pair, so the natural trigger still fires once
        assert!(!dedup.has_spoken("Robin", "hello"));
        assert!(dedup.should_speak("Robin", "hello", false));
        assert!(!dedup.should_speak("Robin", "hello", false));
        assert!(dedup.should_speak("Robin", "hello", true));
    }

    #[test]
    fn test_speaker_and_message_are_not_concatenated() {
        let mut dedup = MessageDedup::new();
        assert!(dedup.should_speak("Ab", "c", false));
        assert!(dedup.should_speak("A", "bc", false));
    }

    #[test]
    fn test_clear_resets_session() {
        let mut dedup = MessageDedup::new();
        assert!(dedup.should_speak("Jas", "shiny", false));
        dedup.clear();
        assert!(dedup.is_empty());
        assert!(dedup.should_speak("Jas", "shiny", false));
    }
}
