use std::io::{self, Write};

const BELL: &[u8] = b"\x07";

/// Completion feedback. Rings the terminal bell when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundPlayer {
    enabled: bool,
}

impl SoundPlayer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Play the completion cue into `out`; returns whether anything was written.
    pub fn play_completion(&self, out: &mut impl Write) -> io::Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        out.write_all(BELL)?;
        out.flush()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_when_disabled() {
        let mut out = Vec::new();
        assert!(!SoundPlayer::new(false).play_completion(&mut out).unwrap());
        assert!(out.is_empty());

        assert!(SoundPlayer::new(true).play_completion(&mut out).unwrap());
        assert_eq!(out, BELL);
    }
}
