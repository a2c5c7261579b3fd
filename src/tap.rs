//! Tap-tempo: derive a delay interval from two consecutive pedal presses.

/// Two taps further apart than this do not pair; the second tap starts a new
/// pair instead.
pub const PAIRING_WINDOW_MS: u64 = 2000;

/// Per-delay tap state. The stored timestamp is consumed and overwritten on
/// every press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapTempo {
    last_tap_ms: Option<u64>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press at `now_ms`.
    ///
    /// Returns the interval to the previous press when the two pair up
    /// (previous press known and within the pairing window), `None` when this
    /// press starts a new pair.
    ///
    /// `clear_on_success` controls what a third press inside the window does:
    /// when set, a successful pairing clears the stored press so the third
    /// starts fresh; when unset, the third press pairs with the second.
    pub fn record(&mut self, now_ms: u64, clear_on_success: bool) -> Option<u16> {
        let previous = self.last_tap_ms.replace(now_ms);
        let interval = now_ms.saturating_sub(previous?);
        if interval > PAIRING_WINDOW_MS {
            return None;
        }
        if clear_on_success {
            self.last_tap_ms = None;
        }
        Some(interval as u16)
    }
}

/// Split an interval into the device's two payload bytes: a 4-bit high field
/// (bits 10-7) and a 7-bit low field (bits 6-0).
pub fn encode_interval(interval_ms: u16) -> (u8, u8) {
    (((interval_ms >> 7) & 0x0F) as u8, (interval_ms & 0x7F) as u8)
}
