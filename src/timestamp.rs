/// Number of seconds between UNIX Epoch and FIT Epoch.
///
/// Add this value to any FIT timestamp to get the equivalent UNIX timestamp.
///
pub const TIMESTAMP_OFFSET: u32 = 631065600;

/// Field number carrying a message's absolute timestamp.
pub const TIMESTAMP_FIELD: u8 = 253;

pub fn timestamp_fit_to_unix(fit_ts: u32) -> Option<u32> {
    fit_ts.checked_add(TIMESTAMP_OFFSET)
}

pub fn timestamp_unix_to_fit(unix_ts: u32) -> Option<u32> {
    unix_ts.checked_sub(TIMESTAMP_OFFSET)
}

/// Rolling reference for compressed-timestamp record headers.
///
/// A compressed header carries only the low five bits of the timestamp; the
/// reference is seeded and advanced by every absolute timestamp seen in the
/// stream, and reconciled forward when the five-bit offset wraps.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingTimestamp {
    reference: Option<u32>,
}

impl RollingTimestamp {
    pub fn new() -> Self {
        RollingTimestamp { reference: None }
    }

    /// Records an absolute timestamp decoded from a data message.
    pub fn update(&mut self, timestamp: u32) {
        self.reference = Some(timestamp);
    }

    /// Reconstructs an absolute timestamp from a five-bit header offset.
    ///
    /// Returns `None` when no reference has been established yet, in which
    /// case the compressed header cannot be resolved.
    pub fn resolve(&mut self, offset: u8) -> Option<u32> {
        let reference = self.reference?;
        let offset = u32::from(offset & 0x1f);
        let timestamp = if offset >= reference & 0x1f {
            (reference & !0x1f) | offset
        } else {
            // Offset rolled over; advance to the next 32-second window.
            ((reference & !0x1f) | offset) + 0x20
        };
        self.reference = Some(timestamp);
        Some(timestamp)
    }

    pub fn reset(&mut self) {
        self.reference = None;
    }
}
