//! Raw MIDI channel messages: status byte first, `status = type | channel`.

use smallvec::SmallVec;

/// Note Off status nibble.
pub const NOTE_OFF: u8 = 0x80;
/// Note On status nibble.
pub const NOTE_ON: u8 = 0x90;
/// Polyphonic aftertouch status nibble.
pub const POLY_AFTERTOUCH: u8 = 0xA0;
/// Control Change status nibble.
pub const CONTROL_CHANGE: u8 = 0xB0;
/// Program Change status nibble.
pub const PROGRAM_CHANGE: u8 = 0xC0;
/// Channel aftertouch status nibble.
pub const CHANNEL_AFTERTOUCH: u8 = 0xD0;
/// Pitch bend status nibble.
pub const PITCH_BEND: u8 = 0xE0;

/// Split a status byte into its message type and channel.
#[inline]
pub fn split_status(status: u8) -> (u8, u8) {
    (status & 0xF0, status & 0x0F)
}

/// Human-readable name for a message type (the high nibble of a status byte).
pub fn message_type_name(message_type: u8) -> &'static str {
    match message_type & 0xF0 {
        NOTE_OFF => "NOTEOFF",
        NOTE_ON => "NOTEON",
        POLY_AFTERTOUCH => "POLYTOUCH",
        CONTROL_CHANGE => "CC",
        PROGRAM_CHANGE => "PROGCHANGE",
        CHANNEL_AFTERTOUCH => "CHANPRESS",
        PITCH_BEND => "PITCHWHEEL",
        _ => "UNKNOWN",
    }
}

/// An owned raw MIDI message, as delivered to input handlers and accepted by
/// senders. Channel messages are at most three bytes, so the payload lives
/// inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    bytes: SmallVec<[u8; 3]>,
}

impl RawMessage {
    /// Copy `bytes` into an owned message.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: SmallVec::from_slice(bytes),
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        let channel = channel.min(15); // MIDI channels are 0-15
        Self::from_bytes(&[NOTE_ON | channel, note & 0x7F, velocity & 0x7F])
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        let channel = channel.min(15);
        Self::from_bytes(&[NOTE_OFF | channel, note & 0x7F, velocity & 0x7F])
    }

    pub fn control_change(channel: u8, cc_number: u8, value: u8) -> Self {
        let channel = channel.min(15);
        Self::from_bytes(&[CONTROL_CHANGE | channel, cc_number & 0x7F, value & 0x7F])
    }

    pub fn program_change(channel: u8, program: u8) -> Self {
        let channel = channel.min(15);
        Self::from_bytes(&[PROGRAM_CHANGE | channel, program & 0x7F])
    }

    /// `value`: signed 14-bit (-8192 to 8191).
    pub fn pitch_bend(channel: u8, value: i16) -> Self {
        let channel = channel.min(15);
        // Convert signed value (-8192 to 8191) to unsigned 14-bit (0 to 16383)
        let unsigned = (value as i32 + 8192).clamp(0, 16383) as u16;
        let lsb = (unsigned & 0x7F) as u8;
        let msb = ((unsigned >> 7) & 0x7F) as u8;
        Self::from_bytes(&[PITCH_BEND | channel, lsb, msb])
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn status(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// The high nibble of the status byte.
    pub fn message_type(&self) -> Option<u8> {
        self.status().map(|s| s & 0xF0)
    }

    /// The low nibble of the status byte.
    pub fn channel(&self) -> Option<u8> {
        self.status().map(|s| s & 0x0F)
    }
}

impl AsRef<[u8]> for RawMessage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&[u8]> for RawMessage {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_message() {
        let msg = RawMessage::note_on(0, 60, 100);
        assert_eq!(msg.bytes(), &[0x90, 60, 100]);
        assert_eq!(msg.message_type(), Some(NOTE_ON));
        assert_eq!(msg.channel(), Some(0));
    }

    #[test]
    fn test_note_off_message() {
        let msg = RawMessage::note_off(3, 64, 0);
        assert_eq!(msg.bytes(), &[0x83, 64, 0]);
    }

    #[test]
    fn test_cc_message() {
        let msg = RawMessage::control_change(15, 64, 0);
        assert_eq!(msg.bytes(), &[0xBF, 64, 0]);
    }

    #[test]
    fn test_program_change_message() {
        let msg = RawMessage::program_change(9, 0);
        assert_eq!(msg.bytes(), &[0xC9, 0]);
        assert_eq!(msg.len(), 2);
    }

    #[test]
    fn test_pitch_bend_message() {
        // Center (no bend)
        let msg = RawMessage::pitch_bend(0, 0);
        assert_eq!(msg.status(), Some(0xE0));
        assert_eq!((msg.bytes()[1] as u16) | ((msg.bytes()[2] as u16) << 7), 8192);

        // Max bend up
        let msg = RawMessage::pitch_bend(0, 8191);
        assert_eq!((msg.bytes()[1] as u16) | ((msg.bytes()[2] as u16) << 7), 16383);

        // Max bend down
        let msg = RawMessage::pitch_bend(0, -8192);
        assert_eq!((msg.bytes()[1] as u16) | ((msg.bytes()[2] as u16) << 7), 0);
    }

    #[test]
    fn test_pitch_bend_clamping() {
        let msg = RawMessage::pitch_bend(0, -10000);
        let unsigned = (msg.bytes()[1] as u16) | ((msg.bytes()[2] as u16) << 7);
        assert_eq!(unsigned, 0, "should clamp to min");

        let msg = RawMessage::pitch_bend(0, 10000);
        let unsigned = (msg.bytes()[1] as u16) | ((msg.bytes()[2] as u16) << 7);
        assert_eq!(unsigned, 16383, "should clamp to max");
    }

    #[test]
    fn test_channel_clamping() {
        // Channel > 15 clamps to 15
        assert_eq!(RawMessage::note_on(200, 60, 100).status(), Some(0x9F));
        assert_eq!(RawMessage::control_change(16, 7, 127).status(), Some(0xBF));
        assert_eq!(RawMessage::program_change(255, 42).status(), Some(0xCF));
    }

    #[test]
    fn test_data_byte_masking() {
        // Data bytes > 127 are masked to 7-bit
        let msg = RawMessage::note_on(0, 0xFF, 0xFF);
        assert_eq!(msg.bytes()[1], 0x7F);
        assert_eq!(msg.bytes()[2], 0x7F);
    }

    #[test]
    fn test_split_status() {
        assert_eq!(split_status(0x95), (NOTE_ON, 5));
        assert_eq!(split_status(0xBF), (CONTROL_CHANGE, 15));
        assert_eq!(split_status(0x80), (NOTE_OFF, 0));
    }

    #[test]
    fn test_message_type_names() {
        assert_eq!(message_type_name(NOTE_ON), "NOTEON");
        assert_eq!(message_type_name(0x9C), "NOTEON"); // channel bits ignored
        assert_eq!(message_type_name(PITCH_BEND), "PITCHWHEEL");
        assert_eq!(message_type_name(0x70), "UNKNOWN");
    }

    #[test]
    fn test_from_bytes_round_trip() {
        let raw = [0xB2, 7, 100];
        let msg = RawMessage::from_bytes(&raw);
        assert_eq!(msg.bytes(), &raw);
        assert_eq!(msg.channel(), Some(2));
    }

    #[test]
    fn test_empty_message() {
        let msg = RawMessage::from_bytes(&[]);
        assert!(msg.is_empty());
        assert_eq!(msg.status(), None);
        assert_eq!(msg.message_type(), None);
    }
}
