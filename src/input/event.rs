use crate::{
    error::Discard,
    input::{KeyKind, KeyTransition},
};

/*
evdev Record Layout
===================

Every read from /dev/input/eventN yields whole `struct input_event` records:

    struct input_event {
        struct timeval time;   // 16 bytes on 64-bit, 8 on 32-bit
        __u16 type;            // EV_KEY, EV_SYN, EV_MSC, ...
        __u16 code;            // KEY_A, BTN_LEFT, ...
        __s32 value;           // for EV_KEY: 0 release, 1 press, 2 repeat
    };

The timestamp width depends on the target, so the fixed-size tail (type,
code, value) is addressed from the END of the record. That keeps decoding
independent of how wide `timeval` is on the running system.

A single key stroke usually arrives as three records:

    EV_MSC  MSC_SCAN  <scancode>
    EV_KEY  KEY_A     1
    EV_SYN  SYN_REPORT 0

Only the EV_KEY record matters here. Auto-repeat (value 2) is dropped so a
held key produces exactly one press edge.
*/

/// Size of one raw record on this target.
pub const RECORD_SIZE: usize = std::mem::size_of::<libc::input_event>();

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_MSC: u16 = 0x04;

const TYPE_OFFSET: usize = RECORD_SIZE - 8;
const CODE_OFFSET: usize = RECORD_SIZE - 6;
const VALUE_OFFSET: usize = RECORD_SIZE - 4;

/// Key event values as reported by the kernel.
const VALUE_RELEASE: i32 = 0;
const VALUE_PRESS: i32 = 1;

/// The fields of an `input_event` that decoding looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub ev_type: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub const fn key(code: u16, value: i32) -> Self {
        Self {
            ev_type: EV_KEY,
            code,
            value,
        }
    }

    /// Parse a record in native byte order. Anything shorter than a full
    /// record is rejected; partial reads are never reassembled.
    pub fn parse(raw: &[u8]) -> Result<Self, Discard> {
        if raw.len() < RECORD_SIZE {
            return Err(Discard::ShortRead {
                got: raw.len(),
                expected: RECORD_SIZE,
            });
        }

        let ev_type = u16::from_ne_bytes([raw[TYPE_OFFSET], raw[TYPE_OFFSET + 1]]);
        let code = u16::from_ne_bytes([raw[CODE_OFFSET], raw[CODE_OFFSET + 1]]);
        let value = i32::from_ne_bytes([
            raw[VALUE_OFFSET],
            raw[VALUE_OFFSET + 1],
            raw[VALUE_OFFSET + 2],
            raw[VALUE_OFFSET + 3],
        ]);

        Ok(Self {
            ev_type,
            code,
            value,
        })
    }

    /// Serialize with a zeroed timestamp, the way the kernel would lay it out.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut raw = [0u8; RECORD_SIZE];
        raw[TYPE_OFFSET..CODE_OFFSET].copy_from_slice(&self.ev_type.to_ne_bytes());
        raw[CODE_OFFSET..VALUE_OFFSET].copy_from_slice(&self.code.to_ne_bytes());
        raw[VALUE_OFFSET..].copy_from_slice(&self.value.to_ne_bytes());
        raw
    }

    pub fn transition(&self) -> Result<KeyTransition, Discard> {
        if self.ev_type != EV_KEY {
            return Err(Discard::NotKeyEvent {
                ev_type: self.ev_type,
            });
        }

        let kind = match self.value {
            VALUE_RELEASE => KeyKind::Released,
            VALUE_PRESS => KeyKind::Pressed,
            other => return Err(Discard::UnrecognizedEventValue(other)),
        };

        Ok(KeyTransition {
            code: self.code,
            kind,
        })
    }
}

/// Decode one raw record, reporting why it was dropped if it was.
pub fn try_decode(raw: &[u8]) -> Result<KeyTransition, Discard> {
    RawEvent::parse(raw)?.transition()
}

/// Decode one raw record into a key edge, or nothing.
pub fn decode(raw: &[u8]) -> Option<KeyTransition> {
    try_decode(raw).ok()
}
