//! Framing for the upstream key-event transport.
//!
//! The USB side sends one event per line, `0xHH:0xHH` (key code, then
//! modifier byte), terminated by CR or LF. The stream is best-effort:
//! malformed or incomplete lines are dropped without comment and an
//! over-long line just resets the buffer, so a glitched byte can never
//! wedge the parser.

use tracing::trace;

/// One decoded transport event. A key code of zero is the distinguished
/// "all keys released" event, not a real key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub keycode: u8,
    pub modifiers: u8,
}

const FRAME_BUF_LEN: usize = 16;

/// Accumulates transport bytes and emits a [KeyEvent] for each complete,
/// well-formed line.
pub struct FrameParser {
    buf: [u8; FRAME_BUF_LEN],
    len: usize,
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            buf: [0; FRAME_BUF_LEN],
            len: 0,
        }
    }

    /// Feed one byte. Returns a decoded event when the byte completes a
    /// valid line.
    pub fn push(&mut self, byte: u8) -> Option<KeyEvent> {
        if byte == b'\n' || byte == b'\r' {
            let line = &self.buf[..self.len];
            let event = parse_frame(line);
            if event.is_none() && !line.is_empty() {
                trace!("discarding malformed frame {:?}", String::from_utf8_lossy(line));
            }
            self.len = 0;
            return event;
        }
        if self.len < FRAME_BUF_LEN {
            self.buf[self.len] = byte;
            self.len += 1;
        } else {
            // Overflow: throw the line away and start over.
            self.len = 0;
        }
        None
    }
}

fn parse_frame(line: &[u8]) -> Option<KeyEvent> {
    let line = std::str::from_utf8(line).ok()?;
    let (keycode, modifiers) = line.split_once(':')?;
    Some(KeyEvent {
        keycode: parse_hex_byte(keycode)?,
        modifiers: parse_hex_byte(modifiers)?,
    })
}

fn parse_hex_byte(s: &str) -> Option<u8> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}
