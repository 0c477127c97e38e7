//! # SORD M68 keyboard matrix layout.
//!
//! The M68 keyboard is a parallel-scanned 15×8 matrix: the host selects one
//! of 15 columns at a time and reads 8 active-low row lines (A..H on the
//! 74LS166 that serializes them). The 16th column of the electrical protocol
//! was never populated and is not scanned.
//!
//! Keys are identified by the USB HID usage codes the upstream converter
//! transmits, so this table is the single source of truth for translating a
//! transported key code back into the (column, row) the M68 expects.

pub const COLUMNS: usize = 15;
pub const ROWS: usize = 8;

/// Empty matrix cell. Deliberately outside the 8-bit code space the
/// transport can carry, so no real key code can alias it.
pub const KEY_NONE: u16 = 0xFFFF;

/// USB HID usage codes (keyboard/keypad page) for every key placed in the
/// matrix.
pub mod keys {
    // Letters
    pub const KEY_A: u16 = 0x04;
    pub const KEY_B: u16 = 0x05;
    pub const KEY_C: u16 = 0x06;
    pub const KEY_D: u16 = 0x07;
    pub const KEY_E: u16 = 0x08;
    pub const KEY_F: u16 = 0x09;
    pub const KEY_G: u16 = 0x0A;
    pub const KEY_H: u16 = 0x0B;
    pub const KEY_I: u16 = 0x0C;
    pub const KEY_J: u16 = 0x0D;
    pub const KEY_K: u16 = 0x0E;
    pub const KEY_L: u16 = 0x0F;
    pub const KEY_M: u16 = 0x10;
    pub const KEY_N: u16 = 0x11;
    pub const KEY_O: u16 = 0x12;
    pub const KEY_P: u16 = 0x13;
    pub const KEY_Q: u16 = 0x14;
    pub const KEY_R: u16 = 0x15;
    pub const KEY_S: u16 = 0x16;
    pub const KEY_T: u16 = 0x17;
    pub const KEY_U: u16 = 0x18;
    pub const KEY_V: u16 = 0x19;
    pub const KEY_W: u16 = 0x1A;
    pub const KEY_X: u16 = 0x1B;
    pub const KEY_Y: u16 = 0x1C;
    pub const KEY_Z: u16 = 0x1D;

    // Digit row
    pub const KEY_1: u16 = 0x1E;
    pub const KEY_2: u16 = 0x1F;
    pub const KEY_3: u16 = 0x20;
    pub const KEY_4: u16 = 0x21;
    pub const KEY_5: u16 = 0x22;
    pub const KEY_6: u16 = 0x23;
    pub const KEY_7: u16 = 0x24;
    pub const KEY_8: u16 = 0x25;
    pub const KEY_9: u16 = 0x26;
    pub const KEY_0: u16 = 0x27;

    pub const KEY_RETURN: u16 = 0x28;
    pub const KEY_ESC: u16 = 0x29;
    pub const KEY_BACKSPACE: u16 = 0x2A;
    pub const KEY_TAB: u16 = 0x2B;
    pub const KEY_SPACE: u16 = 0x2C;

    // JIS punctuation
    pub const KEY_MINUS: u16 = 0x2D;
    pub const KEY_CARET: u16 = 0x2E;
    pub const KEY_ATMARK: u16 = 0x2F;
    pub const KEY_LEFT_BRACE: u16 = 0x30;
    pub const KEY_RIGHT_BRACE: u16 = 0x32;
    pub const KEY_SEMICOLON: u16 = 0x33;
    pub const KEY_COLON: u16 = 0x34;
    pub const KEY_KANA: u16 = 0x35;
    pub const KEY_COMMA: u16 = 0x36;
    pub const KEY_PERIOD: u16 = 0x37;
    pub const KEY_SLASH: u16 = 0x38;
    pub const KEY_BACKSLASH: u16 = 0x87;

    // Function row
    pub const KEY_F1: u16 = 0x3A;
    pub const KEY_F2: u16 = 0x3B;
    pub const KEY_F3: u16 = 0x3C;
    pub const KEY_F4: u16 = 0x3D;
    pub const KEY_F5: u16 = 0x3E;
    pub const KEY_F6: u16 = 0x3F;
    pub const KEY_F7: u16 = 0x40;

    // M68-specific keys, mapped from the nearest modern equivalents:
    // S1 = PrintScreen, S2 = ScrollLock, RESET = Pause, LF = Home,
    // SMALL = End.
    pub const KEY_S1: u16 = 0x46;
    pub const KEY_S2: u16 = 0x47;
    pub const KEY_RESET: u16 = 0x48;
    pub const KEY_LF: u16 = 0x4A;
    pub const KEY_SMALL: u16 = 0x4D;

    // Arrows
    pub const KEY_RIGHT: u16 = 0x4F;
    pub const KEY_LEFT: u16 = 0x50;
    pub const KEY_DOWN: u16 = 0x51;
    pub const KEY_UP: u16 = 0x52;

    // Numeric pad
    pub const KEY_NUM0: u16 = 0x62;
    pub const KEY_NUM1: u16 = 0x59;
    pub const KEY_NUM3: u16 = 0x5B;
    pub const KEY_NUM4: u16 = 0x5C;
    pub const KEY_NUM5: u16 = 0x5D;
    pub const KEY_NUM6: u16 = 0x5E;
    pub const KEY_NUM7: u16 = 0x5F;
    pub const KEY_NUM8: u16 = 0x60;
    pub const KEY_NUM9: u16 = 0x61;
    pub const KEY_NUM_DOT: u16 = 0x63;
    pub const KEY_NUM_ASTERISK: u16 = 0x55;
    /// Numpad `=`. The M68 scan code set is not fully documented; 0xFF is
    /// the code the upstream converter has always used for this key.
    pub const KEY_NUM_EQUALS: u16 = 0xFF;

    // Modifiers (these also occupy physical matrix positions)
    pub const KEY_LEFT_CTRL: u16 = 0xE0;
    pub const KEY_LEFT_SHIFT: u16 = 0xE1;
}

use keys::*;

/// The matrix grid, one 8-entry array of rows A..H per column. Two keys keep
/// the duplicate placements of the real keyboard wiring: LEFT SHIFT (columns
/// 1 and 2) and BACKSLASH (columns 13 and 14); [resolve] returns the first
/// placement in column order.
#[rustfmt::skip]
pub const KEY_CODE_MAP: [[u16; ROWS]; COLUMNS] = [
    // A,                B,         C,              D,                   E,               F,              G,        H
    [ KEY_NONE,          KEY_NONE,  KEY_LEFT_SHIFT, KEY_NONE,            KEY_TAB,         KEY_ESC,        KEY_NONE, KEY_LEFT_CTRL  ], // Col 01
    [ KEY_NONE,          KEY_NONE,  KEY_Z,          KEY_A,               KEY_Q,           KEY_1,          KEY_NONE, KEY_LEFT_SHIFT ], // Col 02
    [ KEY_DOWN,          KEY_LEFT,  KEY_X,          KEY_S,               KEY_W,           KEY_2,          KEY_NONE, KEY_SMALL      ], // Col 03
    [ KEY_UP,            KEY_RIGHT, KEY_C,          KEY_D,               KEY_E,           KEY_3,          KEY_NONE, KEY_RESET      ], // Col 04
    [ KEY_NONE,          KEY_NONE,  KEY_V,          KEY_F,               KEY_R,           KEY_4,          KEY_NONE, KEY_S1         ], // Col 05
    [ KEY_NUM_ASTERISK,  KEY_NONE,  KEY_B,          KEY_G,               KEY_T,           KEY_5,          KEY_NONE, KEY_S2         ], // Col 06
    [ KEY_NONE,          KEY_NUM7,  KEY_SPACE,      KEY_H,               KEY_Y,           KEY_6,          KEY_NONE, KEY_NONE       ], // Col 07
    [ KEY_NUM9,          KEY_NUM8,  KEY_N,          KEY_J,               KEY_U,           KEY_7,          KEY_NONE, KEY_NONE       ], // Col 08
    [ KEY_NUM_EQUALS,    KEY_NUM4,  KEY_M,          KEY_K,               KEY_I,           KEY_8,          KEY_F1,   KEY_NONE       ], // Col 09
    [ KEY_NUM6,          KEY_NUM5,  KEY_COMMA,      KEY_L,               KEY_O,           KEY_9,          KEY_F2,   KEY_NONE       ], // Col 10
    [ KEY_NUM3,          KEY_NUM1,  KEY_PERIOD,     KEY_SEMICOLON,       KEY_P,           KEY_0,          KEY_F3,   KEY_NONE       ], // Col 11
    [ KEY_NUM_DOT,       KEY_NUM0,  KEY_SLASH,      KEY_COLON,           KEY_ATMARK,      KEY_MINUS,      KEY_F4,   KEY_KANA       ], // Col 12
    [ KEY_NONE,          KEY_NONE,  KEY_BACKSLASH,  KEY_RIGHT_BRACE,     KEY_LEFT_BRACE,  KEY_CARET,      KEY_F5,   KEY_NONE       ], // Col 13
    [ KEY_NONE,          KEY_NONE,  KEY_NONE,       KEY_NONE,            KEY_NONE,        KEY_BACKSLASH,  KEY_F6,   KEY_NONE       ], // Col 14
    [ KEY_NONE,          KEY_NONE,  KEY_NONE,       KEY_LF,              KEY_RETURN,      KEY_BACKSPACE,  KEY_F7,   KEY_NONE       ], // Col 15
];

/// A key's place in the matrix: the column the host must select and the row
/// line the key pulls low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPosition {
    pub column: u8,
    pub row: u8,
}

/// Where the SHIFT key sits in the matrix (column 2, row H).
pub const SHIFT_POSITION: KeyPosition = KeyPosition { column: 1, row: 7 };

/// Where the CTRL key sits in the matrix (column 1, row H).
pub const CTRL_POSITION: KeyPosition = KeyPosition { column: 0, row: 7 };

/// Look up the matrix position of a key code. Lookups happen at event rate,
/// not scan rate, so a linear pass over the 120 cells is plenty.
pub fn resolve(keycode: u16) -> Option<KeyPosition> {
    if keycode == KEY_NONE {
        return None;
    }
    for (column, rows) in KEY_CODE_MAP.iter().enumerate() {
        for (row, &code) in rows.iter().enumerate() {
            if code == keycode {
                return Some(KeyPosition {
                    column: column as u8,
                    row: row as u8,
                });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(KEY_Z, 1, 2)]
    #[case(KEY_A, 1, 3)]
    #[case(KEY_Q, 1, 4)]
    #[case(KEY_SPACE, 6, 2)]
    #[case(KEY_RETURN, 14, 4)]
    #[case(KEY_BACKSPACE, 14, 5)]
    #[case(KEY_F1, 8, 6)]
    #[case(KEY_F7, 14, 6)]
    #[case(KEY_NUM_EQUALS, 8, 0)]
    #[case(KEY_KANA, 11, 7)]
    fn resolves_to_placement(#[case] code: u16, #[case] column: u8, #[case] row: u8) {
        assert_eq!(resolve(code), Some(KeyPosition { column, row }));
    }

    #[test]
    fn empty_cell_code_never_resolves() {
        assert_eq!(resolve(KEY_NONE), None);
    }

    #[test]
    fn unplaced_codes_do_not_resolve() {
        // CapsLock and F8 exist in the USB usage table but not in the M68
        // matrix.
        assert_eq!(resolve(0x39), None);
        assert_eq!(resolve(0x41), None);
        assert_eq!(resolve(0x00), None);
    }

    #[test]
    fn duplicate_placements_resolve_to_first_column() {
        // LEFT SHIFT is wired into both column 1 and column 2.
        assert_eq!(
            resolve(KEY_LEFT_SHIFT),
            Some(KeyPosition { column: 0, row: 2 })
        );
        // BACKSLASH appears in columns 13 and 14.
        assert_eq!(
            resolve(KEY_BACKSLASH),
            Some(KeyPosition { column: 12, row: 2 })
        );
    }

    #[test]
    fn every_placed_code_round_trips_unless_shadowed() {
        for (column, rows) in KEY_CODE_MAP.iter().enumerate() {
            for (row, &code) in rows.iter().enumerate() {
                if code == KEY_NONE {
                    continue;
                }
                let pos = resolve(code).unwrap();
                // A later duplicate resolves to its first placement; every
                // first placement must round-trip exactly.
                if (pos.column as usize, pos.row as usize) != (column, row) {
                    assert!(
                        (pos.column as usize) < column,
                        "{code:#04X} resolved forward of its placement"
                    );
                }
            }
        }
    }

    #[test]
    fn modifier_emulation_positions_match_the_grid() {
        assert_eq!(
            KEY_CODE_MAP[SHIFT_POSITION.column as usize][SHIFT_POSITION.row as usize],
            KEY_LEFT_SHIFT
        );
        assert_eq!(
            KEY_CODE_MAP[CTRL_POSITION.column as usize][CTRL_POSITION.row as usize],
            KEY_LEFT_CTRL
        );
    }
}
