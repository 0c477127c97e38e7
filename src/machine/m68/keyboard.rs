//! Key-event state machine.
//!
//! Translates transport events into column writes. The matrix path can
//! report at most one pressed row per column, and the upstream converter
//! only ever tracks the most recent non-modifier key, so the state here is
//! deliberately small: the active key position, if any, and two latch flags
//! for the emulated SHIFT and CTRL keys.
//!
//! The M68 matrix has no dedicated modifier lines. SHIFT and CTRL are
//! emulated by holding their own matrix positions pressed for as long as
//! the transported modifier byte says the real key is down. The latch is
//! only re-evaluated on key events: a modifier release with no following
//! key event becomes visible when the upstream re-sends the key with a
//! zero modifier byte, or sends release-all.

use std::sync::Arc;

use tracing::trace;

use super::framing::KeyEvent;
use super::keymap::{self, CTRL_POSITION, KeyPosition, SHIFT_POSITION};
use super::matrix::{IDLE, Matrix, row_mask};

// Modifier byte patterns the upstream sends, matched whole: left/right
// shift, left/right ctrl.
const MOD_LEFT_CTRL: u8 = 0x01;
const MOD_LEFT_SHIFT: u8 = 0x02;
const MOD_RIGHT_CTRL: u8 = 0x10;
const MOD_RIGHT_SHIFT: u8 = 0x20;

pub struct Keyboard {
    matrix: Arc<Matrix>,
    active: Option<KeyPosition>,
    shift_latched: bool,
    ctrl_latched: bool,
}

impl Keyboard {
    pub fn new(matrix: Arc<Matrix>) -> Self {
        Self {
            matrix,
            active: None,
            shift_latched: false,
            ctrl_latched: false,
        }
    }

    /// Apply one transport event to the matrix.
    pub fn apply(&mut self, event: KeyEvent) {
        if event.keycode == 0 {
            // Release-all. Nothing to restore if nothing was pressed.
            if let Some(pos) = self.active.take() {
                trace!("KBD: release col={}", pos.column);
                self.matrix.write(pos.column, IDLE);
            }
            return;
        }

        let Some(pos) = keymap::resolve(event.keycode as u16) else {
            trace!("KBD: no matrix position for keycode {:#04X}", event.keycode);
            return;
        };

        // Replacing a key in another column leaves the old column stale
        // unless it is restored first.
        if let Some(prev) = self.active {
            if prev.column != pos.column {
                self.matrix.write(prev.column, IDLE);
            }
        }

        let bits = row_mask(pos.row);
        trace!(
            "KBD: press col={} row={} bits={:#010b}",
            pos.column, pos.row, bits
        );
        self.matrix.write(pos.column, bits);
        self.active = Some(pos);

        self.apply_modifiers(event.modifiers);
    }

    fn apply_modifiers(&mut self, modifiers: u8) {
        if modifiers == MOD_LEFT_SHIFT || modifiers == MOD_RIGHT_SHIFT {
            self.matrix
                .write(SHIFT_POSITION.column, row_mask(SHIFT_POSITION.row));
            self.shift_latched = true;
        }
        if modifiers == MOD_LEFT_CTRL || modifiers == MOD_RIGHT_CTRL {
            self.matrix
                .write(CTRL_POSITION.column, row_mask(CTRL_POSITION.row));
            self.ctrl_latched = true;
        }
        if modifiers == 0 && (self.shift_latched || self.ctrl_latched) {
            trace!("KBD: modifiers released");
            self.matrix.write(SHIFT_POSITION.column, IDLE);
            self.matrix.write(CTRL_POSITION.column, IDLE);
            self.shift_latched = false;
            self.ctrl_latched = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::m68::matrix::MatrixReader;
    use rstest::rstest;

    fn keyboard() -> (Keyboard, MatrixReader) {
        let matrix = Matrix::new();
        let reader = MatrixReader::new(matrix.clone());
        (Keyboard::new(matrix), reader)
    }

    fn press(keyboard: &mut Keyboard, keycode: u8, modifiers: u8) {
        keyboard.apply(KeyEvent { keycode, modifiers });
    }

    fn assert_idle_except(reader: &MatrixReader, pressed: &[(u8, u8)]) {
        for column in 0..15 {
            let expected = pressed
                .iter()
                .find(|&&(c, _)| c == column)
                .map(|&(_, bits)| bits)
                .unwrap_or(IDLE);
            assert_eq!(reader.column(column), expected, "column {column}");
        }
    }

    #[test]
    fn press_clears_exactly_one_row_bit() {
        let (mut kbd, reader) = keyboard();
        // 'z' sits at column 2, row C.
        press(&mut kbd, 0x1D, 0x00);
        assert_idle_except(&reader, &[(1, 0b1111_1011)]);
    }

    #[test]
    fn release_all_restores_the_active_column() {
        let (mut kbd, reader) = keyboard();
        press(&mut kbd, 0x1D, 0x00);
        press(&mut kbd, 0x00, 0x00);
        assert_idle_except(&reader, &[]);
    }

    #[test]
    fn release_all_with_nothing_active_is_a_no_op() {
        let (mut kbd, reader) = keyboard();
        press(&mut kbd, 0x00, 0x00);
        press(&mut kbd, 0x00, 0x00);
        assert_idle_except(&reader, &[]);
    }

    #[test]
    fn unknown_keycode_changes_nothing() {
        let (mut kbd, reader) = keyboard();
        // CapsLock has no M68 position.
        press(&mut kbd, 0x39, 0x00);
        assert_idle_except(&reader, &[]);
        // ...including while another key is held.
        press(&mut kbd, 0x1D, 0x00);
        press(&mut kbd, 0x39, 0x00);
        assert_idle_except(&reader, &[(1, 0b1111_1011)]);
    }

    #[test]
    fn replacing_a_key_across_columns_restores_the_old_column() {
        let (mut kbd, reader) = keyboard();
        // 'z' in column 2, then 'w' in column 3.
        press(&mut kbd, 0x1D, 0x00);
        press(&mut kbd, 0x1A, 0x00);
        assert_idle_except(&reader, &[(2, 0b1110_1111)]);
    }

    #[test]
    fn replacing_a_key_within_a_column_keeps_one_row() {
        let (mut kbd, reader) = keyboard();
        // 'z' (row C) then 'a' (row D), both column 2.
        press(&mut kbd, 0x1D, 0x00);
        assert_eq!(reader.column(1), 0b1111_1011);
        press(&mut kbd, 0x04, 0x00);
        assert_idle_except(&reader, &[(1, 0b1111_0111)]);
        press(&mut kbd, 0x00, 0x00);
        assert_idle_except(&reader, &[]);
    }

    #[rstest]
    #[case(MOD_LEFT_SHIFT)]
    #[case(MOD_RIGHT_SHIFT)]
    fn shift_modifier_presses_the_shift_position(#[case] modifiers: u8) {
        let (mut kbd, reader) = keyboard();
        // 'w' carries shift; both the key column and the shift column react.
        press(&mut kbd, 0x1A, modifiers);
        assert_idle_except(&reader, &[(2, 0b1110_1111), (1, 0b0111_1111)]);
    }

    #[rstest]
    #[case(MOD_LEFT_CTRL)]
    #[case(MOD_RIGHT_CTRL)]
    fn ctrl_modifier_presses_the_ctrl_position(#[case] modifiers: u8) {
        let (mut kbd, reader) = keyboard();
        press(&mut kbd, 0x1A, modifiers);
        assert_idle_except(&reader, &[(2, 0b1110_1111), (0, 0b0111_1111)]);
    }

    #[test]
    fn zero_modifier_byte_clears_latched_modifiers() {
        let (mut kbd, reader) = keyboard();
        press(&mut kbd, 0x1A, MOD_LEFT_SHIFT);
        press(&mut kbd, 0x1A, 0x00);
        assert_idle_except(&reader, &[(2, 0b1110_1111)]);
    }

    #[test]
    fn zero_modifier_byte_without_a_latch_leaves_modifier_columns_alone() {
        let (mut kbd, reader) = keyboard();
        press(&mut kbd, 0x1A, 0x00);
        assert_idle_except(&reader, &[(2, 0b1110_1111)]);
    }

    #[test]
    fn combined_modifier_bytes_latch_nothing() {
        let (mut kbd, reader) = keyboard();
        // Shift+ctrl held together arrives as 0x03, which matches neither
        // recognized pattern.
        press(&mut kbd, 0x1A, 0x03);
        assert_idle_except(&reader, &[(2, 0b1110_1111)]);
    }

    #[test]
    fn shift_latch_survives_key_replacement() {
        let (mut kbd, reader) = keyboard();
        press(&mut kbd, 0x1A, MOD_LEFT_SHIFT);
        // Next key still shifted.
        press(&mut kbd, 0x08, MOD_LEFT_SHIFT);
        assert_idle_except(&reader, &[(3, 0b1110_1111), (1, 0b0111_1111)]);
        // Shift released along with a fresh key press.
        press(&mut kbd, 0x08, 0x00);
        assert_idle_except(&reader, &[(3, 0b1110_1111)]);
    }

    #[test]
    fn press_press_release_sequence() {
        let (mut kbd, reader) = keyboard();
        press(&mut kbd, 0x1D, 0x00);
        assert_eq!(reader.column(1), 0b1111_1011);
        press(&mut kbd, 0x04, 0x00);
        assert_eq!(reader.column(1), 0b1111_0111);
        press(&mut kbd, 0x00, 0x00);
        assert_eq!(reader.column(1), 0b1111_1111);
    }
}
