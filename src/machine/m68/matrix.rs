//! Column state shared between the event applier and the strobe reader.
//!
//! The store is one byte per column, bit `n` low = row `n` pressed, idle
//! byte `0xFF`. The keyboard state machine is the only writer and the strobe
//! side is the only reader; each access is a single relaxed atomic load or
//! store, so neither side can ever block the other. A key-press that also
//! latches a modifier touches two columns with two separate stores — a read
//! landing between them can briefly see the key without its modifier, which
//! matches the real converter and is absorbed by the host's debounce.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use super::keymap::COLUMNS;

/// The at-rest pattern of a column with nothing pressed.
pub const IDLE: u8 = 0xFF;

/// Row bitmask with exactly one row pulled low.
pub fn row_mask(row: u8) -> u8 {
    if row > 7 {
        return IDLE;
    }
    IDLE & !(1 << row)
}

pub struct Matrix {
    columns: [AtomicU8; COLUMNS],
}

impl Matrix {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            columns: [const { AtomicU8::new(IDLE) }; COLUMNS],
        })
    }

    pub(crate) fn write(&self, column: u8, bits: u8) {
        self.columns[column as usize].store(bits, Ordering::Relaxed);
    }

    fn read(&self, column: u8) -> u8 {
        if (column as usize) < COLUMNS {
            self.columns[column as usize].load(Ordering::Relaxed)
        } else {
            // Column 16 of the protocol is unimplemented; anything out of
            // range reads as unpressed.
            IDLE
        }
    }
}

/// Read handle for the strobe context. `column` is a single atomic load with
/// no locking or allocation, safe at any call rate.
#[derive(Clone)]
pub struct MatrixReader(Arc<Matrix>);

impl MatrixReader {
    pub fn new(matrix: Arc<Matrix>) -> Self {
        Self(matrix)
    }

    pub fn column(&self, column: u8) -> u8 {
        self.0.read(column)
    }
}
