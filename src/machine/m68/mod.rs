//! # SORD M68 keyboard emulation.
//!
//! The M68 expects a parallel-scanned keyboard: it strobes one of 15
//! columns at a time (15.5 µs period on the real machine) and latches the
//! 8 active-low row lines of whichever column is selected. This module
//! rebuilds that electrical picture from a stream of modern key events:
//! bytes arrive over the transport channel, complete lines decode into
//! `(keycode, modifier)` events, and each event updates the shared column
//! matrix that the strobe side reads.

pub mod framing;
pub mod keyboard;
pub mod keymap;
pub mod matrix;

use std::io;
use std::sync::Arc;
use std::sync::mpsc;

use tracing::{info, trace};

use crate::host::comm::{self, CommConfig};

use self::framing::FrameParser;
use self::keyboard::Keyboard;
use self::matrix::{Matrix, MatrixReader};

pub(crate) struct System {
    rx: mpsc::Receiver<u8>,
    parser: FrameParser,
    keyboard: Keyboard,
    matrix: Arc<Matrix>,
    events: u64,
}

impl System {
    pub(crate) fn new(input: CommConfig) -> io::Result<Self> {
        let (tx, rx) = mpsc::sync_channel(256);
        comm::connect_input(tx, input)?;
        info!("matrix initialized, all columns idle");
        Ok(Self::from_channel(rx))
    }

    fn from_channel(rx: mpsc::Receiver<u8>) -> Self {
        let matrix = Matrix::new();
        Self {
            rx,
            parser: FrameParser::new(),
            keyboard: Keyboard::new(matrix.clone()),
            matrix,
            events: 0,
        }
    }

    /// A read handle for the strobe side.
    pub(crate) fn reader(&self) -> MatrixReader {
        MatrixReader::new(self.matrix.clone())
    }

    /// Drain pending transport bytes and apply every completed event.
    /// Returns `false` once the transport has disconnected and nothing
    /// buffered remains.
    pub(crate) fn tick(&mut self) -> bool {
        loop {
            match self.rx.try_recv() {
                Ok(byte) => {
                    if let Some(event) = self.parser.push(byte) {
                        trace!(
                            "event {:#04X}:{:#04X}",
                            event.keycode, event.modifiers
                        );
                        self.events += 1;
                        self.keyboard.apply(event);
                    }
                }
                Err(mpsc::TryRecvError::Empty) => return true,
                Err(mpsc::TryRecvError::Disconnected) => return false,
            }
        }
    }

    pub(crate) fn events_applied(&self) -> u64 {
        self.events
    }
}
