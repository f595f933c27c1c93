//! # Manual cancel signal
//!
//! The operator can abort the mission at any point during Seek or Pursue by
//! pressing `q`. The signal is sampled cooperatively, once per tick at the
//! top of the phase body, and always forces a controlled landing path, it is
//! never treated as an error.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crossterm::event::{self, Event, KeyCode};
use log::warn;
use std::time::Duration;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of operator cancel requests.
pub trait CancelSource {
    /// True if a cancel has been requested since the last check.
    fn cancel_requested(&mut self) -> bool;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

impl<T: CancelSource + ?Sized> CancelSource for Box<T> {
    fn cancel_requested(&mut self) -> bool {
        (**self).cancel_requested()
    }
}

/// Cancel source backed by the terminal keyboard.
pub struct KeyboardCancel;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CancelSource for KeyboardCancel {
    fn cancel_requested(&mut self) -> bool {
        // Non-blocking check, a zero timeout returns immediately when no
        // event is pending
        match event::poll(Duration::from_secs(0)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => key.code == KeyCode::Char('q'),
                Ok(_) => false,
                Err(e) => {
                    warn!("Could not read terminal event: {}", e);
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                warn!("Could not poll terminal events: {}", e);
                false
            }
        }
    }
}
