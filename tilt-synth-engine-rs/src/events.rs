//! Pending-event flags bridging interrupt producers and the control loop.
//!
//! Each [`Event`] is an independent boolean. Producers call
//! [`PendingEvents::raise`]; the control loop calls [`PendingEvents::take`],
//! which reads and clears in one atomic step so every raise is consumed at
//! most once. Several raises between two takes coalesce into one.

use core::sync::atomic::{AtomicBool, Ordering};

/// Number of distinct event flags.
pub const EVENT_COUNT: usize = 5;

/// Identifies one pending-event flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Event {
    OctaveUpPressed = 0,
    OctaveDownPressed = 1,
    WaveformCyclePressed = 2,
    SensorSampleReady = 3,
    DisplayDirty = 4,
}

impl Event {
    /// All events, in drain order.
    pub const ALL: [Event; EVENT_COUNT] = [
        Event::OctaveUpPressed,
        Event::OctaveDownPressed,
        Event::WaveformCyclePressed,
        Event::SensorSampleReady,
        Event::DisplayDirty,
    ];
}

/// Set of independent event flags, suitable for a `static`.
pub struct PendingEvents {
    flags: [AtomicBool; EVENT_COUNT],
}

impl Default for PendingEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingEvents {
    /// All flags clear.
    pub const fn new() -> Self {
        Self {
            flags: [const { AtomicBool::new(false) }; EVENT_COUNT],
        }
    }

    fn flag(&self, event: Event) -> &AtomicBool {
        &self.flags[event as usize]
    }

    /// Raise `event` unless it is already pending.
    ///
    /// Returns `true` if this call raised the flag, `false` if it was
    /// already set (the occurrence coalesces with the pending one).
    pub fn raise(&self, event: Event) -> bool {
        self.flag(event)
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clear `event` and report whether it was pending.
    pub fn take(&self, event: Event) -> bool {
        self.flag(event).swap(false, Ordering::AcqRel)
    }

    /// Check `event` without consuming it.
    pub fn is_pending(&self, event: Event) -> bool {
        self.flag(event).load(Ordering::Acquire)
    }
}
