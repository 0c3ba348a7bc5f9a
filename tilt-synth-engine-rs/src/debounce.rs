//! Debounced input bridge for the three front-panel buttons.
//!
//! Each button runs its own [`Debouncer`]:
//!
//! ```text
//! Idle ──edge──▶ Candidate ──asserted at every re-check──▶ Confirmed
//!                    │
//!                    └──released at any re-check──▶ Idle (no event)
//! ```
//!
//! Confirmation is deferred to a low-priority task ([`run_button`]) that
//! sleeps between re-checks, so the synthesis tick is never delayed by
//! contact bounce. Buttons are active-low with pull-ups.

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;

use crate::config::DebounceConfig;
use crate::events::{Event, PendingEvents};

/// A physical front-panel button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    OctaveUp,
    OctaveDown,
    WaveformCycle,
}

impl Button {
    /// The pending-event flag raised by a confirmed press.
    pub fn event(self) -> Event {
        match self {
            Button::OctaveUp => Event::OctaveUpPressed,
            Button::OctaveDown => Event::OctaveDownPressed,
            Button::WaveformCycle => Event::WaveformCyclePressed,
        }
    }
}

/// Debounce state of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceState {
    Idle,
    /// Edge seen; `passed` re-checks found the line still asserted.
    Candidate { passed: u8 },
    Confirmed,
}

/// Result of feeding one re-check into a [`Debouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceOutcome {
    /// More re-checks are required.
    Pending,
    /// The press is stable; report it once.
    Confirmed,
    /// The line released early; the edge was bounce.
    Rejected,
    /// No candidate was in progress.
    Ignored,
}

/// Per-button debounce state machine.
#[derive(Debug, Clone)]
pub struct Debouncer {
    state: DebounceState,
    rechecks: u8,
}

impl Debouncer {
    /// Create an idle debouncer requiring `rechecks` stable samples
    /// (at least one).
    pub const fn new(rechecks: u8) -> Self {
        Self {
            state: DebounceState::Idle,
            rechecks: if rechecks == 0 { 1 } else { rechecks },
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Register a raw falling edge.
    ///
    /// Starts a new candidate and returns `true`, unless a candidate is
    /// already in progress (bounce inside one debounce cycle), in which case
    /// the edge is absorbed and `false` is returned.
    pub fn on_edge(&mut self) -> bool {
        match self.state {
            DebounceState::Candidate { .. } => false,
            DebounceState::Idle | DebounceState::Confirmed => {
                self.state = DebounceState::Candidate { passed: 0 };
                true
            }
        }
    }

    /// Feed one re-check of the line. `asserted` is `true` while pressed.
    pub fn on_recheck(&mut self, asserted: bool) -> DebounceOutcome {
        let DebounceState::Candidate { passed } = self.state else {
            return DebounceOutcome::Ignored;
        };

        if !asserted {
            self.state = DebounceState::Idle;
            return DebounceOutcome::Rejected;
        }

        let passed = passed + 1;
        if passed >= self.rechecks {
            self.state = DebounceState::Confirmed;
            DebounceOutcome::Confirmed
        } else {
            self.state = DebounceState::Candidate { passed };
            DebounceOutcome::Pending
        }
    }
}

/// Run the re-check sequence for one edge.
///
/// Returns `Ok(true)` exactly when the edge was confirmed as a press.
/// A line read error abandons the candidate.
pub async fn confirm_press<P, D>(
    line: &mut P,
    delay: &mut D,
    debouncer: &mut Debouncer,
    recheck_delay_us: u32,
) -> Result<bool, P::Error>
where
    P: InputPin,
    D: DelayNs,
{
    if !debouncer.on_edge() {
        return Ok(false);
    }

    loop {
        delay.delay_us(recheck_delay_us).await;

        let asserted = match line.is_low() {
            Ok(level) => level,
            Err(e) => {
                debouncer.on_recheck(false);
                return Err(e);
            }
        };

        match debouncer.on_recheck(asserted) {
            DebounceOutcome::Pending => continue,
            DebounceOutcome::Confirmed => return Ok(true),
            DebounceOutcome::Rejected | DebounceOutcome::Ignored => return Ok(false),
        }
    }
}

/// Button monitor loop.
///
/// This is a regular `async fn`; wrap it in a concrete task in the
/// firmware. Waits for a falling edge, confirms it, and raises the button's
/// event flag. A flag that is still pending is not raised again, so bounce
/// never queues a duplicate press. Waiting for the next edge only starts
/// after confirmation, which discards edges latched during the re-checks.
pub async fn run_button<P, D>(
    mut line: P,
    mut delay: D,
    button: Button,
    events: &PendingEvents,
    config: DebounceConfig,
) -> !
where
    P: InputPin + Wait,
    D: DelayNs,
{
    let mut debouncer = Debouncer::new(config.rechecks);

    loop {
        if line.wait_for_falling_edge().await.is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("{}: edge wait failed", button);
            delay.delay_us(config.recheck_delay_us).await;
            continue;
        }

        match confirm_press(&mut line, &mut delay, &mut debouncer, config.recheck_delay_us).await {
            Ok(true) => {
                let _raised = events.raise(button.event());
                #[cfg(feature = "defmt")]
                defmt::debug!("{} pressed (queued: {})", button, _raised);
            }
            Ok(false) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("{} bounce rejected", button);
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: line read failed", button);
            }
        }
    }
}
