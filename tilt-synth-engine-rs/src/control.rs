//! Foreground control loop and its collaborator interfaces.
//!
//! [`ControlLoop::step`] runs one cooperative iteration:
//!
//! 1. **Sensor**: release the sensor's motion latch; if
//!    [`Event::SensorSampleReady`] is pending and the sensor's status agrees,
//!    read the tilt, update the note index and mark the display dirty. A
//!    pending flag without status agreement stays pending.
//! 2. **Buttons**: drain each button flag once and apply the octave or
//!    waveform change.
//! 3. **Slider**: a nonzero reading becomes the new volume; zero means
//!    "not touched" and keeps the held volume.
//! 4. **Display**: redraw the fields whose text changed, if the display is
//!    dirty or the volume moved.
//!
//! Collaborator faults are counted in [`LoopStats`] and returned, but never
//! abort the rest of the iteration. Pacing between iterations is up to the
//! caller.

use crate::error::ControlError;
use crate::events::{Event, PendingEvents};
use crate::screen::{Field, Screen};
use crate::state::{SynthState, MAX_VOLUME};
use crate::tilt::note_index_from_tilt;

/// Tilt sensor as seen by the control loop.
#[allow(async_fn_in_trait)]
pub trait TiltSensor {
    type Error;

    /// `true` when the sensor reports a fresh sample.
    async fn sample_ready(&mut self) -> Result<bool, Self::Error>;

    /// Read the signed tilt axis sample.
    async fn read_tilt(&mut self) -> Result<i16, Self::Error>;

    /// Release the sensor's interrupt latch.
    async fn acknowledge(&mut self) -> Result<(), Self::Error>;
}

/// Fixed-size character display.
#[allow(async_fn_in_trait)]
pub trait CharDisplay {
    type Error;

    /// Move the cursor to `(col, row)`.
    async fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error>;

    /// Write `text` at the cursor, advancing it.
    async fn print(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Make printed text visible. Displays that show text immediately keep
    /// the default no-op.
    async fn refresh(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Touch slider.
#[allow(async_fn_in_trait)]
pub trait Slider {
    type Error;

    /// Position in `0..=100`; `0` means not touched.
    async fn read_value(&mut self) -> Result<u8, Self::Error>;
}

/// Map a raw position reading onto the slider's `0..=100` scale.
///
/// Readings at or below `dead_band` report `0` (not touched). The rest of
/// `dead_band..=full_scale` maps onto `1..=100`, rounding up so the first
/// count past the dead band already reads as touched.
pub fn slider_percent(raw: u16, full_scale: u16, dead_band: u16) -> u8 {
    if raw <= dead_band {
        return 0;
    }
    let span = u32::from(full_scale.saturating_sub(dead_band)).max(1);
    let above = u32::from(raw.min(full_scale).saturating_sub(dead_band));
    (above * u32::from(MAX_VOLUME)).div_ceil(span).clamp(1, u32::from(MAX_VOLUME)) as u8
}

/// Counters kept across iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopStats {
    pub iterations: u32,
    /// Tilt samples applied to the note index.
    pub samples: u32,
    pub sensor_faults: u32,
    pub display_faults: u32,
    pub slider_faults: u32,
}

/// The foreground loop state: collaborators plus the last drawn screen.
pub struct ControlLoop<'a, S, D, L> {
    sensor: S,
    display: D,
    slider: L,
    state: &'a SynthState,
    events: &'a PendingEvents,
    /// Text currently on the display; `None` forces a full redraw.
    drawn: Option<Screen>,
    stats: LoopStats,
}

impl<'a, S, D, L> ControlLoop<'a, S, D, L>
where
    S: TiltSensor,
    D: CharDisplay,
    L: Slider,
{
    pub fn new(
        sensor: S,
        display: D,
        slider: L,
        state: &'a SynthState,
        events: &'a PendingEvents,
    ) -> Self {
        Self {
            sensor,
            display,
            slider,
            state,
            events,
            drawn: None,
            stats: LoopStats::default(),
        }
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Draw every field regardless of what is on screen.
    pub async fn draw_all(&mut self) -> Result<(), D::Error> {
        self.drawn = None;
        self.redraw().await
    }

    /// Run one iteration. Returns the first fault seen, after finishing
    /// every sub-step.
    pub async fn step(&mut self) -> Result<(), ControlError<S::Error, D::Error, L::Error>> {
        self.stats.iterations = self.stats.iterations.wrapping_add(1);
        let mut first_error = None;

        if let Err(e) = self.poll_sensor().await {
            self.stats.sensor_faults = self.stats.sensor_faults.wrapping_add(1);
            first_error.get_or_insert(ControlError::Sensor(e));
        }

        self.apply_buttons();

        let volume_changed = match self.poll_slider().await {
            Ok(changed) => changed,
            Err(e) => {
                self.stats.slider_faults = self.stats.slider_faults.wrapping_add(1);
                first_error.get_or_insert(ControlError::Slider(e));
                false
            }
        };

        let dirty = self.events.take(Event::DisplayDirty);
        if dirty || volume_changed {
            if let Err(e) = self.redraw().await {
                self.stats.display_faults = self.stats.display_faults.wrapping_add(1);
                // Screen contents are unknown now; repaint everything next time.
                self.drawn = None;
                self.events.raise(Event::DisplayDirty);
                first_error.get_or_insert(ControlError::Display(e));
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Sensor sub-step. Returns `true` if a new sample was applied.
    ///
    /// A failed acknowledge does not skip the sample read; its fault is
    /// reported only when the read itself succeeded.
    async fn poll_sensor(&mut self) -> Result<bool, S::Error> {
        let acknowledged = self.sensor.acknowledge().await;
        let applied = self.read_pending_sample().await?;
        acknowledged.map(|()| applied)
    }

    /// Read and apply a sample if one is flagged and the status agrees.
    async fn read_pending_sample(&mut self) -> Result<bool, S::Error> {
        // The flag is authoritative: no flag, no read.
        if !self.events.is_pending(Event::SensorSampleReady) {
            return Ok(false);
        }

        if !self.sensor.sample_ready().await? {
            #[cfg(feature = "defmt")]
            defmt::trace!("sensor flag set but status not ready; retrying next pass");
            return Ok(false);
        }

        let x = self.sensor.read_tilt().await?;
        self.events.take(Event::SensorSampleReady);

        let note_index = note_index_from_tilt(x);
        self.state.set_note_index(note_index);
        self.events.raise(Event::DisplayDirty);
        self.stats.samples = self.stats.samples.wrapping_add(1);

        #[cfg(feature = "defmt")]
        defmt::trace!("tilt x={} note_index={}", x, note_index);
        Ok(true)
    }

    /// Drain button flags. Returns `true` if any press was handled.
    pub fn apply_buttons(&self) -> bool {
        let mut handled = false;

        if self.events.take(Event::OctaveUpPressed) {
            self.state.shift_octave(1);
            handled = true;
        }
        if self.events.take(Event::OctaveDownPressed) {
            self.state.shift_octave(-1);
            handled = true;
        }
        if self.events.take(Event::WaveformCyclePressed) {
            self.state.cycle_waveform();
            handled = true;
        }

        if handled {
            self.events.raise(Event::DisplayDirty);
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "octave={} waveform={}",
                self.state.octave(),
                self.state.waveform()
            );
        }
        handled
    }

    /// Slider sub-step. Returns `true` if the volume changed.
    async fn poll_slider(&mut self) -> Result<bool, L::Error> {
        let reading = self.slider.read_value().await?;
        if reading == 0 {
            return Ok(false);
        }

        let volume = reading.min(MAX_VOLUME);
        if volume == self.state.volume() {
            return Ok(false);
        }
        self.state.set_volume(volume);
        Ok(true)
    }

    /// Print the fields whose text changed since the last successful draw.
    async fn redraw(&mut self) -> Result<(), D::Error> {
        let screen = Screen::from_params(&self.state.snapshot());
        let changed = screen.changed_fields(self.drawn.as_ref());
        if !changed.iter().any(|&c| c) {
            return Ok(());
        }

        for (field, _) in Field::ALL.iter().zip(changed).filter(|(_, c)| *c) {
            let (col, row) = field.position();
            self.display.set_cursor(col, row).await?;
            self.display.print(screen.field(*field)).await?;
        }
        self.display.refresh().await?;

        self.drawn = Some(screen);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{COLUMNS, ROWS};
    use crate::tables::Waveform;
    use embassy_futures::block_on;

    #[derive(Debug, PartialEq)]
    struct Fault;

    struct FakeSensor {
        ready: bool,
        x: i16,
        fail: bool,
        fail_ack: bool,
        reads: usize,
        acks: usize,
    }

    impl FakeSensor {
        fn new() -> Self {
            Self {
                ready: true,
                x: 0,
                fail: false,
                fail_ack: false,
                reads: 0,
                acks: 0,
            }
        }
    }

    impl TiltSensor for FakeSensor {
        type Error = Fault;

        async fn sample_ready(&mut self) -> Result<bool, Fault> {
            if self.fail {
                return Err(Fault);
            }
            Ok(self.ready)
        }

        async fn read_tilt(&mut self) -> Result<i16, Fault> {
            self.reads += 1;
            Ok(self.x)
        }

        async fn acknowledge(&mut self) -> Result<(), Fault> {
            if self.fail || self.fail_ack {
                return Err(Fault);
            }
            self.acks += 1;
            Ok(())
        }
    }

    struct FakeDisplay {
        grid: [[u8; COLUMNS]; ROWS],
        cursor: (usize, usize),
        prints: usize,
        refreshes: usize,
        fail: bool,
    }

    impl FakeDisplay {
        fn new() -> Self {
            Self {
                grid: [[b' '; COLUMNS]; ROWS],
                cursor: (0, 0),
                prints: 0,
                refreshes: 0,
                fail: false,
            }
        }

        fn row(&self, row: usize) -> &str {
            core::str::from_utf8(&self.grid[row]).unwrap()
        }
    }

    impl CharDisplay for FakeDisplay {
        type Error = Fault;

        async fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Fault> {
            if self.fail {
                return Err(Fault);
            }
            self.cursor = (col as usize, row as usize);
            Ok(())
        }

        async fn print(&mut self, text: &str) -> Result<(), Fault> {
            let (mut col, row) = self.cursor;
            for b in text.bytes() {
                if col < COLUMNS {
                    self.grid[row][col] = b;
                }
                col += 1;
            }
            self.cursor = (col, row);
            self.prints += 1;
            Ok(())
        }

        async fn refresh(&mut self) -> Result<(), Fault> {
            self.refreshes += 1;
            Ok(())
        }
    }

    struct ScriptedSlider<const N: usize> {
        readings: [u8; N],
        next: usize,
        fail: bool,
    }

    impl<const N: usize> ScriptedSlider<N> {
        fn new(readings: [u8; N]) -> Self {
            Self {
                readings,
                next: 0,
                fail: false,
            }
        }
    }

    impl<const N: usize> Slider for ScriptedSlider<N> {
        type Error = Fault;

        async fn read_value(&mut self) -> Result<u8, Fault> {
            if self.fail {
                return Err(Fault);
            }
            let v = self.readings[self.next.min(N - 1)];
            self.next += 1;
            Ok(v)
        }
    }

    #[test]
    fn octave_up_saturates_at_three() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut ctl = ControlLoop::new(
            FakeSensor::new(),
            FakeDisplay::new(),
            ScriptedSlider::new([0]),
            &state,
            &events,
        );

        for expected in [1, 2, 3, 3] {
            events.raise(Event::OctaveUpPressed);
            block_on(ctl.step()).unwrap();
            assert_eq!(state.octave(), expected);
        }
        assert!(!events.is_pending(Event::OctaveUpPressed));
    }

    #[test]
    fn octave_down_saturates_at_minus_three() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let ctl = ControlLoop::new(
            FakeSensor::new(),
            FakeDisplay::new(),
            ScriptedSlider::new([0]),
            &state,
            &events,
        );

        for _ in 0..5 {
            events.raise(Event::OctaveDownPressed);
            assert!(ctl.apply_buttons());
        }
        assert_eq!(state.octave(), -3);
        assert!(!ctl.apply_buttons());
    }

    #[test]
    fn slider_zero_keeps_held_volume() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut ctl = ControlLoop::new(
            FakeSensor::new(),
            FakeDisplay::new(),
            ScriptedSlider::new([0, 0, 45, 0]),
            &state,
            &events,
        );

        for _ in 0..4 {
            block_on(ctl.step()).unwrap();
        }
        assert_eq!(state.volume(), 45);
        assert_eq!(ctl.display().row(1), "Vol:  45Sine    ");
    }

    #[test]
    fn slider_out_of_range_is_clamped() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut ctl = ControlLoop::new(
            FakeSensor::new(),
            FakeDisplay::new(),
            ScriptedSlider::new([180]),
            &state,
            &events,
        );
        block_on(ctl.step()).unwrap();
        assert_eq!(state.volume(), 100);
    }

    #[test]
    fn sensor_sample_sets_note_and_redraws() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut sensor = FakeSensor::new();
        sensor.x = 2048;
        let mut ctl = ControlLoop::new(
            sensor,
            FakeDisplay::new(),
            ScriptedSlider::new([0]),
            &state,
            &events,
        );

        events.raise(Event::SensorSampleReady);
        block_on(ctl.step()).unwrap();

        assert_eq!(state.note_index(), 9.5);
        assert!(!events.is_pending(Event::SensorSampleReady));
        assert!(!events.is_pending(Event::DisplayDirty));
        assert_eq!(ctl.stats().samples, 1);
        // 9.5 rounds to 10 -> A#
        assert_eq!(&ctl.display().row(0)[..4], "A#4 ");
    }

    #[test]
    fn pending_flag_waits_for_status_agreement() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut sensor = FakeSensor::new();
        sensor.ready = false;
        sensor.x = 4096;
        let mut ctl = ControlLoop::new(
            sensor,
            FakeDisplay::new(),
            ScriptedSlider::new([0]),
            &state,
            &events,
        );

        events.raise(Event::SensorSampleReady);
        block_on(ctl.step()).unwrap();

        assert_eq!(state.note_index(), 0.0);
        assert!(events.is_pending(Event::SensorSampleReady));
        assert_eq!(ctl.sensor.reads, 0);

        ctl.sensor.ready = true;
        block_on(ctl.step()).unwrap();
        assert_eq!(state.note_index(), 12.0);
        assert!(!events.is_pending(Event::SensorSampleReady));
    }

    #[test]
    fn status_without_flag_is_ignored() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut sensor = FakeSensor::new();
        sensor.x = 4096;
        let mut ctl = ControlLoop::new(
            sensor,
            FakeDisplay::new(),
            ScriptedSlider::new([0]),
            &state,
            &events,
        );

        block_on(ctl.step()).unwrap();
        assert_eq!(ctl.sensor.reads, 0);
        assert_eq!(state.note_index(), 0.0);
        // The motion latch is released every pass.
        assert_eq!(ctl.sensor.acks, 1);
    }

    #[test]
    fn sensor_fault_does_not_stop_the_iteration() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut sensor = FakeSensor::new();
        sensor.fail = true;
        let mut ctl = ControlLoop::new(
            sensor,
            FakeDisplay::new(),
            ScriptedSlider::new([60]),
            &state,
            &events,
        );

        events.raise(Event::SensorSampleReady);
        events.raise(Event::WaveformCyclePressed);
        let result = block_on(ctl.step());

        assert!(matches!(result, Err(ControlError::Sensor(Fault))));
        assert_eq!(ctl.stats().sensor_faults, 1);
        assert_eq!(state.waveform(), Waveform::Triangle);
        assert_eq!(state.volume(), 60);
        assert!(events.is_pending(Event::SensorSampleReady));
    }

    #[test]
    fn acknowledge_fault_still_applies_the_sample() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut sensor = FakeSensor::new();
        sensor.fail_ack = true;
        sensor.x = -4096;
        let mut ctl = ControlLoop::new(
            sensor,
            FakeDisplay::new(),
            ScriptedSlider::new([0]),
            &state,
            &events,
        );

        events.raise(Event::SensorSampleReady);
        let result = block_on(ctl.step());

        assert!(matches!(result, Err(ControlError::Sensor(Fault))));
        assert_eq!(ctl.stats().sensor_faults, 1);
        assert_eq!(ctl.stats().samples, 1);
        assert_eq!(ctl.sensor.reads, 1);
        assert_eq!(state.note_index(), 0.5);
        assert!(!events.is_pending(Event::SensorSampleReady));
        assert_eq!(&ctl.display().row(0)[..4], "C#4 ");

        // Every later pass keeps reading while the latch read keeps failing.
        ctl.sensor.x = 4096;
        events.raise(Event::SensorSampleReady);
        assert!(block_on(ctl.step()).is_err());
        assert_eq!(state.note_index(), 12.0);
        assert_eq!(ctl.stats().samples, 2);
    }

    #[test]
    fn slider_fault_is_reported() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut slider = ScriptedSlider::new([50]);
        slider.fail = true;
        let mut ctl =
            ControlLoop::new(FakeSensor::new(), FakeDisplay::new(), slider, &state, &events);

        assert!(matches!(block_on(ctl.step()), Err(ControlError::Slider(Fault))));
        assert_eq!(ctl.stats().slider_faults, 1);
        assert_eq!(state.volume(), 20);
    }

    #[test]
    fn display_fault_retries_full_redraw() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut display = FakeDisplay::new();
        display.fail = true;
        let mut ctl = ControlLoop::new(
            FakeSensor::new(),
            display,
            ScriptedSlider::new([0]),
            &state,
            &events,
        );

        events.raise(Event::WaveformCyclePressed);
        assert!(matches!(block_on(ctl.step()), Err(ControlError::Display(Fault))));
        assert_eq!(ctl.stats().display_faults, 1);
        assert!(events.is_pending(Event::DisplayDirty));

        ctl.display.fail = false;
        block_on(ctl.step()).unwrap();
        assert_eq!(ctl.display().row(0), "C4              ");
        assert_eq!(ctl.display().row(1), "Vol:  20Triangle");
    }

    #[test]
    fn waveform_button_cycles_and_updates_label() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut ctl = ControlLoop::new(
            FakeSensor::new(),
            FakeDisplay::new(),
            ScriptedSlider::new([0]),
            &state,
            &events,
        );
        block_on(ctl.draw_all()).unwrap();

        for expected in ["Triangle", "Sawtooth", "Sine    "] {
            events.raise(Event::WaveformCyclePressed);
            block_on(ctl.step()).unwrap();
            assert_eq!(&ctl.display().row(1)[8..], expected);
        }
    }

    #[test]
    fn unchanged_screen_is_not_reprinted() {
        let state = SynthState::new();
        let events = PendingEvents::new();
        let mut ctl = ControlLoop::new(
            FakeSensor::new(),
            FakeDisplay::new(),
            ScriptedSlider::new([0]),
            &state,
            &events,
        );
        block_on(ctl.draw_all()).unwrap();
        assert_eq!(ctl.display().prints, 3);
        assert_eq!(ctl.display().refreshes, 1);

        // Octave down changes the note field only.
        events.raise(Event::OctaveDownPressed);
        block_on(ctl.step()).unwrap();
        assert_eq!(ctl.display().prints, 4);

        // Dirty flag with identical text prints nothing.
        events.raise(Event::DisplayDirty);
        block_on(ctl.step()).unwrap();
        assert_eq!(ctl.display().prints, 4);
        assert_eq!(ctl.display().refreshes, 2);
        assert_eq!(ctl.stats().iterations, 2);
    }

    #[test]
    fn slider_dead_band_reads_as_untouched() {
        assert_eq!(slider_percent(0, 4095, 64), 0);
        assert_eq!(slider_percent(64, 4095, 64), 0);
        assert_eq!(slider_percent(65, 4095, 64), 1);
    }

    #[test]
    fn slider_spans_one_to_one_hundred() {
        assert_eq!(slider_percent(4095, 4095, 64), 100);
        // Above full scale still clamps to 100.
        assert_eq!(slider_percent(u16::MAX, 4095, 64), 100);
        // Midway through the live span: 2016 / 4031 * 100 = 50.01 -> 51.
        assert_eq!(slider_percent(2080, 4095, 64), 51);

        let mut last = 0;
        for raw in 0..=4095 {
            let p = slider_percent(raw, 4095, 64);
            assert!(p <= 100);
            assert!(p >= last, "not monotonic at {raw}");
            last = p;
        }
    }

    #[test]
    fn slider_degenerate_dead_band() {
        // A dead band covering the whole range leaves only "untouched" and
        // the clamped minimum.
        assert_eq!(slider_percent(4095, 4095, 4095), 0);
        assert_eq!(slider_percent(5000, 4095, 4500), 1);
        assert_eq!(slider_percent(1, 4095, 0), 1);
    }
}
