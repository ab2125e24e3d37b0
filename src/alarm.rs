//! Severity-ranked alarm escalation engine.
//!
//! ```text
//!   raise(kind) ──▶ active? ──no──▶ set active
//!                      │
//!                     yes ── kind > active ──▶ replace
//!                      │
//!                      └──── kind ≤ active ──▶ ignore (logged)
//!
//!   tick(now)  ──▶ active audible kind and re-beep interval elapsed
//!                  ──▶ queue its beep pattern on the PatternPlayer
//!
//!   stop()     ──▶ clear active, forget last-beep times, silence
//! ```
//!
//! Audible output is never a blocking wait.  [`PatternPlayer`] holds a
//! short queue of on/off segments and answers "should the buzzer be on
//! right now?" each time it is polled, so the main loop can keep running
//! control ticks while a pattern plays.

use heapless::Deque;
use log::{debug, info, warn};

use crate::events::EventKind;

// ---------------------------------------------------------------------------
// Beep patterns
// ---------------------------------------------------------------------------

/// `beeps` pulses of `on_ms`, each followed by `rest_ms` of silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepPattern {
    pub beeps: u8,
    pub on_ms: u32,
    pub rest_ms: u32,
}

impl BeepPattern {
    /// The pattern for an audible kind, `None` for silent kinds.
    pub const fn for_kind(kind: EventKind) -> Option<BeepPattern> {
        match kind {
            EventKind::BadState => Some(BeepPattern { beeps: 2, on_ms: 400, rest_ms: 100 }),
            EventKind::Backup => Some(BeepPattern { beeps: 3, on_ms: 300, rest_ms: 100 }),
            EventKind::Flood => Some(BeepPattern { beeps: 3, on_ms: 600, rest_ms: 100 }),
            _ => None,
        }
    }

    pub const fn duration_ms(&self) -> u32 {
        self.beeps as u32 * (self.on_ms + self.rest_ms)
    }
}

/// Minimum time between two beep patterns for the same active kind.
pub const fn rebeep_interval_ms(kind: EventKind) -> Option<u32> {
    match kind {
        EventKind::BadState => Some(60_000),
        EventKind::Backup => Some(15_000),
        EventKind::Flood => Some(5_000),
        _ => None,
    }
}

/// Silence between patterns during a self-test.
pub const SELF_TEST_GAP_MS: u32 = 2_000;

/// Patterns played by a self-test, in order.
const SELF_TEST_SEQUENCE: [EventKind; 3] = [EventKind::BadState, EventKind::Backup, EventKind::Flood];

// ---------------------------------------------------------------------------
// Pattern player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Segment {
    buzzer_on: bool,
    duration_ms: u32,
}

/// Room for a full self-test (2 + 3 + 3 beeps, two gaps) with headroom.
const SEGMENT_CAPACITY: usize = 24;

/// Time-sliced buzzer sequencer.
#[derive(Debug, Default)]
pub struct PatternPlayer {
    segments: Deque<Segment, SEGMENT_CAPACITY>,
    /// Start time of the segment at the front of the queue.
    segment_started_ms: u32,
}

impl PatternPlayer {
    pub const fn new() -> Self {
        Self {
            segments: Deque::new(),
            segment_started_ms: 0,
        }
    }

    /// Append a pattern.  Playback starts at `now_ms` if the player was idle.
    pub fn enqueue(&mut self, pattern: BeepPattern, now_ms: u32) {
        for _ in 0..pattern.beeps {
            self.push(Segment { buzzer_on: true, duration_ms: pattern.on_ms }, now_ms);
            self.push(Segment { buzzer_on: false, duration_ms: pattern.rest_ms }, now_ms);
        }
    }

    /// Append a stretch of silence.
    pub fn enqueue_gap(&mut self, gap_ms: u32, now_ms: u32) {
        self.push(Segment { buzzer_on: false, duration_ms: gap_ms }, now_ms);
    }

    fn push(&mut self, segment: Segment, now_ms: u32) {
        if self.segments.is_empty() {
            self.segment_started_ms = now_ms;
        }
        if self.segments.push_back(segment).is_err() {
            warn!("Alarm: pattern queue full, dropping segment");
        }
    }

    /// Advance playback to `now_ms` and return the buzzer level.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        while let Some(seg) = self.segments.front().copied() {
            let elapsed = now_ms.wrapping_sub(self.segment_started_ms);
            if elapsed < seg.duration_ms {
                return seg.buzzer_on;
            }
            self.segment_started_ms = self.segment_started_ms.wrapping_add(seg.duration_ms);
            self.segments.pop_front();
        }
        false
    }

    pub fn is_playing(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Drop everything queued.  The next poll reports silence.
    pub fn silence(&mut self) {
        self.segments.clear();
    }
}

// ---------------------------------------------------------------------------
// Alarm engine
// ---------------------------------------------------------------------------

/// Outputs the alarm wants driven right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmOutput {
    pub buzzer: bool,
    pub indicator: bool,
}

/// What [`AlarmEngine::raise`] did with the incoming kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaiseOutcome {
    /// The kind is now the active alarm.
    Raised,
    /// An equal or more severe alarm was already active.
    Ignored { active: EventKind },
}

#[derive(Debug, Default)]
pub struct AlarmEngine {
    active: Option<EventKind>,
    /// Last beep time per kind, indexed by `slot()`.
    last_beep_ms: [Option<u32>; EventKind::ALL.len()],
    player: PatternPlayer,
    self_testing: bool,
}

const fn slot(kind: EventKind) -> usize {
    kind as usize - 1
}

impl AlarmEngine {
    pub const fn new() -> Self {
        Self {
            active: None,
            last_beep_ms: [None; EventKind::ALL.len()],
            player: PatternPlayer::new(),
            self_testing: false,
        }
    }

    /// Escalate to `kind` unless an equal or more severe alarm is active.
    pub fn raise(&mut self, kind: EventKind) -> RaiseOutcome {
        match self.active {
            Some(active) if kind <= active => {
                debug!("Alarm: {} ignored, {} already active", kind, active);
                RaiseOutcome::Ignored { active }
            }
            previous => {
                match previous {
                    Some(p) => info!("Alarm: escalating {} -> {}", p, kind),
                    None => info!("Alarm: {} raised", kind),
                }
                self.active = Some(kind);
                RaiseOutcome::Raised
            }
        }
    }

    /// Queue a beep pattern for the active kind if its re-beep interval has
    /// elapsed.  Returns `true` when a pattern was queued.
    pub fn tick(&mut self, now_ms: u32) -> bool {
        let Some(kind) = self.active else {
            return false;
        };
        let (Some(pattern), Some(interval)) = (BeepPattern::for_kind(kind), rebeep_interval_ms(kind)) else {
            return false;
        };

        let due = self.last_beep_ms[slot(kind)].is_none_or(|last| now_ms.wrapping_sub(last) >= interval);
        if !due {
            return false;
        }

        self.last_beep_ms[slot(kind)] = Some(now_ms);
        self.player.enqueue(pattern, now_ms);
        debug!("Alarm: beep {} ({} x {}ms)", kind, pattern.beeps, pattern.on_ms);
        true
    }

    /// Current buzzer and indicator levels.  Cheap; call as often as the
    /// main loop spins.
    pub fn poll(&mut self, now_ms: u32) -> AlarmOutput {
        let buzzer = self.player.poll(now_ms);
        if self.self_testing && !self.player.is_playing() {
            self.self_testing = false;
            info!("Alarm: self-test complete");
        }
        AlarmOutput {
            buzzer,
            indicator: self.active.is_some() || self.self_testing,
        }
    }

    /// Clear the active alarm unconditionally and silence the buzzer.
    pub fn stop(&mut self) {
        if let Some(kind) = self.active.take() {
            info!("Alarm: {} stopped", kind);
        }
        self.last_beep_ms = [None; EventKind::ALL.len()];
        self.player.silence();
        self.self_testing = false;
    }

    /// Play every audible pattern once, separated by short gaps.
    /// Independent of the active alarm.
    /// Queue every pattern once.  Returns `false` and does nothing while a
    /// previous self-test is still playing.
    pub fn self_test(&mut self, now_ms: u32) -> bool {
        if self.self_testing {
            return false;
        }
        info!("Alarm: self-test started");
        for (i, kind) in SELF_TEST_SEQUENCE.iter().enumerate() {
            if i > 0 {
                self.player.enqueue_gap(SELF_TEST_GAP_MS, now_ms);
            }
            if let Some(pattern) = BeepPattern::for_kind(*kind) {
                self.player.enqueue(pattern, now_ms);
            }
        }
        self.self_testing = true;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<EventKind> {
        self.active
    }

    pub fn is_self_testing(&self) -> bool {
        self.self_testing
    }
}
