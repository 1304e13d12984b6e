// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret gate state machine.
//!
//! One gate per card, in memory only. Inputs carry their own timestamps so
//! the machine stays deterministic under test.
//!
//! ```text
//!   Dormant --(focused && secret active)--> Armed
//!   Armed   --(blur || secret inactive)---> Dormant   (buffer cleared)
//!   Armed   --(keyword | hold | taps)-----> Unlocked  (terminal)
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use bitloss_config::model::SecretConfig;
use tokio::time::Instant;
use tracing::{debug, info};

/// Lifecycle of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Not accepting input.
    Dormant,
    /// Focused on an active secret; input is being collected.
    Armed,
    /// Terminal for the session.
    Unlocked,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateState::Dormant => write!(f, "dormant"),
            GateState::Armed => write!(f, "armed"),
            GateState::Unlocked => write!(f, "unlocked"),
        }
    }
}

/// The input path that unlocked the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockTrigger {
    Keyword,
    LongPress,
    MultiTap,
    Explicit,
}

/// Tunables derived from `[secret]`.
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub keywords: Vec<String>,
    pub buffer_len: usize,
    pub hold: Duration,
    pub tap_window: Duration,
    pub taps_required: u32,
    pub idle_reset: Option<Duration>,
}

impl GateSettings {
    pub fn from_config(config: &SecretConfig) -> Self {
        Self {
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
            buffer_len: config.buffer_len,
            hold: Duration::from_millis(config.hold_ms),
            tap_window: Duration::from_millis(config.tap_window_ms),
            taps_required: config.taps_required,
            idle_reset: config.keystroke_idle_reset_ms.map(Duration::from_millis),
        }
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self::from_config(&SecretConfig::default())
    }
}

/// Per-card unlock machine.
#[derive(Debug)]
pub struct SecretGate {
    settings: GateSettings,
    state: GateState,
    focused: bool,
    secret_active: bool,
    buffer: VecDeque<char>,
    last_key_at: Option<Instant>,
    press_started: Option<Instant>,
    taps: u32,
    last_tap_at: Option<Instant>,
}

impl SecretGate {
    /// A dormant gate with an empty buffer.
    pub fn new(settings: GateSettings) -> Self {
        Self {
            settings,
            state: GateState::Dormant,
            focused: false,
            secret_active: false,
            buffer: VecDeque::new(),
            last_key_at: None,
            press_started: None,
            taps: 0,
            last_tap_at: None,
        }
    }

    /// Current state. Does not re-check activity; callers feed that in first.
    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// Current keystroke buffer, lowercased.
    pub fn buffer(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Feeds the artifact's derived `secret_active` flag.
    ///
    /// Dropping to inactive while armed disarms immediately.
    pub fn set_secret_active(&mut self, active: bool) {
        self.secret_active = active;
        self.reevaluate();
    }

    /// Card gained hover or touch focus.
    pub fn focus(&mut self) {
        self.focused = true;
        self.reevaluate();
    }

    /// Card lost focus (pointer left, touch cancelled).
    pub fn blur(&mut self) {
        self.focused = false;
        self.reevaluate();
    }

    /// A single typed character. Control characters are ignored.
    pub fn key(&mut self, ch: char, now: Instant) -> Option<UnlockTrigger> {
        if self.state != GateState::Armed || ch.is_control() {
            return None;
        }

        if let (Some(gap), Some(last)) = (self.settings.idle_reset, self.last_key_at) {
            if now.saturating_duration_since(last) > gap {
                self.buffer.clear();
            }
        }
        self.last_key_at = Some(now);

        for lower in ch.to_lowercase() {
            self.buffer.push_back(lower);
        }
        while self.buffer.len() > self.settings.buffer_len {
            self.buffer.pop_front();
        }

        let typed = self.buffer();
        if self.settings.keywords.iter().any(|k| typed.ends_with(k.as_str())) {
            return self.enter_unlocked(UnlockTrigger::Keyword);
        }
        None
    }

    /// Touch down on the card.
    pub fn press_start(&mut self, now: Instant) {
        if self.state == GateState::Armed {
            self.press_started = Some(now);
        }
    }

    /// Hold-timer tick while the press continues.
    pub fn poll_hold(&mut self, now: Instant) -> Option<UnlockTrigger> {
        if self.hold_reached(now) {
            return self.enter_unlocked(UnlockTrigger::LongPress);
        }
        None
    }

    /// Touch released. A release at or past the hold threshold still unlocks.
    pub fn press_end(&mut self, now: Instant) -> Option<UnlockTrigger> {
        let reached = self.hold_reached(now);
        self.press_started = None;
        if reached {
            return self.enter_unlocked(UnlockTrigger::LongPress);
        }
        None
    }

    /// A tap. A gap at or beyond the tap window starts a fresh sequence at 1.
    pub fn tap(&mut self, now: Instant) -> Option<UnlockTrigger> {
        if self.state != GateState::Armed {
            return None;
        }

        let within = self
            .last_tap_at
            .is_some_and(|last| now.saturating_duration_since(last) < self.settings.tap_window);
        self.taps = if within { self.taps + 1 } else { 1 };
        self.last_tap_at = Some(now);
        debug!(taps = self.taps, "secret gate tap");

        if self.taps >= self.settings.taps_required {
            return self.enter_unlocked(UnlockTrigger::MultiTap);
        }
        None
    }

    /// Explicit unlock. Only an armed gate can be unlocked.
    pub fn unlock(&mut self) -> Option<UnlockTrigger> {
        self.enter_unlocked(UnlockTrigger::Explicit)
    }

    fn hold_reached(&self, now: Instant) -> bool {
        self.state == GateState::Armed
            && self
                .press_started
                .is_some_and(|start| now.saturating_duration_since(start) >= self.settings.hold)
    }

    fn reevaluate(&mut self) {
        match self.state {
            GateState::Unlocked => {}
            GateState::Dormant if self.focused && self.secret_active => {
                self.clear_input();
                self.state = GateState::Armed;
                debug!("secret gate armed");
            }
            GateState::Armed if !(self.focused && self.secret_active) => {
                self.clear_input();
                self.state = GateState::Dormant;
                debug!("secret gate disarmed");
            }
            _ => {}
        }
    }

    fn enter_unlocked(&mut self, trigger: UnlockTrigger) -> Option<UnlockTrigger> {
        if self.state != GateState::Armed {
            return None;
        }
        self.clear_input();
        self.state = GateState::Unlocked;
        info!(?trigger, "secret gate unlocked");
        Some(trigger)
    }

    fn clear_input(&mut self) {
        self.buffer.clear();
        self.last_key_at = None;
        self.press_started = None;
        self.taps = 0;
        self.last_tap_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn armed_gate() -> SecretGate {
        let mut gate = SecretGate::new(GateSettings::default());
        gate.set_secret_active(true);
        gate.focus();
        assert_eq!(gate.state(), GateState::Armed);
        gate
    }

    fn type_str(gate: &mut SecretGate, text: &str, start: Instant, step: Duration) -> Vec<UnlockTrigger> {
        text.chars()
            .enumerate()
            .filter_map(|(i, c)| gate.key(c, start + step * i as u32))
            .collect()
    }

    #[test]
    fn hover_and_type_unlock_fires_once() {
        let mut gate = SecretGate::new(GateSettings::default());
        assert_eq!(gate.state(), GateState::Dormant);
        gate.set_secret_active(true);
        gate.focus();
        assert_eq!(gate.state(), GateState::Armed);

        let fired = type_str(&mut gate, "unlock", Instant::now(), Duration::from_millis(100));
        assert_eq!(fired, vec![UnlockTrigger::Keyword]);
        assert!(gate.is_unlocked());

        // Further input is inert.
        assert!(type_str(&mut gate, "open", Instant::now(), Duration::from_millis(10)).is_empty());
        assert!(gate.unlock().is_none());
    }

    #[test]
    fn keyword_match_is_case_insensitive_suffix() {
        let mut gate = armed_gate();
        let fired = type_str(&mut gate, "xyzREAD", Instant::now(), Duration::from_millis(50));
        assert_eq!(fired, vec![UnlockTrigger::Keyword]);
    }

    #[test]
    fn buffer_is_bounded() {
        let mut gate = armed_gate();
        type_str(&mut gate, "abcdefghijklmnop", Instant::now(), Duration::from_millis(10));
        assert_eq!(gate.buffer(), "ghijklmnop");
    }

    #[test]
    fn pause_does_not_reset_by_default() {
        let mut gate = armed_gate();
        let t0 = Instant::now();
        assert!(type_str(&mut gate, "ope", t0, Duration::from_millis(100)).is_empty());
        assert_eq!(
            gate.key('n', t0 + Duration::from_secs(3)),
            Some(UnlockTrigger::Keyword)
        );
    }

    #[test]
    fn idle_reset_clears_buffer_after_gap() {
        let settings = GateSettings {
            idle_reset: Some(Duration::from_secs(1)),
            ..GateSettings::default()
        };
        let mut gate = SecretGate::new(settings);
        gate.set_secret_active(true);
        gate.focus();

        let t0 = Instant::now();
        assert!(type_str(&mut gate, "ope", t0, Duration::from_millis(100)).is_empty());
        assert_eq!(gate.key('n', t0 + Duration::from_millis(1_500)), None);
        assert_eq!(gate.buffer(), "n");
    }

    #[test]
    fn pause_of_exactly_the_idle_gap_keeps_buffer() {
        let settings = GateSettings {
            idle_reset: Some(Duration::from_secs(1)),
            ..GateSettings::default()
        };
        let mut gate = SecretGate::new(settings);
        gate.set_secret_active(true);
        gate.focus();

        let t0 = Instant::now();
        type_str(&mut gate, "ope", t0, Duration::from_millis(100));
        let last = t0 + Duration::from_millis(200);
        assert_eq!(
            gate.key('n', last + Duration::from_secs(1)),
            Some(UnlockTrigger::Keyword)
        );
    }

    #[test]
    fn deactivation_while_armed_forces_dormant() {
        let mut gate = armed_gate();
        let t0 = Instant::now();
        type_str(&mut gate, "ope", t0, Duration::from_millis(100));
        assert_eq!(gate.buffer(), "ope");

        gate.set_secret_active(false);
        assert_eq!(gate.state(), GateState::Dormant);
        assert_eq!(gate.buffer(), "");
        assert_eq!(gate.key('n', t0 + Duration::from_millis(400)), None);
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn blur_clears_buffer_and_rearm_starts_fresh() {
        let mut gate = armed_gate();
        let t0 = Instant::now();
        type_str(&mut gate, "ope", t0, Duration::from_millis(100));
        gate.blur();
        assert_eq!(gate.state(), GateState::Dormant);

        gate.focus();
        assert_eq!(gate.state(), GateState::Armed);
        assert_eq!(gate.key('n', t0 + Duration::from_millis(500)), None);
    }

    #[test]
    fn focus_without_active_secret_stays_dormant() {
        let mut gate = SecretGate::new(GateSettings::default());
        gate.focus();
        assert_eq!(gate.state(), GateState::Dormant);
        assert_eq!(gate.key('o', Instant::now()), None);
    }

    #[test]
    fn long_press_unlocks_at_threshold() {
        let mut gate = armed_gate();
        let t0 = Instant::now();
        gate.press_start(t0);
        assert_eq!(gate.poll_hold(t0 + Duration::from_millis(1_000)), None);
        assert_eq!(
            gate.poll_hold(t0 + Duration::from_millis(1_500)),
            Some(UnlockTrigger::LongPress)
        );
    }

    #[test]
    fn short_press_does_not_unlock() {
        let mut gate = armed_gate();
        let t0 = Instant::now();
        gate.press_start(t0);
        assert_eq!(gate.press_end(t0 + Duration::from_millis(400)), None);
        assert_eq!(gate.poll_hold(t0 + Duration::from_secs(5)), None);
        assert_eq!(gate.state(), GateState::Armed);
    }

    #[test]
    fn release_after_threshold_unlocks() {
        let mut gate = armed_gate();
        let t0 = Instant::now();
        gate.press_start(t0);
        assert_eq!(
            gate.press_end(t0 + Duration::from_millis(1_600)),
            Some(UnlockTrigger::LongPress)
        );
    }

    #[test]
    fn triple_tap_within_window_unlocks() {
        let mut gate = armed_gate();
        let t0 = Instant::now();
        assert_eq!(gate.tap(t0), None);
        assert_eq!(gate.tap(t0 + Duration::from_millis(200)), None);
        assert_eq!(
            gate.tap(t0 + Duration::from_millis(400)),
            Some(UnlockTrigger::MultiTap)
        );
    }

    #[test]
    fn slow_tap_restarts_sequence_at_one() {
        let mut gate = armed_gate();
        let t0 = Instant::now();
        gate.tap(t0);
        gate.tap(t0 + Duration::from_millis(100));
        // Gap equal to the window starts a fresh sequence counting this tap.
        assert_eq!(gate.tap(t0 + Duration::from_millis(400)), None);
        assert_eq!(gate.tap(t0 + Duration::from_millis(500)), None);
        assert_eq!(
            gate.tap(t0 + Duration::from_millis(600)),
            Some(UnlockTrigger::MultiTap)
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn unlock_is_logged_with_trigger() {
        let mut gate = armed_gate();
        gate.unlock();
        assert!(logs_contain("secret gate unlocked"));
        assert!(logs_contain("Explicit"));
    }

    #[test]
    fn explicit_unlock_requires_armed() {
        let mut gate = SecretGate::new(GateSettings::default());
        assert_eq!(gate.unlock(), None);
        gate.set_secret_active(true);
        gate.focus();
        assert_eq!(gate.unlock(), Some(UnlockTrigger::Explicit));
    }

    #[derive(Debug, Clone)]
    enum Event {
        Focus,
        Blur,
        Active(bool),
        Key(char),
        PressStart,
        PollHold,
        PressEnd,
        Tap,
        Unlock,
        Wait(u64),
    }

    fn arb_event() -> impl Strategy<Value = Event> {
        prop_oneof![
            Just(Event::Focus),
            Just(Event::Blur),
            any::<bool>().prop_map(Event::Active),
            prop::sample::select(vec!['o', 'p', 'e', 'n', 'r', 'a', 'd', 'u', 'l', 'c', 'k', 'x'])
                .prop_map(Event::Key),
            Just(Event::PressStart),
            Just(Event::PollHold),
            Just(Event::PressEnd),
            Just(Event::Tap),
            Just(Event::Unlock),
            (0u64..2_000).prop_map(Event::Wait),
        ]
    }

    fn apply(gate: &mut SecretGate, event: &Event, now: &mut Instant) -> Option<UnlockTrigger> {
        match *event {
            Event::Focus => {
                gate.focus();
                None
            }
            Event::Blur => {
                gate.blur();
                None
            }
            Event::Active(a) => {
                gate.set_secret_active(a);
                None
            }
            Event::Key(c) => gate.key(c, *now),
            Event::PressStart => {
                gate.press_start(*now);
                None
            }
            Event::PollHold => gate.poll_hold(*now),
            Event::PressEnd => gate.press_end(*now),
            Event::Tap => gate.tap(*now),
            Event::Unlock => gate.unlock(),
            Event::Wait(ms) => {
                *now += Duration::from_millis(ms);
                None
            }
        }
    }

    proptest! {
        #[test]
        fn unlocked_is_terminal(events in prop::collection::vec(arb_event(), 0..80)) {
            let mut gate = SecretGate::new(GateSettings::default());
            let mut now = Instant::now();
            let mut fired = 0;
            for event in &events {
                let was_unlocked = gate.is_unlocked();
                if apply(&mut gate, event, &mut now).is_some() {
                    fired += 1;
                }
                if was_unlocked {
                    prop_assert_eq!(gate.state(), GateState::Unlocked);
                }
            }
            prop_assert!(fired <= 1);
            prop_assert_eq!(fired == 1, gate.is_unlocked());
        }

        #[test]
        fn never_unlocks_without_active_secret(events in prop::collection::vec(arb_event(), 0..80)) {
            let mut gate = SecretGate::new(GateSettings::default());
            let mut now = Instant::now();
            for event in &events {
                let event = match event {
                    Event::Active(_) => Event::Active(false),
                    other => other.clone(),
                };
                apply(&mut gate, &event, &mut now);
                prop_assert!(!gate.is_unlocked());
            }
        }
    }
}
