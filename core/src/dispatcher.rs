//! Touch dispatcher.
//!
//! `TouchDispatcher` consumes raw pointer events and emits discrete key events
//! to a `KeyboardActionListener`. It is an explicit state machine:
//!
//! - `Idle -> Down -> Moving* -> Idle` on release or cancel
//! - multi-pointer streams are folded into single-pointer semantics
//! - a pending long-press deadline is kept as plain data and fired by the
//!   clock passed into every call (`now`, milliseconds, monotonic)
//! - a release that lands on a freshly entered key is snapped back to the
//!   previous key when the dwell on the new key is short (debounce)
//!
//! While `abort` is set everything except DOWN and CANCEL is swallowed; while
//! a popup is on screen everything except CANCEL is swallowed.

use crate::keyboard::{Key, Keyboard};
use crate::proximity::{compute_proximity_threshold, HitTester, KeyHit};
use crate::Config;
use serde::{Deserialize, Serialize};

/// Dwell below which a release is snapped back to the previous key.
pub const DEBOUNCE_TIME: u64 = 70;
pub const LONG_PRESS_TIMEOUT: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
}

/// One raw pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub x: f32,
    pub y: f32,
    /// Number of pointers on screen when the event was generated.
    pub pointer_count: usize,
    /// Event time in milliseconds.
    pub time: u64,
}

impl TouchEvent {
    pub fn new(action: TouchAction, x: f32, y: f32, time: u64) -> Self {
        Self {
            action,
            x,
            y,
            pointer_count: 1,
            time,
        }
    }

    pub fn with_pointers(mut self, pointer_count: usize) -> Self {
        self.pointer_count = pointer_count;
        self
    }
}

/// Gesture phase, for observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Down,
    Moving,
}

/// Receiver of dispatched key events.
pub trait KeyboardActionListener {
    /// A key went down; 0 when no key was hit.
    fn on_press(&mut self, primary_code: i32);

    /// Follows every dispatch; 0 for "no key" and for literal text.
    fn on_release(&mut self, primary_code: i32);

    /// A key was resolved. `key_codes` holds the alternates, nearest first.
    fn on_key(&mut self, primary_code: i32, key_codes: &[i32], has_popup: bool);

    /// Release resolved to no key.
    fn on_no_key(&mut self) {}

    /// A key carrying literal text was resolved.
    fn on_text(&mut self, text: &str);

    /// The long-press deadline expired on `key`. Returning true consumes the
    /// rest of the gesture.
    fn on_long_press(&mut self, _key: &Key) -> bool {
        false
    }
}

/// Timing and proximity settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    pub long_press_timeout: u64,
    pub debounce_time: u64,
    pub proximity_correction: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            long_press_timeout: LONG_PRESS_TIMEOUT,
            debounce_time: DEBOUNCE_TIME,
            proximity_correction: false,
        }
    }
}

impl From<&Config> for DispatcherConfig {
    fn from(config: &Config) -> Self {
        Self {
            long_press_timeout: config.long_press_timeout_ms,
            debounce_time: config.debounce_time_ms,
            proximity_correction: config.proximity_correction,
        }
    }
}

/// Touch-to-key state machine for one keyboard view.
#[derive(Debug, Clone)]
pub struct TouchDispatcher {
    keyboard: Option<Keyboard>,
    config: DispatcherConfig,
    hit_tester: HitTester,
    phase: Phase,

    abort: bool,
    popup_on_screen: bool,
    long_press_deadline: Option<u64>,

    old_pointer_count: usize,
    old_x: f32,
    old_y: f32,

    current_key: Option<usize>,
    current_key_time: u64,
    last_key: Option<usize>,
    last_key_time: u64,
    last_code_x: i32,
    last_code_y: i32,
    last_x: i32,
    last_y: i32,
    down_time: u64,
    last_move_time: u64,
}

impl Default for TouchDispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl TouchDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            keyboard: None,
            config,
            hit_tester: HitTester::new(0, config.proximity_correction),
            phase: Phase::Idle,
            abort: false,
            popup_on_screen: false,
            long_press_deadline: None,
            old_pointer_count: 1,
            old_x: 0.0,
            old_y: 0.0,
            current_key: None,
            current_key_time: 0,
            last_key: None,
            last_key_time: 0,
            last_code_x: 0,
            last_code_y: 0,
            last_x: 0,
            last_y: 0,
            down_time: 0,
            last_move_time: 0,
        }
    }

    /// Install a new layout. Pending timers are dropped, the proximity
    /// threshold is recomputed and the current gesture is aborted.
    pub fn set_keyboard(&mut self, keyboard: Keyboard) {
        self.long_press_deadline = None;
        self.hit_tester
            .set_threshold(compute_proximity_threshold(&keyboard));
        self.keyboard = Some(keyboard);
        self.current_key = None;
        self.abort = true;
        self.phase = Phase::Idle;
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        self.keyboard.as_ref()
    }

    pub fn keyboard_mut(&mut self) -> Option<&mut Keyboard> {
        self.keyboard.as_mut()
    }

    /// Shift the active keyboard. Returns whether the shifted state changed.
    pub fn set_shifted(&mut self, shifted: bool) -> bool {
        self.keyboard
            .as_mut()
            .is_some_and(|kb| kb.set_shifted(shifted))
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    pub fn set_proximity_correction(&mut self, enabled: bool) {
        self.config.proximity_correction = enabled;
        self.hit_tester.set_proximity_correction(enabled);
    }

    pub fn proximity_threshold(&self) -> i32 {
        self.hit_tester.threshold()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_key(&self) -> Option<usize> {
        self.current_key
    }

    pub fn is_aborted(&self) -> bool {
        self.abort
    }

    /// Deadline of the pending long-press, if one is scheduled.
    pub fn pending_long_press(&self) -> Option<u64> {
        self.long_press_deadline
    }

    pub fn is_popup_on_screen(&self) -> bool {
        self.popup_on_screen
    }

    /// The host put a popup (mini keyboard) on screen.
    pub fn show_popup(&mut self) {
        self.popup_on_screen = true;
    }

    pub fn dismiss_popup(&mut self) {
        self.popup_on_screen = false;
    }

    /// The view is going away: drop timers and any popup.
    pub fn close(&mut self) {
        self.long_press_deadline = None;
        self.dismiss_popup();
        self.phase = Phase::Idle;
    }

    /// Hit-test against the active keyboard.
    pub fn key_indices(&self, x: i32, y: i32, with_alternates: bool) -> KeyHit {
        match &self.keyboard {
            Some(kb) => self.hit_tester.key_indices(kb, x, y, with_alternates),
            None => KeyHit::default(),
        }
    }

    /// Fire the long-press if its deadline has passed. Returns whether the
    /// listener handled it.
    pub fn check_long_press<L>(&mut self, now: u64, listener: &mut L) -> bool
    where
        L: KeyboardActionListener + ?Sized,
    {
        match self.long_press_deadline {
            Some(deadline) if now >= deadline => {
                self.long_press_deadline = None;
                self.open_popup_if_required(listener)
            }
            _ => false,
        }
    }

    /// Feed one raw event, folding multi-pointer streams into single-pointer
    /// semantics first. Returns whether the event was consumed.
    pub fn on_touch_event<L>(&mut self, event: TouchEvent, listener: &mut L) -> bool
    where
        L: KeyboardActionListener + ?Sized,
    {
        self.check_long_press(event.time, listener);

        let count = event.pointer_count;
        let handled = if count != self.old_pointer_count {
            if count == 1 {
                let down = TouchEvent {
                    action: TouchAction::Down,
                    ..event
                };
                let mut handled = self.on_modified_touch_event(down, listener);
                if event.action == TouchAction::Up {
                    handled = self.on_modified_touch_event(event, listener);
                }
                handled
            } else {
                let up = TouchEvent {
                    action: TouchAction::Up,
                    x: self.old_x,
                    y: self.old_y,
                    pointer_count: 1,
                    time: event.time,
                };
                self.on_modified_touch_event(up, listener)
            }
        } else if count == 1 {
            let handled = self.on_modified_touch_event(event, listener);
            self.old_x = event.x;
            self.old_y = event.y;
            handled
        } else {
            true
        };
        self.old_pointer_count = count;
        handled
    }

    /// Run one single-pointer event through the state machine.
    pub fn on_modified_touch_event<L>(&mut self, event: TouchEvent, listener: &mut L) -> bool
    where
        L: KeyboardActionListener + ?Sized,
    {
        let x = event.x as i32;
        let y = event.y as i32;
        let now = event.time;
        let key_index = self.key_indices(x, y, false).primary;

        tracing::trace!(
            "touch {:?} at ({x}, {y}) t={now} key={key_index:?} phase={:?}",
            event.action,
            self.phase
        );

        if let (Some(index), Some(kb)) = (key_index, &self.keyboard) {
            if !kb.is_key_enabled(index) {
                return true;
            }
        }
        if self.abort && !matches!(event.action, TouchAction::Down | TouchAction::Cancel) {
            return true;
        }
        if self.popup_on_screen && event.action != TouchAction::Cancel {
            return true;
        }

        match event.action {
            TouchAction::Down => {
                self.abort = false;
                self.last_code_x = x;
                self.last_code_y = y;
                self.last_key_time = 0;
                self.current_key_time = 0;
                self.last_key = None;
                self.current_key = key_index;
                self.down_time = now;
                self.last_move_time = now;
                self.phase = Phase::Down;
                listener.on_press(self.code_of(key_index));
                if key_index.is_some() {
                    self.schedule_long_press(now);
                }
            }
            TouchAction::Move => {
                let mut continue_long_press = false;
                if let Some(index) = key_index {
                    if self.current_key.is_none() {
                        self.current_key = Some(index);
                        self.current_key_time = now.saturating_sub(self.down_time);
                    } else if self.current_key == Some(index) {
                        self.current_key_time += now.saturating_sub(self.last_move_time);
                        continue_long_press = true;
                    } else {
                        self.last_key = self.current_key;
                        self.last_code_x = self.last_x;
                        self.last_code_y = self.last_y;
                        self.last_key_time =
                            self.current_key_time + now.saturating_sub(self.last_move_time);
                        self.current_key = Some(index);
                        self.current_key_time = 0;
                    }
                }
                if !continue_long_press {
                    self.long_press_deadline = None;
                    if key_index.is_some() {
                        self.schedule_long_press(now);
                    }
                }
                self.last_move_time = now;
                self.phase = Phase::Moving;
            }
            TouchAction::Up => {
                self.long_press_deadline = None;
                if key_index == self.current_key {
                    self.current_key_time += now.saturating_sub(self.last_move_time);
                } else {
                    self.last_key = self.current_key;
                    self.last_key_time =
                        self.current_key_time + now.saturating_sub(self.last_move_time);
                    self.current_key = key_index;
                    self.current_key_time = 0;
                }
                let (mut touch_x, mut touch_y) = (x, y);
                if self.current_key_time < self.last_key_time
                    && self.current_key_time < self.config.debounce_time
                    && self.last_key.is_some()
                {
                    self.current_key = self.last_key;
                    touch_x = self.last_code_x;
                    touch_y = self.last_code_y;
                }
                if !self.popup_on_screen && !self.abort {
                    self.detect_and_send_key(self.current_key, touch_x, touch_y, listener);
                }
                self.phase = Phase::Idle;
            }
            TouchAction::Cancel => {
                self.long_press_deadline = None;
                self.dismiss_popup();
                self.abort = true;
                self.phase = Phase::Idle;
            }
        }

        self.last_x = x;
        self.last_y = y;
        true
    }

    fn code_of(&self, index: Option<usize>) -> i32 {
        index
            .and_then(|i| self.keyboard.as_ref()?.key(i))
            .map_or(0, Key::primary_code)
    }

    fn schedule_long_press(&mut self, now: u64) {
        self.long_press_deadline = Some(now + self.config.long_press_timeout);
    }

    fn detect_and_send_key<L>(&self, index: Option<usize>, x: i32, y: i32, listener: &mut L)
    where
        L: KeyboardActionListener + ?Sized,
    {
        let Some(key) = index.and_then(|i| self.keyboard.as_ref()?.key(i)) else {
            listener.on_no_key();
            listener.on_release(0);
            return;
        };
        match key.text.as_deref() {
            Some(text) if !key.has_popup() => {
                listener.on_text(text);
                listener.on_release(0);
            }
            _ => {
                let code = key.primary_code();
                let hit = self.key_indices(x, y, true);
                listener.on_key(code, &hit.alternates, key.has_popup());
                listener.on_release(code);
            }
        }
    }

    fn open_popup_if_required<L>(&mut self, listener: &mut L) -> bool
    where
        L: KeyboardActionListener + ?Sized,
    {
        let key = self
            .current_key
            .and_then(|i| self.keyboard.as_ref()?.key(i));
        let handled = match key {
            Some(key) => listener.on_long_press(key),
            None => false,
        };
        if handled {
            self.abort = true;
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::KeyMetrics;
    use crate::layout::{KeySpec, KeyboardBuilder, RowSpec};

    #[derive(Debug, Default)]
    struct Recorder {
        presses: Vec<i32>,
        releases: Vec<i32>,
        keys: Vec<(i32, Vec<i32>)>,
        texts: Vec<String>,
        no_keys: usize,
        long_presses: Vec<i32>,
        consume_long_press: bool,
    }

    impl KeyboardActionListener for Recorder {
        fn on_press(&mut self, code: i32) {
            self.presses.push(code);
        }
        fn on_release(&mut self, code: i32) {
            self.releases.push(code);
        }
        fn on_key(&mut self, code: i32, codes: &[i32], _has_popup: bool) {
            self.keys.push((code, codes.to_vec()));
        }
        fn on_no_key(&mut self) {
            self.no_keys += 1;
        }
        fn on_text(&mut self, text: &str) {
            self.texts.push(text.to_string());
        }
        fn on_long_press(&mut self, key: &Key) -> bool {
            self.long_presses.push(key.primary_code());
            self.consume_long_press
        }
    }

    fn dispatcher() -> TouchDispatcher {
        let mut b = KeyboardBuilder::new(300, 400).with_metrics(KeyMetrics {
            width: 30,
            height: 40,
            horizontal_gap: 0,
            vertical_gap: 0,
        });
        b.begin_row(&RowSpec::default()).unwrap();
        for ch in "qwertyuiop".chars() {
            b.add_key(&KeySpec::labeled(&ch.to_string())).unwrap();
        }
        b.begin_row(&RowSpec::default()).unwrap();
        b.add_key(&KeySpec {
            text: Some(".com".into()),
            ..KeySpec::labeled(".com")
        })
        .unwrap();
        let mut d = TouchDispatcher::default();
        d.set_keyboard(b.build());
        d
    }

    fn ev(action: TouchAction, x: f32, y: f32, t: u64) -> TouchEvent {
        TouchEvent::new(action, x, y, t)
    }

    #[test]
    fn tap_dispatches_key() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        d.on_touch_event(ev(TouchAction::Down, 75.0, 20.0, 0), &mut r);
        assert_eq!(d.phase(), Phase::Down);
        d.on_touch_event(ev(TouchAction::Up, 75.0, 20.0, 40), &mut r);
        assert_eq!(d.phase(), Phase::Idle);
        assert_eq!(r.presses, vec!['e' as i32]);
        assert_eq!(r.keys, vec![('e' as i32, vec!['e' as i32])]);
        assert_eq!(r.releases, vec!['e' as i32]);
    }

    #[test]
    fn layout_change_aborts_until_next_down() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        assert!(d.is_aborted());
        d.on_touch_event(ev(TouchAction::Up, 75.0, 20.0, 0), &mut r);
        assert!(r.keys.is_empty(), "release before any press is swallowed");
    }

    #[test]
    fn text_key_sends_text_and_zero_release() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        d.on_touch_event(ev(TouchAction::Down, 10.0, 50.0, 0), &mut r);
        d.on_touch_event(ev(TouchAction::Up, 10.0, 50.0, 30), &mut r);
        assert_eq!(r.texts, vec![".com".to_string()]);
        assert_eq!(r.releases, vec![0]);
    }

    #[test]
    fn release_off_keyboard_is_no_key() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        d.on_touch_event(ev(TouchAction::Down, 250.0, 60.0, 0), &mut r);
        d.on_touch_event(ev(TouchAction::Up, 250.0, 60.0, 30), &mut r);
        assert_eq!(r.presses, vec![0]);
        assert_eq!(r.no_keys, 1);
        assert_eq!(r.releases, vec![0]);
        assert_eq!(d.pending_long_press(), None);
    }

    #[test]
    fn short_dwell_on_new_key_snaps_back() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        d.on_touch_event(ev(TouchAction::Down, 75.0, 20.0, 0), &mut r);
        d.on_touch_event(ev(TouchAction::Move, 75.0, 20.0, 100), &mut r);
        d.on_touch_event(ev(TouchAction::Move, 95.0, 20.0, 100), &mut r);
        d.on_touch_event(ev(TouchAction::Up, 95.0, 20.0, 130), &mut r);
        assert_eq!(r.keys.len(), 1);
        assert_eq!(r.keys[0].0, 'e' as i32, "30ms on r against 100ms on e resolves to e");
    }

    #[test]
    fn long_dwell_on_new_key_is_kept() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        d.on_touch_event(ev(TouchAction::Down, 75.0, 20.0, 0), &mut r);
        d.on_touch_event(ev(TouchAction::Move, 95.0, 20.0, 50), &mut r);
        d.on_touch_event(ev(TouchAction::Up, 95.0, 20.0, 200), &mut r);
        assert_eq!(r.keys[0].0, 'r' as i32);
    }

    #[test]
    fn long_press_fires_on_deadline_and_aborts() {
        let mut d = dispatcher();
        let mut r = Recorder {
            consume_long_press: true,
            ..Default::default()
        };
        d.on_touch_event(ev(TouchAction::Down, 75.0, 20.0, 0), &mut r);
        assert_eq!(d.pending_long_press(), Some(LONG_PRESS_TIMEOUT));
        assert!(!d.check_long_press(499, &mut r));
        assert!(d.check_long_press(500, &mut r));
        assert_eq!(r.long_presses, vec!['e' as i32]);
        d.on_touch_event(ev(TouchAction::Up, 75.0, 20.0, 600), &mut r);
        assert!(r.keys.is_empty(), "handled long press swallows the release");
    }

    #[test]
    fn moving_to_another_key_reschedules_long_press() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        d.on_touch_event(ev(TouchAction::Down, 75.0, 20.0, 0), &mut r);
        d.on_touch_event(ev(TouchAction::Move, 76.0, 20.0, 300), &mut r);
        assert_eq!(d.pending_long_press(), Some(500), "same key keeps the deadline");
        d.on_touch_event(ev(TouchAction::Move, 95.0, 20.0, 400), &mut r);
        assert_eq!(d.pending_long_press(), Some(900));
    }

    #[test]
    fn expired_long_press_fires_before_next_event() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        d.on_touch_event(ev(TouchAction::Down, 75.0, 20.0, 0), &mut r);
        d.on_touch_event(ev(TouchAction::Up, 75.0, 20.0, 800), &mut r);
        assert_eq!(r.long_presses, vec!['e' as i32]);
        assert_eq!(r.keys.len(), 1, "unhandled long press still dispatches");
    }

    #[test]
    fn disabled_key_swallows_touches() {
        let mut d = dispatcher();
        d.keyboard_mut().unwrap().disable_keys(&[2]);
        let mut r = Recorder::default();
        d.on_touch_event(ev(TouchAction::Down, 75.0, 20.0, 0), &mut r);
        assert!(r.presses.is_empty());
    }

    #[test]
    fn popup_swallows_until_cancel() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        d.show_popup();
        d.on_touch_event(ev(TouchAction::Down, 75.0, 20.0, 0), &mut r);
        assert!(r.presses.is_empty());
        d.on_touch_event(ev(TouchAction::Cancel, 75.0, 20.0, 10), &mut r);
        assert!(!d.is_popup_on_screen());
        assert!(d.is_aborted());
    }

    #[test]
    fn second_pointer_releases_first() {
        let mut d = dispatcher();
        let mut r = Recorder::default();
        d.on_touch_event(ev(TouchAction::Down, 75.0, 20.0, 0), &mut r);
        d.on_touch_event(ev(TouchAction::Move, 165.0, 20.0, 20).with_pointers(2), &mut r);
        assert_eq!(r.keys.len(), 1);
        assert_eq!(r.keys[0].0, 'e' as i32);

        d.on_touch_event(ev(TouchAction::Move, 170.0, 20.0, 30).with_pointers(2), &mut r);
        assert_eq!(r.presses.len(), 1, "two-pointer moves are swallowed");

        d.on_touch_event(ev(TouchAction::Move, 165.0, 20.0, 40), &mut r);
        assert_eq!(r.presses, vec!['e' as i32, 'y' as i32]);
        d.on_touch_event(ev(TouchAction::Up, 165.0, 20.0, 140), &mut r);
        assert_eq!(r.keys[1].0, 'y' as i32);
    }
}
