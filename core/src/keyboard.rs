//! Keyboard layout model.
//!
//! - `Key`: geometry, codes and runtime state of a single key
//! - `Row`: row-level defaults and the indices of the keys it holds
//! - `Keyboard`: rows plus the flattened key list that hit-testing works on
//!
//! Keys live once in `Keyboard::keys`; rows refer to them by index, so an
//! index handed out by hit-testing stays valid for the lifetime of the
//! keyboard instance. Keyboards are built by `layout::KeyboardBuilder` or
//! `Keyboard::popup`.

use ahash::AHashSet;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const KEYCODE_SHIFT: i32 = -1;
pub const KEYCODE_MODE_CHANGE: i32 = -2;
pub const KEYCODE_CANCEL: i32 = -3;
pub const KEYCODE_DONE: i32 = -4;
pub const KEYCODE_DELETE: i32 = -5;
pub const KEYCODE_ALT: i32 = -6;
pub const KEYCODE_SYMBOLS_CHANGE: i32 = -10;
pub const KEYCODE_LANGUAGE_CHANGE: i32 = -12;
pub const KEYCODE_EMOJI: i32 = -13;
pub const KEYCODE_DOMAIN: i32 = -14;
/// Line feed; enter keys carry it as their primary code.
pub const KEYCODE_ENTER: i32 = 10;
pub const KEYCODE_SPACE: i32 = 32;

/// Keys per line when a popup keyboard is built without an explicit column count.
pub const DEFAULT_CHARS_PER_POPUP_LINE: usize = 10;
/// Multiplier applied to the default key width to get the layout's own
/// proximity radius.
pub const SEARCH_DISTANCE: f32 = 1.8;

bitflags! {
    /// Edges of the keyboard a key (or row) is anchored to.
    ///
    /// An anchored key catches every touch that lands beyond that edge.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EdgeFlags: u8 {
        const LEFT = 1;
        const RIGHT = 2;
        const TOP = 4;
        const BOTTOM = 8;
    }
}

/// A single key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Key {
    /// Codes emitted by the key; the first one is the primary code.
    pub codes: Vec<i32>,
    pub label: Option<String>,
    /// Literal text sent instead of a key code.
    pub text: Option<String>,
    pub popup_characters: Option<String>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Horizontal gap before this key.
    pub gap: i32,
    pub edge_flags: EdgeFlags,
    pub repeatable: bool,
    pub modifier: bool,
    pub sticky: bool,
    pub pressed: bool,
    pub on: bool,
}

impl Key {
    /// Primary code, or 0 for a key without codes.
    pub fn primary_code(&self) -> i32 {
        self.codes.first().copied().unwrap_or(0)
    }

    /// Whether the key carries a non-empty popup character set.
    pub fn has_popup(&self) -> bool {
        self.popup_characters
            .as_deref()
            .is_some_and(|chars| !chars.is_empty())
    }

    /// Plain rectangle test over `[x, x + width) x [y, y + height)`.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Rectangle test extended by the key's edge anchors: along an anchored
    /// edge the catch area is unbounded in that direction.
    pub fn is_inside(&self, x: i32, y: i32) -> bool {
        let edges = self.edge_flags;
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        (x >= self.x || (edges.contains(EdgeFlags::LEFT) && x <= right))
            && (x < right || (edges.contains(EdgeFlags::RIGHT) && x >= self.x))
            && (y >= self.y || (edges.contains(EdgeFlags::TOP) && y <= bottom))
            && (y < bottom || (edges.contains(EdgeFlags::BOTTOM) && y >= self.y))
    }

    /// Squared distance from the key's centre to the point, saturating at
    /// `i32::MAX` for points far off the key.
    pub fn squared_distance_from(&self, x: i32, y: i32) -> i32 {
        let dx = (self.x + self.width / 2).saturating_sub(x);
        let dy = (self.y + self.height / 2).saturating_sub(y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Mark the key pressed.
    pub fn on_pressed(&mut self) {
        self.pressed = !self.pressed;
    }

    /// Mark the key released; sticky keys flip their `on` state.
    pub fn on_released(&mut self) {
        self.pressed = !self.pressed;
        if self.sticky {
            self.on = !self.on;
        }
    }
}

/// Row-level defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub default_width: i32,
    pub default_height: i32,
    pub default_horizontal_gap: i32,
    /// Vertical gap following this row.
    pub vertical_gap: i32,
    pub edge_flags: EdgeFlags,
    /// Keyboard mode this row belongs to; 0 matches every mode.
    pub mode: i32,
    pub(crate) keys: Vec<usize>,
}

impl Row {
    /// Indices into `Keyboard::keys` of the keys on this row.
    pub fn key_indices(&self) -> &[usize] {
        &self.keys
    }
}

/// Default key geometry for a keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub width: i32,
    pub height: i32,
    pub horizontal_gap: i32,
    pub vertical_gap: i32,
}

impl KeyMetrics {
    /// Ten keys per display width, 50 pixels tall, no gaps.
    pub fn for_display(display_width: i32) -> Self {
        Self {
            width: display_width / 10,
            height: 50,
            horizontal_gap: 0,
            vertical_gap: 0,
        }
    }
}

/// A laid-out keyboard.
#[derive(Debug, Clone, Default)]
pub struct Keyboard {
    pub(crate) rows: Vec<Row>,
    pub(crate) keys: Vec<Key>,
    pub(crate) metrics: Option<KeyMetrics>,
    pub(crate) total_width: i32,
    pub(crate) total_height: i32,
    pub(crate) display_width: i32,
    pub(crate) display_height: i32,
    pub(crate) shift_keys: [Option<usize>; 2],
    pub(crate) modifier_keys: Vec<usize>,
    pub(crate) enter_key: Option<usize>,
    pub(crate) space_key: Option<usize>,
    pub(crate) mode_change_key: Option<usize>,
    pub(crate) disabled: AHashSet<usize>,
    pub(crate) shifted: bool,
    pub(crate) mode: i32,
    pub(crate) proximity_threshold: i32,
    pub(crate) load_error: Option<String>,
}

impl Keyboard {
    /// Build a mini keyboard holding one key per popup character, `columns`
    /// keys per line (0 means unlimited), wrapping early when a line would
    /// overflow `display_width`.
    pub fn popup(
        characters: &str,
        columns: usize,
        horizontal_padding: i32,
        metrics: KeyMetrics,
        display_width: i32,
    ) -> Self {
        let max_columns = if columns == 0 { usize::MAX } else { columns };
        let mut keyboard = Keyboard {
            metrics: Some(metrics),
            display_width,
            ..Default::default()
        };

        let (mut x, mut y, mut column) = (0, 0, 0usize);
        let mut row = Row {
            default_width: metrics.width,
            default_height: metrics.height,
            default_horizontal_gap: metrics.horizontal_gap,
            vertical_gap: metrics.vertical_gap,
            ..Default::default()
        };
        for ch in characters.chars() {
            if column >= max_columns || x + metrics.width + horizontal_padding > display_width {
                if !row.keys.is_empty() {
                    let next = Row {
                        keys: Vec::new(),
                        ..row.clone()
                    };
                    keyboard.rows.push(std::mem::replace(&mut row, next));
                    y += metrics.vertical_gap + metrics.height;
                }
                x = 0;
                column = 0;
            }
            keyboard.keys.push(Key {
                codes: vec![ch as i32],
                label: Some(ch.to_string()),
                x,
                y,
                width: metrics.width,
                height: metrics.height,
                gap: metrics.horizontal_gap,
                ..Default::default()
            });
            row.keys.push(keyboard.keys.len() - 1);
            column += 1;
            x += metrics.width + metrics.horizontal_gap;
            keyboard.total_width = keyboard.total_width.max(x);
        }
        if !row.keys.is_empty() {
            keyboard.rows.push(row);
            keyboard.total_height = y + metrics.height;
        }

        let last = keyboard.rows.len().saturating_sub(1);
        for (i, row) in keyboard.rows.iter_mut().enumerate() {
            if i == 0 {
                row.edge_flags |= EdgeFlags::TOP;
            }
            if i == last {
                row.edge_flags |= EdgeFlags::BOTTOM;
            }
            for &k in &row.keys {
                keyboard.keys[k].edge_flags |= row.edge_flags;
            }
        }
        keyboard.proximity_threshold = squared_search_distance(metrics.width);
        keyboard
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Flattened key list in visual reading order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn key(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    pub fn key_mut(&mut self, index: usize) -> Option<&mut Key> {
        self.keys.get_mut(index)
    }

    pub fn width(&self) -> i32 {
        self.total_width
    }

    pub fn height(&self) -> i32 {
        self.total_height
    }

    pub fn display_width(&self) -> i32 {
        self.display_width
    }

    pub fn display_height(&self) -> i32 {
        self.display_height
    }

    /// Default key geometry the keyboard was laid out with.
    pub fn metrics(&self) -> Option<KeyMetrics> {
        self.metrics
    }

    /// Keyboard mode rows were filtered against at load time.
    pub fn mode(&self) -> i32 {
        self.mode
    }

    /// Squared proximity radius derived from the default key width.
    pub fn proximity_threshold(&self) -> i32 {
        self.proximity_threshold
    }

    /// Indices of the (up to two) shift keys.
    pub fn shift_key_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.shift_keys.iter().flatten().copied()
    }

    /// Indices of shift and alt keys.
    pub fn modifier_keys(&self) -> &[usize] {
        &self.modifier_keys
    }

    /// The structural error that cut loading short, if any.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn is_shifted(&self) -> bool {
        self.shifted
    }

    /// Set the shift state of both shift keys. Returns true only when the
    /// keyboard-level shifted state changed.
    pub fn set_shifted(&mut self, shift_state: bool) -> bool {
        for index in self.shift_keys.iter().flatten() {
            if let Some(key) = self.keys.get_mut(*index) {
                key.on = shift_state;
            }
        }
        if self.shifted != shift_state {
            self.shifted = shift_state;
            true
        } else {
            false
        }
    }

    /// Shrink every row that no longer fits `new_width`.
    ///
    /// Key widths are scaled by `(new_width - total_gap) / total_width` and
    /// keys are repacked from the left edge with their gaps unchanged. Vertical
    /// placement is left as it is.
    pub fn resize(&mut self, new_width: i32, _new_height: i32) {
        let keys = &mut self.keys;
        for row in &self.rows {
            let mut total_gap = 0;
            let mut total_width = 0;
            for (i, &index) in row.keys.iter().enumerate() {
                if i > 0 {
                    total_gap += keys[index].gap;
                }
                total_width += keys[index].width;
            }
            if total_width > 0 && total_gap + total_width > new_width {
                let scale = (new_width - total_gap) as f32 / total_width as f32;
                let mut x = 0;
                for &index in &row.keys {
                    let key = &mut keys[index];
                    key.width = (key.width as f32 * scale) as i32;
                    key.x = x;
                    x += key.width + key.gap;
                }
            }
        }
        self.total_width = new_width;
    }

    /// Replace the disabled key set. Disabled keys swallow touches.
    pub fn disable_keys(&mut self, indices: &[usize]) {
        self.disabled = indices.iter().copied().collect();
    }

    pub fn is_key_enabled(&self, index: usize) -> bool {
        !self.disabled.contains(&index)
    }

    /// Index of the first key whose edge-aware catch area holds the point.
    pub fn nearest_keys(&self, x: i32, y: i32) -> Vec<usize> {
        self.keys
            .iter()
            .position(|key| key.is_inside(x, y))
            .into_iter()
            .collect()
    }

    /// Relabel the enter key. Returns whether the label changed, ignoring case.
    pub fn set_enter_key_label(&mut self, label: &str) -> bool {
        relabel(&mut self.keys, self.enter_key, label)
    }

    /// Relabel the space key. Returns whether the label changed, ignoring case.
    pub fn set_space_key_label(&mut self, label: &str) -> bool {
        relabel(&mut self.keys, self.space_key, label)
    }

    /// Relabel the mode-change key. Returns whether the label changed, ignoring case.
    pub fn set_mode_change_key_label(&mut self, label: &str) -> bool {
        relabel(&mut self.keys, self.mode_change_key, label)
    }

    /// Label as it should be drawn: short lowercase labels are upper-cased
    /// while the keyboard is shifted.
    pub fn display_label(&self, index: usize) -> Option<Cow<'_, str>> {
        let label = self.keys.get(index)?.label.as_deref()?;
        let short = label.chars().count() < 3;
        let lower_first = label.chars().next().is_some_and(char::is_lowercase);
        if self.shifted && short && lower_first {
            Some(Cow::Owned(label.to_uppercase()))
        } else {
            Some(Cow::Borrowed(label))
        }
    }
}

pub(crate) fn squared_search_distance(default_width: i32) -> i32 {
    let radius = (default_width as f32 * SEARCH_DISTANCE) as i32;
    radius * radius
}

fn relabel(keys: &mut [Key], index: Option<usize>, label: &str) -> bool {
    let Some(key) = index.and_then(|i| keys.get_mut(i)) else {
        return false;
    };
    let changed = key
        .label
        .as_deref()
        .map_or(true, |old| old.to_lowercase() != label.to_lowercase());
    key.label = Some(label.to_string());
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_at(x: i32, y: i32, w: i32, h: i32, edges: EdgeFlags) -> Key {
        Key {
            codes: vec!['a' as i32],
            x,
            y,
            width: w,
            height: h,
            edge_flags: edges,
            ..Default::default()
        }
    }

    #[test]
    fn right_edge_catches_overshoot() {
        let anchored = key_at(90, 0, 10, 10, EdgeFlags::RIGHT);
        let plain = key_at(90, 0, 10, 10, EdgeFlags::empty());
        assert!(anchored.is_inside(100, 5), "boundary point should be caught by EDGE_RIGHT");
        assert!(anchored.is_inside(250, 5));
        assert!(!plain.is_inside(100, 5), "boundary point is outside without the flag");
    }

    #[test]
    fn top_and_left_edges_extend_upwards_and_leftwards() {
        let key = key_at(0, 0, 10, 10, EdgeFlags::LEFT | EdgeFlags::TOP);
        assert!(key.is_inside(-20, -20));
        assert!(!key.is_inside(-20, 10), "bottom edge is not anchored");
    }

    #[test]
    fn squared_distance_uses_centre() {
        let key = key_at(0, 0, 10, 20, EdgeFlags::empty());
        assert_eq!(key.squared_distance_from(5, 10), 0);
        assert_eq!(key.squared_distance_from(8, 14), 9 + 16);
    }

    #[test]
    fn squared_distance_saturates_far_off_the_key() {
        let key = key_at(0, 0, 10, 10, EdgeFlags::RIGHT);
        assert_eq!(key.squared_distance_from(60_000, 5), i32::MAX);
        assert_eq!(key.squared_distance_from(i32::MIN, i32::MAX), i32::MAX);
        assert!(key.is_inside(60_000, 5));
    }

    #[test]
    fn sticky_release_toggles_on() {
        let mut key = key_at(0, 0, 10, 10, EdgeFlags::empty());
        key.sticky = true;
        key.on_pressed();
        assert!(key.pressed);
        key.on_released();
        assert!(!key.pressed);
        assert!(key.on);
    }

    #[test]
    fn popup_wraps_at_columns() {
        let metrics = KeyMetrics {
            width: 20,
            height: 30,
            horizontal_gap: 0,
            vertical_gap: 5,
        };
        let kb = Keyboard::popup("abcde", 2, 0, metrics, 1000);
        assert_eq!(kb.keys().len(), 5);
        assert_eq!(kb.rows().len(), 3);
        assert_eq!(kb.keys()[2].y, 35);
        assert_eq!(kb.keys()[2].x, 0);
        assert_eq!(kb.width(), 40);
        assert_eq!(kb.height(), 35 * 2 + 30);
        assert!(kb.keys()[0].edge_flags.contains(EdgeFlags::TOP));
        assert!(kb.keys()[4].edge_flags.contains(EdgeFlags::BOTTOM));
        assert_eq!(kb.keys()[3].primary_code(), 'd' as i32);
    }

    #[test]
    fn popup_wraps_at_display_width() {
        let metrics = KeyMetrics {
            width: 30,
            height: 30,
            horizontal_gap: 0,
            vertical_gap: 0,
        };
        let kb = Keyboard::popup("abcd", 0, 10, metrics, 100);
        // 90 + 30 + 10 > 100 pushes the fourth key onto a new line
        assert_eq!(kb.rows().len(), 2);
        assert_eq!(kb.keys()[2].y, 0);
        assert_eq!(kb.keys()[3].y, 30);
    }
}
