//! Hit-testing and proximity.
//!
//! `HitTester` resolves a touch point to a primary key and, on request, an
//! ordered list of alternate codes for nearby printable keys. Alternates are
//! kept sorted by squared centre distance in a list capped at
//! `MAX_NEARBY_KEYS`; entries pushed past the cap are dropped.

use crate::keyboard::{Keyboard, KEYCODE_SPACE};

/// Capacity of the alternate-code list.
pub const MAX_NEARBY_KEYS: usize = 12;

/// Squared proximity radius for a keyboard: the mean of `min(width, height) + gap`
/// over all keys, scaled by 1.4 and squared.
pub fn compute_proximity_threshold(keyboard: &Keyboard) -> i32 {
    let keys = keyboard.keys();
    if keys.is_empty() {
        return 0;
    }
    let sum: i32 = keys.iter().map(|k| k.width.min(k.height) + k.gap).sum();
    let radius = (sum as f32 * 1.4 / keys.len() as f32) as i32;
    radius * radius
}

/// Result of a hit test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyHit {
    /// Index into `Keyboard::keys` of the resolved key.
    pub primary: Option<usize>,
    /// Codes of nearby printable keys, nearest first.
    pub alternates: Vec<i32>,
}

/// Hit-test settings for the active keyboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitTester {
    threshold: i32,
    proximity_correction: bool,
}

impl HitTester {
    pub fn new(threshold: i32, proximity_correction: bool) -> Self {
        Self {
            threshold,
            proximity_correction,
        }
    }

    /// Hit tester with the threshold computed from `keyboard`.
    pub fn for_keyboard(keyboard: &Keyboard, proximity_correction: bool) -> Self {
        Self::new(compute_proximity_threshold(keyboard), proximity_correction)
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: i32) {
        self.threshold = threshold;
    }

    pub fn proximity_correction(&self) -> bool {
        self.proximity_correction
    }

    pub fn set_proximity_correction(&mut self, enabled: bool) {
        self.proximity_correction = enabled;
    }

    /// Resolve `(x, y)`.
    ///
    /// The primary key is the key whose catch area holds the point, otherwise
    /// the closest printable key within the threshold. Without proximity
    /// correction only the containing key is considered. Disabled keys are not
    /// filtered here; the dispatcher rejects them.
    pub fn key_indices(&self, keyboard: &Keyboard, x: i32, y: i32, with_alternates: bool) -> KeyHit {
        let keys = keyboard.keys();
        let candidates: Vec<usize> = if self.proximity_correction {
            (0..keys.len()).collect()
        } else {
            keyboard.nearest_keys(x, y)
        };

        let mut primary = None;
        let mut closest = None;
        let mut closest_dist = self.threshold + 1;
        let mut distances: Vec<i32> = Vec::with_capacity(MAX_NEARBY_KEYS);
        let mut alternates: Vec<i32> = Vec::with_capacity(MAX_NEARBY_KEYS);

        for index in candidates {
            let key = &keys[index];
            let inside = key.is_inside(x, y);
            if inside && primary.is_none() {
                primary = Some(index);
            }
            let dist = key.squared_distance_from(x, y);
            let near = self.proximity_correction && dist < self.threshold;
            if !(near || inside) || key.primary_code() <= KEYCODE_SPACE {
                continue;
            }
            if dist < closest_dist {
                closest_dist = dist;
                closest = Some(index);
            }
            if !with_alternates {
                continue;
            }
            let slot = distances
                .iter()
                .position(|&d| d > dist)
                .unwrap_or(distances.len());
            if slot >= MAX_NEARBY_KEYS {
                continue;
            }
            for (offset, &code) in key.codes.iter().enumerate() {
                distances.insert(slot + offset, dist);
                alternates.insert(slot + offset, code);
            }
            distances.truncate(MAX_NEARBY_KEYS);
            alternates.truncate(MAX_NEARBY_KEYS);
        }

        KeyHit {
            primary: primary.or(closest),
            alternates,
        }
    }
}
