//! Layout construction.
//!
//! `KeyboardBuilder` accumulates rows and keys top to bottom, left to right:
//! each key's x includes its own gap, a row advances y by its default height
//! plus its vertical gap, and rows tagged with a keyboard mode other than the
//! active one are dropped. Layout documents are JSON (`load_layout_str`),
//! walked row by row so that a malformed row or key ends loading while keeping
//! everything accumulated before it.
//!
//! Dimensions are pixels (`48`) or a percentage of the display (`"10%"`).

use crate::keyboard::{
    squared_search_distance, EdgeFlags, Key, KeyMetrics, Keyboard, Row, KEYCODE_ALT, KEYCODE_DONE,
    KEYCODE_ENTER, KEYCODE_MODE_CHANGE, KEYCODE_SHIFT, KEYCODE_SPACE,
};
use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A length in pixels or relative to the display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Pixels(i32),
    Relative(String),
}

impl Dimension {
    /// Resolve against `base` (display width for horizontal values, display
    /// height for vertical ones).
    pub fn resolve(&self, base: i32) -> anyhow::Result<i32> {
        match self {
            Dimension::Pixels(px) => Ok(*px),
            Dimension::Relative(text) => {
                let pct = text
                    .trim()
                    .strip_suffix('%')
                    .ok_or_else(|| anyhow!("dimension {text:?} is neither pixels nor a percentage"))?;
                let pct: f32 = pct
                    .trim()
                    .parse()
                    .with_context(|| format!("bad percentage in {text:?}"))?;
                Ok((base as f32 * pct / 100.0) as i32)
            }
        }
    }
}

fn resolve_or(dim: &Option<Dimension>, base: i32, fallback: i32) -> anyhow::Result<i32> {
    dim.as_ref().map_or(Ok(fallback), |d| d.resolve(base))
}

/// Key codes as written in a layout: one code, a list, or a CSV string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Codes {
    Single(i32),
    List(Vec<i32>),
    Csv(String),
}

impl Codes {
    pub fn to_vec(&self) -> anyhow::Result<Vec<i32>> {
        match self {
            Codes::Single(code) => Ok(vec![*code]),
            Codes::List(codes) => Ok(codes.clone()),
            Codes::Csv(csv) => csv
                .split(',')
                .map(|part| {
                    part.trim()
                        .parse::<i32>()
                        .with_context(|| format!("bad key code {part:?} in {csv:?}"))
                })
                .collect(),
        }
    }
}

/// Keyboard-level defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardSpec {
    pub key_width: Option<Dimension>,
    pub key_height: Option<Dimension>,
    pub horizontal_gap: Option<Dimension>,
    pub vertical_gap: Option<Dimension>,
}

/// Row attributes; unset values inherit the keyboard defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSpec {
    pub key_width: Option<Dimension>,
    pub key_height: Option<Dimension>,
    pub horizontal_gap: Option<Dimension>,
    pub vertical_gap: Option<Dimension>,
    pub edge_flags: EdgeFlags,
    pub keyboard_mode: i32,
}

/// Key attributes; unset geometry inherits the row defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySpec {
    pub codes: Option<Codes>,
    pub label: Option<String>,
    pub text: Option<String>,
    pub popup_characters: Option<String>,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub gap: Option<Dimension>,
    pub edge_flags: EdgeFlags,
    pub repeatable: bool,
    pub modifier: bool,
    pub sticky: bool,
}

impl KeySpec {
    /// A key labelled `label` whose primary code is the label's first char.
    pub fn labeled(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Default::default()
        }
    }

    /// A key with an explicit code.
    pub fn code(code: i32, label: &str) -> Self {
        Self {
            codes: Some(Codes::Single(code)),
            label: Some(label.to_string()),
            ..Default::default()
        }
    }
}

/// Accumulates rows and keys into a `Keyboard`.
#[derive(Debug)]
pub struct KeyboardBuilder {
    keyboard: Keyboard,
    metrics: KeyMetrics,
    current_row: Option<Row>,
    x: i32,
    y: i32,
}

impl KeyboardBuilder {
    pub fn new(display_width: i32, display_height: i32) -> Self {
        let metrics = KeyMetrics::for_display(display_width);
        let keyboard = Keyboard {
            display_width,
            display_height,
            metrics: Some(metrics),
            proximity_threshold: squared_search_distance(metrics.width),
            ..Default::default()
        };
        Self {
            keyboard,
            metrics,
            current_row: None,
            x: 0,
            y: 0,
        }
    }

    /// Keyboard mode rows are filtered against.
    pub fn with_mode(mut self, mode: i32) -> Self {
        self.keyboard.mode = mode;
        self
    }

    pub fn with_metrics(mut self, metrics: KeyMetrics) -> Self {
        self.set_metrics(metrics);
        self
    }

    fn set_metrics(&mut self, metrics: KeyMetrics) {
        self.metrics = metrics;
        self.keyboard.metrics = Some(metrics);
        self.keyboard.proximity_threshold = squared_search_distance(metrics.width);
    }

    /// Apply keyboard-level defaults.
    pub fn keyboard_attributes(&mut self, spec: &KeyboardSpec) -> anyhow::Result<()> {
        let (dw, dh) = (self.keyboard.display_width, self.keyboard.display_height);
        let metrics = KeyMetrics {
            width: resolve_or(&spec.key_width, dw, dw / 10)?,
            height: resolve_or(&spec.key_height, dh, 50)?,
            horizontal_gap: resolve_or(&spec.horizontal_gap, dw, 0)?,
            vertical_gap: resolve_or(&spec.vertical_gap, dh, 0)?,
        };
        self.set_metrics(metrics);
        Ok(())
    }

    /// Start a row. Returns `Ok(false)` when the row belongs to another
    /// keyboard mode; keys added before the next `begin_row` are then rejected.
    pub fn begin_row(&mut self, spec: &RowSpec) -> anyhow::Result<bool> {
        self.end_row();
        self.x = 0;
        if spec.keyboard_mode != 0 && spec.keyboard_mode != self.keyboard.mode {
            return Ok(false);
        }
        let (dw, dh) = (self.keyboard.display_width, self.keyboard.display_height);
        self.current_row = Some(Row {
            default_width: resolve_or(&spec.key_width, dw, self.metrics.width)?,
            default_height: resolve_or(&spec.key_height, dh, self.metrics.height)?,
            default_horizontal_gap: resolve_or(&spec.horizontal_gap, dw, self.metrics.horizontal_gap)?,
            vertical_gap: resolve_or(&spec.vertical_gap, dh, self.metrics.vertical_gap)?,
            edge_flags: spec.edge_flags,
            mode: spec.keyboard_mode,
            keys: Vec::new(),
        });
        Ok(true)
    }

    /// Append a key to the open row, returning its index in the flattened list.
    pub fn add_key(&mut self, spec: &KeySpec) -> anyhow::Result<usize> {
        let Some(row) = self.current_row.as_mut() else {
            bail!("key {:?} is not inside an open row", spec.label);
        };
        let (dw, dh) = (self.keyboard.display_width, self.keyboard.display_height);

        let codes = match (&spec.codes, spec.label.as_deref()) {
            (Some(codes), _) => codes.to_vec()?,
            (None, Some(label)) if !label.is_empty() => {
                label.chars().next().map(|c| vec![c as i32]).unwrap_or_default()
            }
            _ => Vec::new(),
        };
        if codes.is_empty() {
            bail!("key {:?} has neither codes nor a label", spec.text);
        }

        let width = resolve_or(&spec.width, dw, row.default_width)?;
        let height = resolve_or(&spec.height, dh, row.default_height)?;
        let gap = resolve_or(&spec.gap, dw, row.default_horizontal_gap)?;
        let key = Key {
            codes,
            label: spec.label.clone(),
            text: spec.text.clone(),
            popup_characters: spec.popup_characters.clone(),
            x: self.x + gap,
            y: self.y,
            width,
            height,
            gap,
            edge_flags: row.edge_flags | spec.edge_flags,
            repeatable: spec.repeatable,
            modifier: spec.modifier,
            sticky: spec.sticky,
            pressed: false,
            on: false,
        };

        let index = self.keyboard.keys.len();
        let kb = &mut self.keyboard;
        match key.primary_code() {
            KEYCODE_SHIFT => {
                if let Some(slot) = kb.shift_keys.iter_mut().find(|slot| slot.is_none()) {
                    *slot = Some(index);
                }
                kb.modifier_keys.push(index);
            }
            KEYCODE_ALT => kb.modifier_keys.push(index),
            KEYCODE_ENTER | KEYCODE_DONE => kb.enter_key = Some(index),
            KEYCODE_SPACE => kb.space_key = Some(index),
            KEYCODE_MODE_CHANGE => kb.mode_change_key = Some(index),
            _ => {}
        }

        self.x += gap + width;
        kb.total_width = kb.total_width.max(self.x);
        kb.keys.push(key);
        row.keys.push(index);
        Ok(index)
    }

    /// Close the open row, if any.
    pub fn end_row(&mut self) {
        if let Some(row) = self.current_row.take() {
            self.y += row.vertical_gap + row.default_height;
            self.keyboard.rows.push(row);
        }
    }

    /// Record the error that stopped loading.
    pub fn fail(&mut self, error: &anyhow::Error) {
        tracing::warn!(
            "layout loading stopped after {} keys: {error:#}",
            self.keyboard.keys.len()
        );
        self.keyboard.load_error = Some(format!("{error:#}"));
    }

    pub fn build(mut self) -> Keyboard {
        self.end_row();
        self.keyboard.total_height = (self.y - self.metrics.vertical_gap).max(0);
        self.keyboard
    }
}

/// Load a JSON layout document:
///
/// ```json
/// { "key_width": "10%", "rows": [ { "keys": [ { "label": "q" } ] } ] }
/// ```
///
/// Only a document that is not a JSON object is an error. A malformed row or
/// key stops loading; the keyboard keeps what came before it and reports the
/// problem through `Keyboard::load_error`.
pub fn load_layout_str(
    json: &str,
    display_width: i32,
    display_height: i32,
    mode: i32,
) -> anyhow::Result<Keyboard> {
    let doc: serde_json::Value = serde_json::from_str(json).context("layout is not valid JSON")?;
    if !doc.is_object() {
        bail!("layout document must be a JSON object");
    }

    let mut builder = KeyboardBuilder::new(display_width, display_height).with_mode(mode);
    if let Err(err) = walk_layout(&doc, &mut builder) {
        builder.fail(&err);
    }
    let keyboard = builder.build();
    tracing::debug!(
        "loaded layout: {} rows, {} keys, {}x{}",
        keyboard.rows().len(),
        keyboard.keys().len(),
        keyboard.width(),
        keyboard.height()
    );
    Ok(keyboard)
}

/// Read and load a JSON layout file.
pub fn load_layout_file<P: AsRef<Path>>(
    path: P,
    display_width: i32,
    display_height: i32,
    mode: i32,
) -> anyhow::Result<Keyboard> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read layout {}", path.display()))?;
    load_layout_str(&json, display_width, display_height, mode)
}

fn walk_layout(doc: &serde_json::Value, builder: &mut KeyboardBuilder) -> anyhow::Result<()> {
    let attrs = KeyboardSpec::deserialize(doc).context("keyboard attributes")?;
    builder.keyboard_attributes(&attrs)?;

    let rows = match doc.get("rows") {
        None => return Ok(()),
        Some(rows) => rows
            .as_array()
            .ok_or_else(|| anyhow!("`rows` must be an array"))?,
    };
    for (r, row) in rows.iter().enumerate() {
        let spec = RowSpec::deserialize(row).with_context(|| format!("row {r}"))?;
        if !builder.begin_row(&spec).with_context(|| format!("row {r}"))? {
            continue;
        }
        let keys = match row.get("keys") {
            None => continue,
            Some(keys) => keys
                .as_array()
                .ok_or_else(|| anyhow!("row {r}: `keys` must be an array"))?,
        };
        for (k, key) in keys.iter().enumerate() {
            let spec = KeySpec::deserialize(key).with_context(|| format!("row {r} key {k}"))?;
            builder
                .add_key(&spec)
                .with_context(|| format!("row {r} key {k}"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_resolve_against_base() {
        assert_eq!(Dimension::Pixels(12).resolve(500).unwrap(), 12);
        assert_eq!(Dimension::Relative("10%".into()).resolve(480).unwrap(), 48);
        assert!(Dimension::Relative("wide".into()).resolve(480).is_err());
    }

    #[test]
    fn csv_codes_parse() {
        assert_eq!(Codes::Csv("97, 65".into()).to_vec().unwrap(), vec![97, 65]);
        assert!(Codes::Csv("97,x".into()).to_vec().is_err());
    }

    #[test]
    fn key_x_includes_gap_and_rows_advance() {
        let mut b = KeyboardBuilder::new(400, 800).with_metrics(KeyMetrics {
            width: 40,
            height: 60,
            horizontal_gap: 4,
            vertical_gap: 6,
        });
        b.begin_row(&RowSpec::default()).unwrap();
        b.add_key(&KeySpec::labeled("a")).unwrap();
        b.add_key(&KeySpec::labeled("b")).unwrap();
        b.begin_row(&RowSpec::default()).unwrap();
        b.add_key(&KeySpec::labeled("c")).unwrap();
        let kb = b.build();

        assert_eq!(kb.keys()[0].x, 4);
        assert_eq!(kb.keys()[1].x, 48);
        assert_eq!(kb.keys()[2].y, 66);
        assert_eq!(kb.width(), 88);
        assert_eq!(kb.height(), 66 * 2 - 6);
        assert_eq!(kb.keys()[1].primary_code(), 'b' as i32);
    }

    #[test]
    fn special_keys_are_tracked() {
        let mut b = KeyboardBuilder::new(400, 800);
        b.begin_row(&RowSpec::default()).unwrap();
        let s1 = b.add_key(&KeySpec::code(KEYCODE_SHIFT, "⇧")).unwrap();
        let s2 = b.add_key(&KeySpec::code(KEYCODE_SHIFT, "⇧")).unwrap();
        b.add_key(&KeySpec::code(KEYCODE_SPACE, "space")).unwrap();
        b.add_key(&KeySpec::code(KEYCODE_DONE, "done")).unwrap();
        let mut kb = b.build();

        assert_eq!(kb.shift_key_indices().collect::<Vec<_>>(), vec![s1, s2]);
        assert_eq!(kb.modifier_keys(), &[s1, s2]);
        assert!(!kb.set_space_key_label("SPACE"), "case-only change is not a change");
        assert!(kb.set_enter_key_label("go"));
        assert!(!kb.set_mode_change_key_label("?123"), "no mode-change key");
        assert!(kb.set_shifted(true));
        assert!(kb.keys()[s1].on && kb.keys()[s2].on);
        assert!(!kb.set_shifted(true));
    }

    #[test]
    fn rows_of_other_modes_are_skipped() {
        let mut b = KeyboardBuilder::new(400, 800).with_mode(1);
        let other = RowSpec {
            keyboard_mode: 2,
            ..Default::default()
        };
        assert!(!b.begin_row(&other).unwrap());
        assert!(b.add_key(&KeySpec::labeled("x")).is_err());
    }

    #[test]
    fn key_without_codes_or_label_is_rejected() {
        let mut b = KeyboardBuilder::new(400, 800);
        b.begin_row(&RowSpec::default()).unwrap();
        assert!(b.add_key(&KeySpec::default()).is_err());
    }
}
