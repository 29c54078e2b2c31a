use softkey_core::{
    load_layout_str, HitTester, Key, Keyboard, KeyboardActionListener, TouchAction,
    TouchDispatcher, TouchEvent,
};

const LAYOUT: &str = r#"{
  "key_width": 30,
  "key_height": 40,
  "rows": [
    { "keys": [
        { "label": "q", "edge_flags": "LEFT" },
        { "label": "w" }, { "label": "e", "popup_characters": "éè" },
        { "label": "r" }, { "label": "t" }, { "label": "y" }, { "label": "u" },
        { "label": "i" }, { "label": "o" },
        { "label": "p", "edge_flags": "RIGHT" }
    ] },
    { "keys": [
        { "codes": -1, "label": "shift", "width": "20%", "sticky": true },
        { "codes": "44", "label": "," },
        { "codes": -5, "label": "del", "repeatable": true },
        { "codes": 10, "label": "enter", "width": 60 }
    ] }
  ]
}"#;

fn keyboard() -> Keyboard {
    load_layout_str(LAYOUT, 300, 400, 0).unwrap()
}

#[derive(Default)]
struct Log {
    keys: Vec<(i32, Vec<i32>)>,
    releases: Vec<i32>,
}

impl KeyboardActionListener for Log {
    fn on_press(&mut self, _code: i32) {}
    fn on_release(&mut self, code: i32) {
        self.releases.push(code);
    }
    fn on_key(&mut self, code: i32, codes: &[i32], _has_popup: bool) {
        self.keys.push((code, codes.to_vec()));
    }
    fn on_text(&mut self, _text: &str) {}
    fn on_long_press(&mut self, _key: &Key) -> bool {
        false
    }
}

fn tap(d: &mut TouchDispatcher, log: &mut Log, x: f32, y: f32, t: u64) {
    d.on_touch_event(TouchEvent::new(TouchAction::Down, x, y, t), log);
    d.on_touch_event(TouchEvent::new(TouchAction::Up, x, y, t + 40), log);
}

#[test]
fn layout_loads_rows_and_special_keys() {
    let kb = keyboard();
    assert!(kb.load_error().is_none());
    assert_eq!(kb.rows().len(), 2);
    assert_eq!(kb.keys().len(), 14);
    assert_eq!(kb.width(), 300);
    assert_eq!(kb.height(), 80);
    assert_eq!(kb.keys()[10].width, 60, "20% of a 300px display");
    assert_eq!(kb.keys()[11].primary_code(), ',' as i32);
    assert_eq!(kb.shift_key_indices().collect::<Vec<_>>(), vec![10]);
}

#[test]
fn proximity_reports_neighbours_nearest_first() {
    let kb = keyboard();
    let tester = HitTester::for_keyboard(&kb, true);
    // Mean key size is about 31px, so the radius is about 43px.
    assert!((42 * 42..=44 * 44).contains(&tester.threshold()));

    let hit = tester.key_indices(&kb, 75, 20, true);
    assert_eq!(hit.primary, Some(2));
    // "," sits right below "e", 40px away.
    let expected: Vec<i32> = "ewr,".chars().map(|c| c as i32).collect();
    assert_eq!(hit.alternates, expected);

    let hit = tester.key_indices(&kb, 80, 20, true);
    let expected: Vec<i32> = "erw,".chars().map(|c| c as i32).collect();
    assert_eq!(hit.alternates, expected);
}

#[test]
fn without_correction_only_the_containing_key_counts() {
    let kb = keyboard();
    let tester = HitTester::for_keyboard(&kb, false);
    let hit = tester.key_indices(&kb, 75, 20, true);
    assert_eq!(hit.alternates, vec!['e' as i32]);
    assert_eq!(tester.key_indices(&kb, 250, 60, true).primary, None);
}

#[test]
fn edge_keys_catch_touches_past_the_border() {
    let kb = keyboard();
    let tester = HitTester::for_keyboard(&kb, false);
    assert_eq!(tester.key_indices(&kb, -5, 20, false).primary, Some(0));
    assert_eq!(tester.key_indices(&kb, 305, 20, false).primary, Some(9));

    let tester = HitTester::for_keyboard(&kb, true);
    assert_eq!(tester.key_indices(&kb, 60_000, 20, true).primary, Some(9));
}

#[test]
fn dispatched_taps_carry_alternates() {
    let mut d = TouchDispatcher::default();
    d.set_keyboard(keyboard());
    d.set_proximity_correction(true);
    let mut log = Log::default();

    tap(&mut d, &mut log, 75.0, 20.0, 0);
    tap(&mut d, &mut log, 75.0, 60.0, 100);
    assert_eq!(log.keys[0].0, 'e' as i32);
    assert_eq!(log.keys[0].1[..3], ['e' as i32, 'w' as i32, 'r' as i32]);
    assert_eq!(log.keys[1].0, ',' as i32);
    assert_eq!(log.releases, vec!['e' as i32, ',' as i32]);
}

#[test]
fn resize_scales_wide_rows() {
    let mut kb = keyboard();
    kb.resize(150, 400);
    assert_eq!(kb.width(), 150);
    let first_row: Vec<&Key> = kb.rows()[0]
        .key_indices()
        .iter()
        .map(|&i| &kb.keys()[i])
        .collect();
    assert!(first_row.iter().all(|k| k.width == 15));
    let last = first_row[first_row.len() - 1];
    assert!(last.x + last.width <= 150);
    assert_eq!(kb.keys()[0].y, 0, "vertical placement is unchanged");
}

#[test]
fn malformed_key_keeps_earlier_rows() {
    let broken = r#"{
      "key_width": 30, "key_height": 40,
      "rows": [
        { "keys": [ { "label": "a" }, { "label": "b" } ] },
        { "keys": [ { "codes": "1,x", "label": "?" }, { "label": "c" } ] }
      ]
    }"#;
    let kb = load_layout_str(broken, 300, 400, 0).unwrap();
    assert_eq!(kb.keys().len(), 2);
    let err = kb.load_error().unwrap();
    assert!(err.contains("row 1 key 0"), "{err}");

    assert!(load_layout_str("[1, 2]", 300, 400, 0).is_err());
}

#[test]
fn rows_for_other_modes_are_dropped() {
    let layout = r#"{
      "rows": [
        { "keys": [ { "label": "a" } ] },
        { "keyboard_mode": 2, "keys": [ { "label": "b" } ] },
        { "keyboard_mode": 1, "keys": [ { "label": "c" } ] }
      ]
    }"#;
    let kb = load_layout_str(layout, 300, 400, 1).unwrap();
    let labels: Vec<&str> = kb
        .keys()
        .iter()
        .filter_map(|k| k.label.as_deref())
        .collect();
    assert_eq!(labels, vec!["a", "c"]);
}
