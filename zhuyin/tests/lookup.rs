use std::sync::Arc;

use softkey_core::{DictRow, ImeSession, MemoryDictionary, SharedStore};
use softkey_zhuyin::{Action, Composer, ZhuyinComposer, ZhuyinConfig};

fn words() -> SharedStore {
    let mut dict = MemoryDictionary::new();
    // ㄋㄧ (1630) with tones, plus a longer code sharing the prefix.
    dict.extend(
        "words_16",
        vec![
            DictRow::new("163042", "你", 90),
            DictRow::new("163042", "擬", 10),
            DictRow::new("1630", "妮", 50),
            DictRow::new("163041", "泥", 40),
            DictRow::new("163028", "年", 80),
            DictRow::new("1630", "妮", 20),
        ],
    );
    dict.insert("words_12", DictRow::new("1220", "媽|嗎", 60));
    Arc::new(dict)
}

fn phrases() -> SharedStore {
    let mut dict = MemoryDictionary::new();
    dict.insert("phrases_16", DictRow::new("16304242", "你好", 30));
    Arc::new(dict)
}

fn values(result: &softkey_core::CandidatesResult) -> Vec<&str> {
    result.values().collect()
}

#[test]
fn marked_tone_queries_exact_code_only() {
    let mut composer = ZhuyinComposer::new(Some(words()), None);
    let result = composer.candidates("ㄋㄧˇ").unwrap();
    assert_eq!(values(&result), vec!["你", "擬"]);
    assert_eq!(result.action, Action::ShowCandidates);
    assert_eq!(result.first().unwrap().code, "163042");
}

#[test]
fn toneless_input_adds_rough_matches_and_phrases() {
    let mut composer = ZhuyinComposer::new(Some(words()), Some(phrases()));
    let result = composer.candidates("ㄋㄧ").unwrap();
    // Exact first (distinct values), then longer codes by frequency, then phrases.
    assert_eq!(values(&result), vec!["妮", "你", "年", "泥", "擬", "你好"]);
}

#[test]
fn first_tone_is_not_part_of_the_stored_code() {
    let mut composer = ZhuyinComposer::new(Some(words()), None);
    let spaced = composer.candidates("ㄇㄚ ").unwrap();
    assert_eq!(values(&spaced), vec!["媽", "嗎"]);
    assert_eq!(spaced.composing, "ㄇㄚˉ");
    let marked = composer.candidates("ㄇㄚˉ").unwrap();
    assert_eq!(marked.words, spaced.words);
}

#[test]
fn shared_limit_caps_all_queries() {
    let config = ZhuyinConfig {
        word_limit: 2,
        ..ZhuyinConfig::default()
    };
    let mut composer = ZhuyinComposer::with_config(Some(words()), Some(phrases()), &config);
    let result = composer.candidates("ㄋㄧ").unwrap();
    assert_eq!(values(&result), vec!["妮", "你"]);
}

#[test]
fn trailing_punctuation_commits_best_display() {
    let mut composer = ZhuyinComposer::new(Some(words()), None);
    let result = composer.candidates("ㄋㄧˇ，").unwrap();
    assert_eq!(result.action, Action::AutoCompose);
    assert_eq!(values(&result), vec!["你，"]);
    assert_eq!(result.composing, "ㄋㄧˇ，");
}

#[test]
fn lookups_are_cached_by_code() {
    let mut composer = ZhuyinComposer::new(Some(words()), None);
    composer.candidates("ㄋㄧˇ").unwrap();
    composer.candidates("ㄋㄧˇ").unwrap();
    assert_eq!(composer.keymaps().loads(), 1);
    assert!(composer.candidates("   ").is_none());
}

#[test]
fn session_auto_composes_on_punctuation() {
    let mut session = ImeSession::new(ZhuyinComposer::new(Some(words()), None));
    for ch in "ㄋㄧˇ".chars() {
        session.type_char(ch);
    }
    assert_eq!(session.context().candidates[0].value, "你");
    session.type_char('，');
    assert_eq!(session.context_mut().take_commit(), "你，");
    assert!(session.buffer().is_empty());
    assert!(!session.context().has_visible_state());
}

#[test]
fn accessors() {
    let composer = ZhuyinComposer::new(None, None);
    assert_eq!(composer.locale(), "zh_TW");
    assert_eq!(composer.domains().last().map(String::as_str), Some(".tw"));
    assert_eq!(composer.title(), "注音");
}
