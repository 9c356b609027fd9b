//! 浏览器内冒烟测试：`wasm-pack test --headless --firefox`。

#![cfg(target_arch = "wasm32")]

use awale_match::{difficulty_levels, utils, DifficultyLevel, MatchConfig};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn logging_can_be_installed_twice() {
    utils::init_logging(log::LevelFilter::Debug);
    utils::init_logging(log::LevelFilter::Warn);
    log::info!("console logger installed");
}

#[wasm_bindgen_test]
fn levels_are_exposed_to_javascript() {
    let levels = difficulty_levels().expect("levels should convert");
    let array = web_sys::js_sys::Array::from(&levels);
    assert_eq!(array.length(), DifficultyLevel::ALL.len() as u32);
}

#[wasm_bindgen_test]
fn config_round_trips_through_json() {
    let config = MatchConfig::from_difficulty(DifficultyLevel::Intermediate);
    let json = serde_json::to_string(&config).expect("config should serialize");
    let parsed: MatchConfig = serde_json::from_str(&json).expect("config should parse");
    assert_eq!(parsed, config);
}
