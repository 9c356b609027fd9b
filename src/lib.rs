pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::callback::Interval;
use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::js_sys::Function;

pub use ai::{MachineChoice, MachinePlayer};
pub use game::{
    check_termination, Board, Countdown, DifficultyLevel, HoleClick, HoleRef, IntegrityError,
    MatchConfig, MatchController, MatchError, MatchEvent, MatchPhase, MatchResult, MatchSession,
    MatchSnapshot, MatchState, Player, RulesEngine, Scheduler, Side, SowStep, SweepRule, Task,
    TaskQueue, Ticket, TurnEvent, TurnResolver, Winner,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::init_logging(log::LevelFilter::Info);
}

#[wasm_bindgen]
extern "C" {
    /// JS 侧规则引擎，需提供 `start()`、`next_turn(index, game)` 与 `pc_choice(holes)`。
    pub type JsRulesEngine;

    #[wasm_bindgen(method, catch, js_name = start)]
    fn js_start(this: &JsRulesEngine) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = next_turn)]
    fn js_next_turn(this: &JsRulesEngine, hole: u32, game: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = pc_choice)]
    fn js_pc_choice(this: &JsRulesEngine, holes: &[u8]) -> Result<JsValue, JsValue>;
}

fn js_bridge_error(error: JsValue) -> MatchError {
    MatchError::bridge(error.as_string().unwrap_or_else(|| format!("{error:?}")))
}

impl RulesEngine for JsRulesEngine {
    fn start(&mut self) -> Result<MatchState, MatchError> {
        let game = self.js_start().map_err(js_bridge_error)?;
        from_value(game).map_err(MatchError::bridge)
    }

    fn next_turn(&mut self, hole: usize, state: &MatchState) -> Result<TurnEvent, MatchError> {
        let game = to_value(state).map_err(MatchError::bridge)?;
        let event = self
            .js_next_turn(hole as u32, game)
            .map_err(js_bridge_error)?;
        from_value(event).map_err(MatchError::bridge)
    }

    fn pc_choice(&mut self, board: &Board) -> Result<Vec<usize>, MatchError> {
        let indexes = self.js_pc_choice(board.holes()).map_err(js_bridge_error)?;
        let indexes: Vec<u32> = from_value(indexes).map_err(MatchError::bridge)?;
        Ok(indexes.into_iter().map(|index| index as usize).collect())
    }
}

fn to_js_error(error: MatchError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// 浏览器计时器：节奏延时用 `TimeoutFuture`，回合倒计时用 `Interval`（drop 即取消）。
struct BrowserScheduler {
    host: Weak<MatchHost>,
    interval: Option<Interval>,
}

impl BrowserScheduler {
    fn new(host: Weak<MatchHost>) -> Self {
        Self {
            host,
            interval: None,
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn wake_after(&mut self, delay_ms: u32, ticket: Ticket) {
        let host = self.host.clone();
        spawn_local(async move {
            TimeoutFuture::new(delay_ms).await;
            if let Some(host) = host.upgrade() {
                host.wake(ticket);
            }
        });
    }

    fn start_interval(&mut self, period_ms: u32) {
        let host = self.host.clone();
        self.interval = Some(Interval::new(period_ms, move || {
            if let Some(host) = host.upgrade() {
                host.tick();
            }
        }));
    }

    fn cancel_interval(&mut self) {
        self.interval = None;
    }
}

#[derive(Serialize)]
struct MatchUpdate {
    events: Vec<MatchEvent>,
    snapshot: MatchSnapshot,
}

struct MatchHost {
    controller: RefCell<MatchController<JsRulesEngine, BrowserScheduler>>,
    listener: RefCell<Option<Function>>,
}

impl MatchHost {
    fn wake(&self, ticket: Ticket) {
        let outcome = self.controller.borrow_mut().on_wake(ticket);
        self.report(outcome);
    }

    fn tick(&self) {
        let outcome = self.controller.borrow_mut().on_tick();
        self.report(outcome);
    }

    fn report(&self, outcome: Result<(), MatchError>) {
        if let Err(error) = outcome {
            log::warn!("timer callback failed: {error}");
        }
        self.publish();
    }

    /// 把新事件和快照推给界面。调用 JS 之前释放控制器的借用。
    fn publish(&self) {
        let update = {
            let mut controller = self.controller.borrow_mut();
            MatchUpdate {
                events: controller.drain_events(),
                snapshot: controller.snapshot(),
            }
        };
        let Some(listener) = self.listener.borrow().clone() else {
            return;
        };
        match to_value(&update) {
            Ok(payload) => {
                if let Err(error) = listener.call1(&JsValue::NULL, &payload) {
                    log::warn!("match listener threw: {error:?}");
                }
            }
            Err(error) => log::error!("failed to serialize match update: {error}"),
        }
    }
}

#[wasm_bindgen]
pub struct AwaleMatch {
    host: Rc<MatchHost>,
}

#[wasm_bindgen]
impl AwaleMatch {
    #[wasm_bindgen(constructor)]
    pub fn new(engine: JsRulesEngine, level: Option<String>) -> AwaleMatch {
        let level = level
            .as_deref()
            .and_then(|value| DifficultyLevel::from_str(value).ok())
            .unwrap_or_default();
        let config = MatchConfig::from_difficulty(level);
        let host = Rc::new_cyclic(|weak| MatchHost {
            controller: RefCell::new(MatchController::new(
                config,
                engine,
                BrowserScheduler::new(weak.clone()),
            )),
            listener: RefCell::new(None),
        });
        AwaleMatch { host }
    }

    /// 每次状态变化都会以 `{ events, snapshot }` 调用监听函数。
    pub fn set_listener(&self, listener: Option<Function>) {
        *self.host.listener.borrow_mut() = listener;
    }

    pub fn set_level(&self, level: &str) -> Result<(), JsValue> {
        let level = DifficultyLevel::from_str(level)
            .map_err(|_| JsValue::from_str(&format!("unknown difficulty level: {level}")))?;
        let mut controller = self.host.controller.borrow_mut();
        let config = MatchConfig {
            level,
            ..controller.config().clone()
        };
        controller.set_config(config);
        Ok(())
    }

    pub fn config_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.host.controller.borrow().config()).map_err(serde_to_js_error)
    }

    pub fn set_config_json(&self, json: &str) -> Result<(), JsValue> {
        let config: MatchConfig = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.host.controller.borrow_mut().set_config(config);
        Ok(())
    }

    pub fn start(&self) {
        self.host.controller.borrow_mut().start();
        self.host.publish();
    }

    /// 界面点击：`slot` 为行内位置，`user` 表示玩家一行。
    pub fn choose(&self, slot: u8, user: bool) -> Result<(), JsValue> {
        let outcome = self
            .host
            .controller
            .borrow_mut()
            .submit_move(HoleClick::from_row(slot, user));
        self.host.publish();
        outcome.map_err(to_js_error)
    }

    pub fn abandon(&self) {
        self.host.controller.borrow_mut().abandon();
        self.host.publish();
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.host.controller.borrow().snapshot()).map_err(JsValue::from)
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.host.controller.borrow().snapshot())
            .map_err(serde_to_js_error)
    }

    pub fn result(&self) -> Result<JsValue, JsValue> {
        to_value(&self.host.controller.borrow().result()).map_err(JsValue::from)
    }
}

#[derive(Serialize)]
struct LevelInfo {
    level: DifficultyLevel,
    tick_ms: u32,
    human_deadline_ms: u64,
}

/// 可选难度及其节拍。
#[wasm_bindgen(js_name = "difficultyLevels")]
pub fn difficulty_levels() -> Result<JsValue, JsValue> {
    let levels: Vec<LevelInfo> = DifficultyLevel::ALL
        .iter()
        .map(|&level| LevelInfo {
            level,
            tick_ms: level.tick_ms(),
            human_deadline_ms: Countdown::new(level.tick_ms()).human_deadline_ms(),
        })
        .collect();
    to_value(&levels).map_err(JsValue::from)
}
