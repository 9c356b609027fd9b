//! 控制器持有的对局会话：状态、计时器以及界面需要观察的临时标志。

use super::clock::Countdown;
use super::state::{HoleRef, MatchEvent, MatchState, Side};

#[derive(Debug, Clone)]
pub struct MatchSession {
    pub state: MatchState,
    pub clock: Countdown,
    initial_seeds: u32,
    in_hand: [u8; 2],
    capture_flash: bool,
    last_changed: Option<HoleRef>,
    events: Vec<MatchEvent>,
}

impl MatchSession {
    pub fn new(period_ms: u32) -> Self {
        let state = MatchState::opening(Side::Human);
        Self {
            initial_seeds: state.seed_total(),
            state,
            clock: Countdown::new(period_ms),
            in_hand: [0; 2],
            capture_flash: false,
            last_changed: None,
            events: Vec::new(),
        }
    }

    /// 载入新对局并记住种子总数，之后每个回合都以此核对。
    pub fn begin(&mut self, state: MatchState) {
        self.initial_seeds = state.seed_total();
        self.state = state;
        self.reset_markers();
    }

    pub fn reset_markers(&mut self) {
        self.in_hand = [0; 2];
        self.capture_flash = false;
        self.last_changed = None;
    }

    pub fn initial_seeds(&self) -> u32 {
        self.initial_seeds
    }

    pub fn in_hand(&self, side: Side) -> u8 {
        self.in_hand[slot(side)]
    }

    pub fn pick_up(&mut self, side: Side, seeds: u8) {
        self.in_hand[slot(side)] = seeds;
    }

    pub fn drop_one(&mut self, side: Side) {
        let hand = &mut self.in_hand[slot(side)];
        *hand = hand.saturating_sub(1);
    }

    pub fn capture_flash(&self) -> bool {
        self.capture_flash
    }

    pub fn flash_capture(&mut self) {
        self.capture_flash = true;
    }

    pub fn last_changed(&self) -> Option<HoleRef> {
        self.last_changed
    }

    pub fn mark_changed(&mut self, index: usize, seeds: u8) {
        self.last_changed = HoleRef::from_index(index);
        self.record(MatchEvent::HoleChanged {
            index,
            seeds,
            hole: self
                .last_changed
                .map(|hole| hole.code())
                .unwrap_or_default(),
        });
    }

    pub fn end_turn_markers(&mut self) {
        self.capture_flash = false;
        self.last_changed = None;
    }

    pub fn record(&mut self, event: MatchEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }
}

fn slot(side: Side) -> usize {
    match side {
        Side::Human => 0,
        Side::Machine => 1,
    }
}
