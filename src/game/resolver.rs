//! 回合解析：从起始洞出发，逐跳向规则引擎请求播种结果，并逐步写回棋盘。

use log::debug;
use std::collections::VecDeque;

use super::rules::{MatchError, RulesEngine};
use super::session::MatchSession;
use super::state::{MatchEvent, Side, SowStep, HOLE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 本跳还有未写回的步骤。
    Continue,
    /// 本跳的所有步骤均已写回。
    HopApplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopOutcome {
    Relay,
    TurnOver,
}

/// 单个逻辑回合的解析状态。每次调用只推进一个原子动作，节奏由控制器的任务队列决定。
#[derive(Debug, Clone)]
pub struct TurnResolver {
    side: Side,
    cursor: usize,
    hops: u32,
    max_hops: u32,
    steps: VecDeque<SowStep>,
    applied_in_hop: usize,
    captured: u32,
    terminal: bool,
}

impl TurnResolver {
    pub fn new(side: Side, start: usize, max_hops: u32) -> Self {
        Self {
            side,
            cursor: start,
            hops: 0,
            max_hops,
            steps: VecDeque::new(),
            applied_in_hop: 0,
            captured: 0,
            terminal: false,
        }
    }

    pub fn hops(&self) -> u32 {
        self.hops
    }

    /// 拿起光标所在洞的种子（仅用于显示）。
    pub fn pick_up(&self, session: &mut MatchSession) {
        let seeds = session.state.holes.get(self.cursor).unwrap_or_default();
        session.pick_up(self.side, seeds);
    }

    pub fn request_hop<R: RulesEngine>(
        &mut self,
        rules: &mut R,
        session: &mut MatchSession,
    ) -> Result<(), MatchError> {
        if self.hops >= self.max_hops {
            return Err(MatchError::RelayLimitExceeded { hops: self.hops });
        }

        let from = self.cursor;
        let event = rules.next_turn(from, &session.state)?;
        self.hops += 1;

        let last = event
            .steps
            .last()
            .ok_or(MatchError::EmptyHop { from })?;
        if let Some(step) = event.steps.iter().find(|step| step.index >= HOLE_COUNT) {
            return Err(MatchError::StepOutOfRange { index: step.index });
        }

        debug!(
            "hop {} from hole {from}: {} steps, {} captured, terminal={}",
            self.hops,
            event.steps.len(),
            event.captured_seeds,
            event.terminal
        );

        self.cursor = last.index;
        self.steps = event.steps.into();
        self.applied_in_hop = 0;
        self.captured = event.captured_seeds;
        self.terminal = event.terminal;

        session.record(MatchEvent::HopRequested {
            side: self.side,
            from,
            hop: self.hops,
        });
        Ok(())
    }

    /// 写回本跳的下一个步骤。
    pub fn apply_step(&mut self, session: &mut MatchSession) -> StepOutcome {
        let Some(step) = self.steps.pop_front() else {
            return StepOutcome::HopApplied;
        };

        session.state.holes.set(step.index, step.seeds);
        if self.applied_in_hop > 0 {
            session.drop_one(self.side);
            if step.seeds == 0 {
                session.flash_capture();
            }
        }
        self.applied_in_hop += 1;
        session.mark_changed(step.index, step.seeds);

        if self.steps.is_empty() {
            StepOutcome::HopApplied
        } else {
            StepOutcome::Continue
        }
    }

    /// 结算本跳吃子；终止跳交换回合。
    pub fn finish_hop(&mut self, session: &mut MatchSession) -> HopOutcome {
        if self.captured > 0 {
            session.state.player_mut(self.side).points += self.captured;
            session.record(MatchEvent::SeedsCaptured {
                side: self.side,
                seeds: self.captured,
            });
            self.captured = 0;
        }

        if !self.terminal {
            return HopOutcome::Relay;
        }

        session.state.pass_turn();
        session.end_turn_markers();
        session.record(MatchEvent::TurnPassed {
            to: self.side.opponent(),
        });
        HopOutcome::TurnOver
    }
}
