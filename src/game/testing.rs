//! 测试辅助：脚本化的规则引擎与虚拟时间调度器。

use std::collections::VecDeque;

use super::controller::MatchController;
use super::pacing::{Scheduler, Ticket};
use super::rules::{MatchError, RulesEngine};
use super::state::{Board, MatchState, TurnEvent};

pub(crate) struct ScriptedRules {
    opening: MatchState,
    hops: VecDeque<TurnEvent>,
    forever: Option<TurnEvent>,
    candidates: Vec<usize>,
    requests: Vec<usize>,
}

impl ScriptedRules {
    pub(crate) fn new(opening: MatchState) -> Self {
        Self {
            opening,
            hops: VecDeque::new(),
            forever: None,
            candidates: vec![6],
            requests: Vec::new(),
        }
    }

    pub(crate) fn with_hops(mut self, hops: Vec<TurnEvent>) -> Self {
        self.hops.extend(hops);
        self
    }

    pub(crate) fn relaying_forever(mut self, event: TurnEvent) -> Self {
        self.forever = Some(event);
        self
    }

    pub(crate) fn with_candidates(mut self, candidates: Vec<usize>) -> Self {
        self.candidates = candidates;
        self
    }

    pub(crate) fn push_hops(&mut self, hops: Vec<TurnEvent>) {
        self.hops.extend(hops);
    }

    pub(crate) fn requests(&self) -> &[usize] {
        &self.requests
    }
}

impl RulesEngine for ScriptedRules {
    fn start(&mut self) -> Result<MatchState, MatchError> {
        Ok(self.opening.clone())
    }

    fn next_turn(&mut self, hole: usize, _state: &MatchState) -> Result<TurnEvent, MatchError> {
        self.requests.push(hole);
        self.hops
            .pop_front()
            .or_else(|| self.forever.clone())
            .ok_or_else(|| MatchError::bridge("script exhausted"))
    }

    fn pc_choice(&mut self, _board: &Board) -> Result<Vec<usize>, MatchError> {
        Ok(self.candidates.clone())
    }
}

enum Fire {
    Wake(Ticket),
    Tick,
}

/// 以毫秒为单位的虚拟时钟。唤醒按到期时间先后触发，同一时刻唤醒先于节拍。
#[derive(Debug, Default)]
pub(crate) struct VirtualScheduler {
    pub(crate) now: u64,
    wakes: Vec<(u64, Ticket)>,
    interval: Option<(u32, u64)>,
    pub(crate) intervals_started: u32,
    pub(crate) intervals_cancelled: u32,
}

impl VirtualScheduler {
    pub(crate) fn interval_active(&self) -> bool {
        self.interval.is_some()
    }

    fn pop_next(&mut self, until: u64) -> Option<Fire> {
        let wake = self
            .wakes
            .iter()
            .enumerate()
            .min_by_key(|(order, (due, _))| (*due, *order))
            .map(|(position, &(due, ticket))| (position, due, ticket));
        let tick = self.interval.map(|(_, due)| due);

        match (wake, tick) {
            (Some((position, due, ticket)), tick)
                if due <= until && tick.map_or(true, |tick| due <= tick) =>
            {
                self.wakes.remove(position);
                self.now = due;
                Some(Fire::Wake(ticket))
            }
            (_, Some(due)) if due <= until => {
                if let Some((period, next)) = self.interval.as_mut() {
                    *next = due + u64::from(*period);
                }
                self.now = due;
                Some(Fire::Tick)
            }
            _ => None,
        }
    }
}

impl Scheduler for VirtualScheduler {
    fn wake_after(&mut self, delay_ms: u32, ticket: Ticket) {
        self.wakes.push((self.now + u64::from(delay_ms), ticket));
    }

    fn start_interval(&mut self, period_ms: u32) {
        self.intervals_started += 1;
        self.interval = Some((period_ms, self.now + u64::from(period_ms)));
    }

    fn cancel_interval(&mut self) {
        if self.interval.take().is_some() {
            self.intervals_cancelled += 1;
        }
    }
}

/// 推进虚拟时间，依次触发到期的唤醒与节拍，返回途中产生的错误。
pub(crate) fn advance<R: RulesEngine>(
    controller: &mut MatchController<R, VirtualScheduler>,
    ms: u64,
) -> Vec<MatchError> {
    let until = controller.scheduler().now + ms;
    let mut errors = Vec::new();
    while let Some(fire) = controller.scheduler_mut().pop_next(until) {
        let outcome = match fire {
            Fire::Wake(ticket) => controller.on_wake(ticket),
            Fire::Tick => controller.on_tick(),
        };
        if let Err(error) = outcome {
            errors.push(error);
        }
    }
    controller.scheduler_mut().now = until;
    errors
}
