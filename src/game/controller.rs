//! 对局控制器：开局、接收落子、认输、超时与终局判定。

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::clock::TickOutcome;
use super::config::{DifficultyLevel, MatchConfig, SweepRule};
use super::pacing::{Scheduler, Task, TaskQueue, Ticket};
use super::resolver::{HopOutcome, StepOutcome, TurnResolver};
use super::rules::{MatchError, RulesEngine};
use super::session::MatchSession;
use super::state::{
    HoleClick, MatchEvent, MatchResult, MatchState, Side, Winner, HOLE_COUNT,
};
use crate::ai::MachinePlayer;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchPhase {
    Idle,
    Starting,
    Playing,
    Finished,
    Abandoned,
    Faulted,
}

/// 供界面渲染的只读快照。
#[derive(Debug, Clone, Serialize)]
pub struct MatchSnapshot {
    pub phase: MatchPhase,
    pub level: DifficultyLevel,
    pub state: MatchState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<Side>,
    pub human_load: f64,
    pub machine_load: f64,
    pub human_in_hand: u8,
    pub machine_in_hand: u8,
    pub capture_flash: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<String>,
    pub result: MatchResult,
}

pub struct MatchController<R, S> {
    config: MatchConfig,
    rules: R,
    scheduler: S,
    session: MatchSession,
    tasks: TaskQueue,
    resolver: Option<TurnResolver>,
    machine: MachinePlayer,
    phase: MatchPhase,
    result: MatchResult,
}

impl<R: RulesEngine, S: Scheduler> MatchController<R, S> {
    pub fn new(config: MatchConfig, rules: R, scheduler: S) -> Self {
        Self {
            session: MatchSession::new(config.tick_ms()),
            config,
            rules,
            scheduler,
            tasks: TaskQueue::new(),
            resolver: None,
            machine: MachinePlayer::new(),
            phase: MatchPhase::Idle,
            result: MatchResult::ongoing(),
        }
    }

    pub fn with_machine(mut self, machine: MachinePlayer) -> Self {
        self.machine = machine;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// 新配置在下一次 `start` 时完全生效。
    pub fn set_config(&mut self, config: MatchConfig) {
        self.config = config;
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn result(&self) -> MatchResult {
        self.result
    }

    pub fn state(&self) -> &MatchState {
        &self.session.state
    }

    pub fn session(&self) -> &MatchSession {
        &self.session
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut R {
        &mut self.rules
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn pending_task(&self) -> Option<Task> {
        self.tasks.pending()
    }

    pub fn is_resolving(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, MatchPhase::Finished | MatchPhase::Abandoned)
    }

    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        self.session.drain_events()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let session = &self.session;
        MatchSnapshot {
            phase: self.phase,
            level: self.config.level,
            state: session.state.clone(),
            turn: session.state.active_side(),
            human_load: session.clock.human_progress(),
            machine_load: session.clock.machine_progress(),
            human_in_hand: session.in_hand(Side::Human),
            machine_in_hand: session.in_hand(Side::Machine),
            capture_flash: session.capture_flash(),
            last_changed: session.last_changed().map(|hole| hole.code()),
            result: self.result,
        }
    }

    /// 重置临时标志，延时后向规则引擎领取新对局。
    pub fn start(&mut self) {
        self.halt_timers();
        self.resolver = None;
        self.session.reset_markers();
        self.session.drain_events();
        self.session.clock.set_period(self.config.tick_ms());
        self.phase = MatchPhase::Starting;
        self.result = MatchResult::ongoing();
        info!("starting a match at {:?}", self.config.level);
        self.tasks
            .defer(&mut self.scheduler, Task::Begin, self.config.start_delay_ms);
    }

    pub fn submit_move(&mut self, click: HoleClick) -> Result<(), MatchError> {
        let index = self
            .ensure_human_may_move()
            .and_then(|()| {
                click
                    .board_index()
                    .ok_or(MatchError::SlotOutOfRange { slot: click.slot })
            })
            .map_err(|error| {
                warn!("click on slot {} rejected: {error}", click.slot);
                error
            })?;
        self.submit_hole(index)
    }

    /// 玩家落子；被拒绝时对局状态保持不变。
    pub fn submit_hole(&mut self, index: usize) -> Result<(), MatchError> {
        if let Err(error) = self.validate_human_move(index) {
            warn!("move on hole {index} rejected: {error}");
            return Err(error);
        }
        self.begin_turn(Side::Human, index);
        Ok(())
    }

    /// 认输：无论比分如何都判电脑获胜，并中断正在进行的回合。
    /// 只对开局中或进行中的对局生效，已结束的结果不会被改写。
    pub fn abandon(&mut self) {
        if !matches!(self.phase, MatchPhase::Starting | MatchPhase::Playing) {
            debug!("abandon ignored in phase {:?}", self.phase);
            return;
        }
        self.halt_timers();
        self.resolver = None;
        self.phase = MatchPhase::Abandoned;
        self.result = MatchResult::decided(Winner::Machine);
        self.session.end_turn_markers();
        self.session.record(MatchEvent::MatchAbandoned);
        info!("match abandoned");
    }

    pub fn on_tick(&mut self) -> Result<(), MatchError> {
        if self.phase != MatchPhase::Playing {
            return Ok(());
        }

        let turn = self.session.state.active_side();
        match self.session.clock.tick(&mut self.scheduler, turn) {
            TickOutcome::Idle | TickOutcome::Counting => {}
            TickOutcome::HumanTimedOut => {
                info!("human ran out of time, the machine takes the turn");
                self.session
                    .record(MatchEvent::TurnTimedOut { side: Side::Human });
                self.session.state.give_turn(Side::Machine);
                self.session.record(MatchEvent::TurnPassed { to: Side::Machine });
                self.defer_machine();
            }
            TickOutcome::MachineTimedOut => {
                debug!("machine thinking time elapsed, turn returns to the human");
                self.session
                    .record(MatchEvent::TurnTimedOut { side: Side::Machine });
                self.session.state.give_turn(Side::Human);
                self.session.record(MatchEvent::TurnPassed { to: Side::Human });
            }
        }
        Ok(())
    }

    pub fn on_wake(&mut self, ticket: Ticket) -> Result<(), MatchError> {
        let Some(task) = self.tasks.take_due(&mut self.scheduler, ticket) else {
            debug!("ignoring stale wake-up {ticket}");
            return Ok(());
        };

        let outcome = self.run(task);
        if let Err(error) = &outcome {
            if error.is_fatal() {
                self.fault(error);
            }
        }
        outcome
    }

    fn run(&mut self, task: Task) -> Result<(), MatchError> {
        match task {
            Task::Begin => self.begin_match(),
            Task::RequestHop => self.request_hop(),
            Task::ApplyStep => {
                self.apply_step();
                Ok(())
            }
            Task::FinishHop => self.finish_hop(),
            Task::DispatchMachine => self.dispatch_machine(),
        }
    }

    fn validate_human_move(&self, index: usize) -> Result<(), MatchError> {
        self.ensure_human_may_move()?;
        if index >= HOLE_COUNT {
            return Err(MatchError::HoleOutOfRange { index });
        }
        if !Side::Human.owns(index) {
            return Err(MatchError::OpponentHole { index });
        }
        if self.session.state.holes[index] == 0 {
            return Err(MatchError::EmptyHole { index });
        }
        Ok(())
    }

    fn ensure_human_may_move(&self) -> Result<(), MatchError> {
        match self.phase {
            MatchPhase::Playing => {}
            MatchPhase::Finished | MatchPhase::Abandoned => return Err(MatchError::MatchFinished),
            MatchPhase::Idle | MatchPhase::Starting | MatchPhase::Faulted => {
                return Err(MatchError::NotStarted)
            }
        }
        if self.resolver.is_some() {
            return Err(MatchError::TurnInProgress);
        }
        if !self.session.state.holds_turn(Side::Human) {
            return Err(MatchError::NotHumanTurn);
        }
        Ok(())
    }

    fn begin_match(&mut self) -> Result<(), MatchError> {
        let state = self.rules.start()?;
        state.integrity_check(None)?;
        let first = if state.machine.turn {
            Side::Machine
        } else {
            Side::Human
        };

        self.session.begin(state);
        self.phase = MatchPhase::Playing;
        self.session.record(MatchEvent::MatchStarted {
            first,
            seeds: self.session.initial_seeds(),
        });
        info!("match started, {first:?} moves first");

        if first == Side::Machine {
            self.defer_machine();
        }
        self.session.clock.start(&mut self.scheduler);
        Ok(())
    }

    fn begin_turn(&mut self, side: Side, index: usize) {
        self.session.clock.stop(&mut self.scheduler);
        let resolver = TurnResolver::new(side, index, self.config.max_relay_hops);
        resolver.pick_up(&mut self.session);
        self.resolver = Some(resolver);
        debug!("{side:?} plays hole {index}");
        self.tasks
            .defer(&mut self.scheduler, Task::RequestHop, self.config.pacing_ms);
    }

    fn request_hop(&mut self) -> Result<(), MatchError> {
        let Some(resolver) = self.resolver.as_mut() else {
            return Ok(());
        };
        resolver.request_hop(&mut self.rules, &mut self.session)?;
        // The first step of a hop lands as soon as the engine answers.
        self.apply_step();
        Ok(())
    }

    fn apply_step(&mut self) {
        let Some(resolver) = self.resolver.as_mut() else {
            return;
        };
        let next = match resolver.apply_step(&mut self.session) {
            StepOutcome::Continue => Task::ApplyStep,
            StepOutcome::HopApplied => Task::FinishHop,
        };
        self.tasks
            .defer(&mut self.scheduler, next, self.config.pacing_ms);
    }

    fn finish_hop(&mut self) -> Result<(), MatchError> {
        let Some(resolver) = self.resolver.as_mut() else {
            return Ok(());
        };
        match resolver.finish_hop(&mut self.session) {
            HopOutcome::Relay => {
                resolver.pick_up(&mut self.session);
                self.tasks
                    .defer(&mut self.scheduler, Task::RequestHop, self.config.pacing_ms);
                Ok(())
            }
            HopOutcome::TurnOver => {
                debug!("turn resolved after {} hops", resolver.hops());
                self.resolver = None;
                self.after_turn();
                Ok(())
            }
        }
    }

    fn after_turn(&mut self) {
        let expected = self.session.initial_seeds();
        if let Err(error) = self.session.state.integrity_check(Some(expected)) {
            warn!("rules engine broke a board invariant: {error}");
        }

        let result = check_termination(&mut self.session.state, self.config.sweep);
        if result.finished {
            self.halt_timers();
            self.phase = MatchPhase::Finished;
            self.result = result;
            self.session.record(MatchEvent::MatchFinished {
                result,
                human_points: self.session.state.human.points,
                machine_points: self.session.state.machine.points,
            });
            info!("match finished: {:?}", result.winner);
            return;
        }

        self.session.clock.start(&mut self.scheduler);
        if self.session.state.holds_turn(Side::Machine) {
            self.defer_machine();
        }
    }

    fn defer_machine(&mut self) {
        self.tasks.defer(
            &mut self.scheduler,
            Task::DispatchMachine,
            self.config.think_delay_ms,
        );
    }

    fn dispatch_machine(&mut self) -> Result<(), MatchError> {
        if self.phase != MatchPhase::Playing || self.resolver.is_some() {
            return Ok(());
        }
        if !self.session.state.holds_turn(Side::Machine) {
            warn!("machine lost the turn before moving, dispatch skipped");
            return Ok(());
        }

        let choice = self
            .machine
            .choose(&mut self.rules, &self.session.state.holes)?;
        self.session.record(MatchEvent::MachineChose {
            index: choice.index,
            candidates: choice.candidates,
        });
        self.begin_turn(Side::Machine, choice.index);
        Ok(())
    }

    fn fault(&mut self, cause: &MatchError) {
        error!("match halted: {cause}");
        self.halt_timers();
        self.resolver = None;
        self.phase = MatchPhase::Faulted;
        self.session.record(MatchEvent::EngineFault {
            message: cause.to_string(),
        });
    }

    fn halt_timers(&mut self) {
        self.session.clock.stop(&mut self.scheduler);
        self.tasks.clear();
    }
}

/// 终局判定：任一侧六个洞全空即结束，按规则清扫后比较得分。
pub fn check_termination(state: &mut MatchState, sweep: SweepRule) -> MatchResult {
    let human_empty = state.holes.side_is_empty(Side::Human);
    let machine_empty = state.holes.side_is_empty(Side::Machine);
    if !human_empty && !machine_empty {
        return MatchResult::ongoing();
    }

    match sweep {
        SweepRule::Observed => {
            // Sweeps the side that is already empty into the opponent's score.
            let (empty, collector) = if human_empty {
                (Side::Human, Side::Machine)
            } else {
                (Side::Machine, Side::Human)
            };
            let swept = state.holes.side_total(empty);
            state.player_mut(collector).points += swept;
        }
        SweepRule::OwnerCollects => {
            for side in [Side::Human, Side::Machine] {
                let swept = state.holes.clear_side(side);
                state.player_mut(side).points += swept;
            }
        }
    }

    let winner = match state.human.points.cmp(&state.machine.points) {
        Ordering::Greater => Winner::Human,
        Ordering::Less => Winner::Machine,
        Ordering::Equal => Winner::Tie,
    };
    MatchResult::decided(winner)
}
