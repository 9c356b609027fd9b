//! 回合倒计时：可取消的重复计时器，超时则强制交换回合。

use log::debug;

use super::pacing::Scheduler;
use super::state::Side;

/// 满载，单位为万分之一（100.00 %）。
pub const LOAD_FULL: u32 = 10_000;
/// 玩家每个节拍增加 1 %。
pub const HUMAN_LOAD_STEP: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Counting,
    HumanTimedOut,
    MachineTimedOut,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    period_ms: u32,
    human_load: u32,
    machine_load: u32,
    running: bool,
}

impl Countdown {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms: period_ms.max(1),
            human_load: 0,
            machine_load: 0,
            running: false,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// 新节拍在下一次 `start` 时生效。
    pub fn set_period(&mut self, period_ms: u32) {
        self.period_ms = period_ms.max(1);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 先取消旧计时器再启动，保证同一对局最多只有一个计时器。
    pub fn start<S: Scheduler>(&mut self, scheduler: &mut S) {
        if self.running {
            debug!("clock restarted while running, cancelling the previous timer");
        }
        self.stop(scheduler);
        self.running = true;
        scheduler.start_interval(self.period_ms);
    }

    /// 幂等：已停止时只清零进度。
    pub fn stop<S: Scheduler>(&mut self, scheduler: &mut S) {
        if self.running {
            scheduler.cancel_interval();
            self.running = false;
        }
        self.human_load = 0;
        self.machine_load = 0;
    }

    pub fn tick<S: Scheduler>(&mut self, scheduler: &mut S, turn: Option<Side>) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        match turn {
            Some(Side::Human) => {
                self.human_load += HUMAN_LOAD_STEP;
                if self.human_load >= LOAD_FULL {
                    self.stop(scheduler);
                    return TickOutcome::HumanTimedOut;
                }
                TickOutcome::Counting
            }
            Some(Side::Machine) => {
                // level / 100 % per tick: the machine bar always fills in LOAD_FULL ms.
                self.machine_load += self.period_ms;
                if self.machine_load >= LOAD_FULL {
                    self.stop(scheduler);
                    return TickOutcome::MachineTimedOut;
                }
                TickOutcome::Counting
            }
            None => TickOutcome::Idle,
        }
    }

    /// 玩家进度（百分比）。
    pub fn human_progress(&self) -> f64 {
        f64::from(self.human_load) / 100.0
    }

    pub fn machine_progress(&self) -> f64 {
        f64::from(self.machine_load) / 100.0
    }

    pub fn human_deadline_ms(&self) -> u64 {
        u64::from(LOAD_FULL.div_ceil(HUMAN_LOAD_STEP)) * u64::from(self.period_ms)
    }

    pub fn machine_deadline_ms(&self) -> u64 {
        u64::from(LOAD_FULL.div_ceil(self.period_ms)) * u64::from(self.period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pacing::Ticket;

    #[derive(Default)]
    struct IntervalProbe {
        started: Vec<u32>,
        cancelled: u32,
    }

    impl Scheduler for IntervalProbe {
        fn wake_after(&mut self, _delay_ms: u32, _ticket: Ticket) {}

        fn start_interval(&mut self, period_ms: u32) {
            self.started.push(period_ms);
        }

        fn cancel_interval(&mut self) {
            self.cancelled += 1;
        }
    }

    fn ticks_until(clock: &mut Countdown, probe: &mut IntervalProbe, side: Side) -> u64 {
        clock.start(probe);
        let mut ticks = 0;
        loop {
            ticks += 1;
            match clock.tick(probe, Some(side)) {
                TickOutcome::Counting => continue,
                outcome => {
                    assert!(matches!(
                        outcome,
                        TickOutcome::HumanTimedOut | TickOutcome::MachineTimedOut
                    ));
                    return ticks;
                }
            }
        }
    }

    #[test]
    fn human_deadline_scales_with_the_tick() {
        for period in [200, 125, 100] {
            let mut probe = IntervalProbe::default();
            let mut clock = Countdown::new(period);
            let ticks = ticks_until(&mut clock, &mut probe, Side::Human);
            assert_eq!(ticks * u64::from(period), 100 * u64::from(period));
            assert_eq!(clock.human_deadline_ms(), 100 * u64::from(period));
            assert!(!clock.is_running(), "timeout should cancel the timer");
        }
    }

    #[test]
    fn machine_deadline_is_constant() {
        for period in [200, 125, 100] {
            let mut probe = IntervalProbe::default();
            let mut clock = Countdown::new(period);
            let ticks = ticks_until(&mut clock, &mut probe, Side::Machine);
            assert_eq!(ticks * u64::from(period), 10_000, "period {period}");
            assert_eq!(clock.machine_deadline_ms(), 10_000);
        }
    }

    #[test]
    fn restarting_cancels_the_previous_timer() {
        let mut probe = IntervalProbe::default();
        let mut clock = Countdown::new(100);

        clock.start(&mut probe);
        clock.tick(&mut probe, Some(Side::Human));
        assert_eq!(clock.human_progress(), 1.0);

        clock.start(&mut probe);
        assert_eq!(probe.started, vec![100, 100]);
        assert_eq!(probe.cancelled, 1);
        assert_eq!(clock.human_progress(), 0.0);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut probe = IntervalProbe::default();
        let mut clock = Countdown::new(100);

        clock.start(&mut probe);
        clock.stop(&mut probe);
        clock.stop(&mut probe);
        assert_eq!(probe.cancelled, 1);
        assert_eq!(clock.tick(&mut probe, Some(Side::Human)), TickOutcome::Idle);
    }
}
