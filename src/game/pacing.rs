//! 节奏控制：按顺序执行的延时任务队列，以及宿主计时器接口。

use std::collections::VecDeque;

/// 延时任务的票据。宿主唤醒时回传，过期票据会被忽略。
pub type Ticket = u64;

/// 宿主提供的计时能力（浏览器中由 gloo-timers 实现）。
pub trait Scheduler {
    /// `delay_ms` 之后调用 `MatchController::on_wake(ticket)`。
    fn wake_after(&mut self, delay_ms: u32, ticket: Ticket);

    /// 每隔 `period_ms` 调用一次 `MatchController::on_tick()`，直到被取消。
    fn start_interval(&mut self, period_ms: u32);

    fn cancel_interval(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Begin,
    RequestHop,
    ApplyStep,
    FinishHop,
    DispatchMachine,
}

#[derive(Debug, Clone, Copy)]
struct Deferred {
    ticket: Ticket,
    task: Task,
    delay_ms: u32,
}

/// 严格串行的任务队列：只有队首任务向宿主登记唤醒，前一个任务执行后才轮到下一个。
#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: VecDeque<Deferred>,
    next_ticket: Ticket,
    armed: Option<Ticket>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer<S: Scheduler>(&mut self, scheduler: &mut S, task: Task, delay_ms: u32) -> Ticket {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.queue.push_back(Deferred {
            ticket,
            task,
            delay_ms,
        });
        self.arm(scheduler);
        ticket
    }

    /// 取出到期的队首任务；票据不匹配（已取消或重复唤醒）时返回 `None`。
    pub fn take_due<S: Scheduler>(&mut self, scheduler: &mut S, ticket: Ticket) -> Option<Task> {
        if self.armed != Some(ticket) {
            return None;
        }
        self.armed = None;
        let due = self.queue.pop_front()?;
        self.arm(scheduler);
        Some(due.task)
    }

    /// 丢弃所有待执行任务，已登记的唤醒随之失效。
    pub fn clear(&mut self) {
        self.queue.clear();
        self.armed = None;
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> Option<Task> {
        self.queue.front().map(|deferred| deferred.task)
    }

    fn arm<S: Scheduler>(&mut self, scheduler: &mut S) {
        if self.armed.is_some() {
            return;
        }
        if let Some(head) = self.queue.front() {
            self.armed = Some(head.ticket);
            scheduler.wake_after(head.delay_ms, head.ticket);
        }
    }
}
