//! 对局核心逻辑（状态、计时、回合解析与对局控制）。

pub mod clock;
pub mod config;
pub mod controller;
pub mod pacing;
pub mod resolver;
pub mod rules;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Countdown, TickOutcome};
pub use config::{DifficultyLevel, MatchConfig, SweepRule};
pub use controller::{check_termination, MatchController, MatchPhase, MatchSnapshot};
pub use pacing::{Scheduler, Task, TaskQueue, Ticket};
pub use resolver::{HopOutcome, StepOutcome, TurnResolver};
pub use rules::{MatchError, RulesEngine};
pub use session::MatchSession;
pub use state::{
    Board,
    HoleClick,
    HoleRef,
    IntegrityError,
    MatchEvent,
    MatchResult,
    MatchState,
    Player,
    Side,
    SowStep,
    TurnEvent,
    Winner,
};
