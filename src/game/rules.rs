use serde::{Deserialize, Serialize};

use super::state::{Board, IntegrityError, MatchState, TurnEvent};

/// 播种与吃子规则的外部实现。本 crate 只负责驱动它。
pub trait RulesEngine {
    /// 生成一局新对局：棋盘已播满种子，先手任意。
    fn start(&mut self) -> Result<MatchState, MatchError>;

    /// 从 `hole` 出发执行一跳播种。任何回合最终都必须返回 `terminal = true`。
    fn next_turn(&mut self, hole: usize, state: &MatchState) -> Result<TurnEvent, MatchError>;

    /// 电脑方同样优秀的候选洞（棋盘下标 6-11）。
    fn pc_choice(&mut self, board: &Board) -> Result<Vec<usize>, MatchError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum MatchError {
    #[error("no match is in progress")]
    NotStarted,
    #[error("the match is already finished")]
    MatchFinished,
    #[error("a turn is still being resolved")]
    TurnInProgress,
    #[error("it is not the human player's turn")]
    NotHumanTurn,
    #[error("hole {index} belongs to the opponent")]
    OpponentHole { index: usize },
    #[error("hole {index} is not on the board")]
    HoleOutOfRange { index: usize },
    #[error("slot {slot} is not on a row")]
    SlotOutOfRange { slot: u8 },
    #[error("hole {index} is empty")]
    EmptyHole { index: usize },
    #[error("rules engine was still relaying after {hops} hops")]
    RelayLimitExceeded { hops: u32 },
    #[error("rules engine returned a hop without steps from hole {from}")]
    EmptyHop { from: usize },
    #[error("rules engine reported a step on hole {index}")]
    StepOutOfRange { index: usize },
    #[error("rules engine offered no candidate move")]
    NoCandidates,
    #[error("rules engine offered hole {index} to the machine")]
    CandidateOutOfRange { index: usize },
    #[error("integrity violation: {error}")]
    IntegrityViolation { error: IntegrityError },
    #[error("rules engine bridge failed: {message}")]
    Bridge { message: String },
}

impl MatchError {
    /// 致命错误表示规则引擎违反约定，对局无法继续；其余错误只拒绝本次操作。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MatchError::RelayLimitExceeded { .. }
                | MatchError::EmptyHop { .. }
                | MatchError::StepOutOfRange { .. }
                | MatchError::NoCandidates
                | MatchError::CandidateOutOfRange { .. }
                | MatchError::IntegrityViolation { .. }
                | MatchError::Bridge { .. }
        )
    }

    pub fn bridge(message: impl std::fmt::Display) -> Self {
        MatchError::Bridge {
            message: message.to_string(),
        }
    }
}

impl From<IntegrityError> for MatchError {
    fn from(error: IntegrityError) -> Self {
        MatchError::IntegrityViolation { error }
    }
}
