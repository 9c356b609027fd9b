use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, Range};

/// 棋盘上洞的总数。
pub const HOLE_COUNT: usize = 12;
/// 每位玩家拥有的洞数。
pub const HOLES_PER_SIDE: usize = 6;
/// 开局时每个洞的种子数。
pub const SEEDS_PER_HOLE: u8 = 4;

/// 棋盘的一侧：玩家（A，洞 0-5）或电脑（B，洞 6-11）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Human,
    Machine,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Human => Side::Machine,
            Side::Machine => Side::Human,
        }
    }

    pub fn holes(self) -> Range<usize> {
        match self {
            Side::Human => 0..HOLES_PER_SIDE,
            Side::Machine => HOLES_PER_SIDE..HOLE_COUNT,
        }
    }

    pub fn owns(self, index: usize) -> bool {
        self.holes().contains(&index)
    }

    pub fn of_hole(index: usize) -> Option<Side> {
        match index {
            i if Side::Human.owns(i) => Some(Side::Human),
            i if Side::Machine.owns(i) => Some(Side::Machine),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Human,
    Machine,
    Tie,
}

/// 对局结果；`winner` 为空表示尚未结束。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

impl MatchResult {
    pub fn ongoing() -> Self {
        Self::default()
    }

    pub fn decided(winner: Winner) -> Self {
        Self {
            finished: true,
            winner: Some(winner),
        }
    }
}

/// 12 个洞的计数器。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Board {
    holes: [u8; HOLE_COUNT],
}

impl Board {
    pub fn new(holes: [u8; HOLE_COUNT]) -> Self {
        Self { holes }
    }

    pub fn seeded(per_hole: u8) -> Self {
        Self {
            holes: [per_hole; HOLE_COUNT],
        }
    }

    pub fn holes(&self) -> &[u8; HOLE_COUNT] {
        &self.holes
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.holes.get(index).copied()
    }

    /// 写入某个洞的新计数，越界时返回 `false` 且不做修改。
    pub fn set(&mut self, index: usize, seeds: u8) -> bool {
        match self.holes.get_mut(index) {
            Some(hole) => {
                *hole = seeds;
                true
            }
            None => false,
        }
    }

    pub fn side(&self, side: Side) -> &[u8] {
        &self.holes[side.holes()]
    }

    pub fn side_total(&self, side: Side) -> u32 {
        self.side(side).iter().map(|&seeds| u32::from(seeds)).sum()
    }

    pub fn side_is_empty(&self, side: Side) -> bool {
        self.side(side).iter().all(|&seeds| seeds == 0)
    }

    /// 清空一侧并返回被取走的种子数。
    pub fn clear_side(&mut self, side: Side) -> u32 {
        let taken = self.side_total(side);
        self.holes[side.holes()].fill(0);
        taken
    }

    pub fn total(&self) -> u32 {
        self.holes.iter().map(|&seeds| u32::from(seeds)).sum()
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::seeded(SEEDS_PER_HOLE)
    }
}

impl Index<usize> for Board {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.holes[index]
    }
}

/// 玩家状态：回合标志与得分。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Player {
    #[serde(default)]
    pub turn: bool,
    #[serde(default)]
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("turn flags are not exclusive (human: {human}, machine: {machine})")]
    TurnFlagsConflict { human: bool, machine: bool },
    #[error("expected {expected} seeds in play, found {actual}")]
    SeedCountMismatch { expected: u32, actual: u32 },
}

/// 一局对局的完整状态。字段名与 JS 规则引擎的 `Game` 对象保持一致。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchState {
    pub holes: Board,
    #[serde(rename = "p1", alias = "human")]
    pub human: Player,
    #[serde(rename = "p2", alias = "machine")]
    pub machine: Player,
}

impl MatchState {
    pub fn new(holes: Board, first: Side) -> Self {
        let mut state = Self {
            holes,
            human: Player::default(),
            machine: Player::default(),
        };
        state.give_turn(first);
        state
    }

    /// 标准开局：每洞 4 颗种子。
    pub fn opening(first: Side) -> Self {
        Self::new(Board::default(), first)
    }

    pub fn player(&self, side: Side) -> &Player {
        match side {
            Side::Human => &self.human,
            Side::Machine => &self.machine,
        }
    }

    pub fn player_mut(&mut self, side: Side) -> &mut Player {
        match side {
            Side::Human => &mut self.human,
            Side::Machine => &mut self.machine,
        }
    }

    pub fn holds_turn(&self, side: Side) -> bool {
        self.player(side).turn && !self.player(side.opponent()).turn
    }

    /// 当前持有回合的一方；标志冲突时返回 `None`。
    pub fn active_side(&self) -> Option<Side> {
        match (self.human.turn, self.machine.turn) {
            (true, false) => Some(Side::Human),
            (false, true) => Some(Side::Machine),
            _ => None,
        }
    }

    pub fn give_turn(&mut self, side: Side) {
        self.human.turn = side == Side::Human;
        self.machine.turn = side == Side::Machine;
    }

    /// 交换双方的回合标志。
    pub fn pass_turn(&mut self) {
        self.human.turn = !self.human.turn;
        self.machine.turn = !self.machine.turn;
    }

    pub fn seed_total(&self) -> u32 {
        self.holes.total() + self.human.points + self.machine.points
    }

    pub fn integrity_check(&self, expected_seeds: Option<u32>) -> Result<(), IntegrityError> {
        if self.active_side().is_none() {
            return Err(IntegrityError::TurnFlagsConflict {
                human: self.human.turn,
                machine: self.machine.turn,
            });
        }

        if let Some(expected) = expected_seeds {
            let actual = self.seed_total();
            if actual != expected {
                return Err(IntegrityError::SeedCountMismatch { expected, actual });
            }
        }

        Ok(())
    }
}

/// 一次原子播种动作后某个洞的新计数。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SowStep {
    pub index: usize,
    #[serde(alias = "nb")]
    pub seeds: u8,
}

impl SowStep {
    pub fn new(index: usize, seeds: u8) -> Self {
        Self { index, seeds }
    }
}

/// 规则引擎每一跳返回的结果。`terminal = false` 表示需要从最后一个洞继续接力。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnEvent {
    #[serde(alias = "states")]
    pub steps: Vec<SowStep>,
    #[serde(default, alias = "gain")]
    pub captured_seeds: u32,
    #[serde(alias = "end")]
    pub terminal: bool,
}

impl TurnEvent {
    pub fn relay(steps: Vec<SowStep>) -> Self {
        Self {
            steps,
            captured_seeds: 0,
            terminal: false,
        }
    }

    pub fn closing(steps: Vec<SowStep>, captured_seeds: u32) -> Self {
        Self {
            steps,
            captured_seeds,
            terminal: true,
        }
    }
}

/// 界面上的一次点击：行内位置与所在的一侧。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HoleClick {
    pub slot: u8,
    pub side: Side,
}

impl HoleClick {
    pub fn new(slot: u8, side: Side) -> Self {
        Self { slot, side }
    }

    /// `user` 对应界面上玩家一行。
    pub fn from_row(slot: u8, user: bool) -> Self {
        let side = if user { Side::Human } else { Side::Machine };
        Self { slot, side }
    }

    /// 玩家一行从右向左编号，电脑一行从左向右编号。
    pub fn board_index(&self) -> Option<usize> {
        let slot = usize::from(self.slot);
        if slot >= HOLES_PER_SIDE {
            return None;
        }
        Some(match self.side {
            Side::Human => HOLES_PER_SIDE - (slot + 1),
            Side::Machine => slot + HOLES_PER_SIDE,
        })
    }
}

/// 界面侧的洞引用，显示为 `u3` / `p0` 这样的短码。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HoleRef {
    pub side: Side,
    pub slot: u8,
}

impl HoleRef {
    pub fn from_index(index: usize) -> Option<Self> {
        let side = Side::of_hole(index)?;
        let slot = match side {
            Side::Human => HOLES_PER_SIDE - 1 - index,
            Side::Machine => index - HOLES_PER_SIDE,
        };
        Some(Self {
            side,
            slot: slot as u8,
        })
    }

    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HoleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.side {
            Side::Human => 'u',
            Side::Machine => 'p',
        };
        write!(f, "{prefix}{}", self.slot)
    }
}

/// 对局过程中记录的事件，由宿主取出后驱动界面。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MatchEvent {
    MatchStarted {
        first: Side,
        seeds: u32,
    },
    HopRequested {
        side: Side,
        from: usize,
        hop: u32,
    },
    HoleChanged {
        index: usize,
        seeds: u8,
        hole: String,
    },
    SeedsCaptured {
        side: Side,
        seeds: u32,
    },
    TurnPassed {
        to: Side,
    },
    TurnTimedOut {
        side: Side,
    },
    MachineChose {
        index: usize,
        candidates: usize,
    },
    MatchFinished {
        result: MatchResult,
        human_points: u32,
        machine_points: u32,
    },
    MatchAbandoned,
    EngineFault {
        message: String,
    },
}
