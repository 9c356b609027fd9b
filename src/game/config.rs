use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 难度：决定计时器的节拍（毫秒），也间接决定玩家的思考期限。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Beginner,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Expert,
    ];

    pub fn tick_ms(self) -> u32 {
        match self {
            DifficultyLevel::Beginner => 200,
            DifficultyLevel::Intermediate => 125,
            DifficultyLevel::Expert => 100,
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" | "easy" | "1" | "level_1" => Ok(DifficultyLevel::Beginner),
            "intermediate" | "normal" | "medium" | "2" | "level_2" => {
                Ok(DifficultyLevel::Intermediate)
            }
            "expert" | "hard" | "3" | "level_3" => Ok(DifficultyLevel::Expert),
            _ => Err(()),
        }
    }
}

/// 终局清扫规则。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SweepRule {
    /// 空的一侧（全为 0）计入对手得分，数值上不产生变化。
    #[default]
    Observed,
    /// 非空一侧剩余的种子归该侧所有者，棋盘清空。
    OwnerCollects,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatchConfig {
    pub level: DifficultyLevel,
    pub pacing_ms: u32,
    pub start_delay_ms: u32,
    pub think_delay_ms: u32,
    pub max_relay_hops: u32,
    pub sweep: SweepRule,
}

impl MatchConfig {
    pub fn from_difficulty(level: DifficultyLevel) -> Self {
        Self {
            level,
            pacing_ms: 500,
            start_delay_ms: 500,
            think_delay_ms: 500,
            max_relay_hops: 256,
            sweep: SweepRule::Observed,
        }
    }

    pub fn with_sweep(mut self, sweep: SweepRule) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn with_max_relay_hops(mut self, hops: u32) -> Self {
        self.max_relay_hops = hops.max(1);
        self
    }

    pub fn with_pacing(mut self, pacing_ms: u32) -> Self {
        self.pacing_ms = pacing_ms;
        self
    }

    pub fn tick_ms(&self) -> u32 {
        self.level.tick_ms()
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig::from_difficulty(DifficultyLevel::default())
    }
}
