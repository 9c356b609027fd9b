use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::{Board, MatchError, RulesEngine, Side};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineChoice {
    pub index: usize,
    pub candidates: usize,
}

/// 电脑玩家：在规则引擎给出的同等候选中随机挑选一个洞。
pub struct MachinePlayer {
    rng: SmallRng,
}

impl MachinePlayer {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn choose<R: RulesEngine>(
        &mut self,
        rules: &mut R,
        board: &Board,
    ) -> Result<MachineChoice, MatchError> {
        let mut candidates = rules.pc_choice(board)?;
        if candidates.is_empty() {
            return Err(MatchError::NoCandidates);
        }
        if let Some(&index) = candidates.iter().find(|&&index| !Side::Machine.owns(index)) {
            return Err(MatchError::CandidateOutOfRange { index });
        }

        let count = candidates.len();
        candidates.shuffle(&mut self.rng);
        let index = candidates.swap_remove(0);
        Ok(MachineChoice {
            index,
            candidates: count,
        })
    }
}

impl Default for MachinePlayer {
    fn default() -> Self {
        MachinePlayer::new()
    }
}
