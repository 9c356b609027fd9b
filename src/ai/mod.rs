//! 电脑玩家（候选洞的随机选择）。

pub mod dispatcher;

pub use dispatcher::{MachineChoice, MachinePlayer};
