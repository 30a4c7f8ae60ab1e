pub mod trace;
pub mod replay;
pub mod replay_2d;
