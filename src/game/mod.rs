pub mod combo;
pub mod gameplay;
pub mod judgment;
pub mod life;
pub mod replay;
pub mod scores;
pub mod stage;
pub mod stage_stats;
pub mod timing_windows;
pub mod window;
pub mod zone;
