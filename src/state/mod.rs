//! 运行时状态

pub mod app_state;

pub use app_state::AppState;
