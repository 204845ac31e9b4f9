pub mod filter;
pub mod fines;
pub mod stats;

pub use filter::{filter_history, Visibility};
pub use fines::{fine_breakdown, outstanding_fine};
pub use stats::{compute_stats, streak, trend, weekly_overview};
