//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and external systems.

pub mod chart;
pub mod check_in;
pub mod hello;
pub mod history;
pub mod music;

pub use chart::{ChartRenderer, PlottersChartRenderer};
pub use check_in::CheckInService;
pub use hello::{HelloAction, HelloService};
pub use history::HistoryService;
pub use music::MusicClient;
