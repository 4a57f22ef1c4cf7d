//! Background application services

mod overdue_sweeper;

pub use overdue_sweeper::{OverdueSweeper, SweepReport};
