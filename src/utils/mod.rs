//! Utility Module
//!
//! - [`Scheduler`]: source of periodic ticks for interpolation playback
//! - [`IntervalScheduler`]: fixed-period scheduler fed with elapsed time
//!
//! ```rust,ignore
//! use myth_frames::utils::{IntervalScheduler, Scheduler};
//!
//! let mut scheduler = IntervalScheduler::new();
//! scheduler.run(Duration::from_millis(40));
//! let due = scheduler.advance(Duration::from_millis(100)); // 2 ticks
//! ```

pub mod scheduler;

pub use scheduler::{IntervalScheduler, MAX_CATCH_UP_TICKS, Scheduler};
