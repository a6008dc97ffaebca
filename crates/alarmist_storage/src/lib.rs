//! Time-windowed hit tracking for Alarmist conditions.
//!
//! This crate provides:
//! - [`Cell`] - A sliding-window state machine for one (source, target) pair
//! - [`WindowPolicy`] and [`Occurrence`] - The accumulation policy of a condition
//! - [`Hitmap`] - The lazily grown cell table of one condition
//! - [`TimingQueue`] - Scheduled checks for windows that close without arrivals

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cell;
pub mod hitmap;
pub mod timing;

pub use cell::{Cell, CellHit, Occurrence, WindowPolicy};
pub use hitmap::{Capture, ChangeFlags, CountKind, GLOBAL_SOURCE, GLOBAL_TARGET, Hitmap};
pub use timing::{TimingEvent, TimingQueue};
