//! Conditions, rules, and the rule engine for Alarmist.
//!
//! This crate provides:
//! - [`Condition`] - Message filters feeding a hitmap of window cells
//! - [`Rule`] - Boolean expressions over conditions with alarm deduplication
//! - [`RuleEngine`] - Registries and the match, notify, evaluate pipeline
//! - [`SharedEngine`] - A mutex-guarded engine with a background sweeper
//! - [`EngineConfig`], [`ConditionConfig`], [`RuleConfig`] - Configuration
//! - [`Clock`] - Time sources for holdoff and timing sweeps

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod condition;
pub mod config;
pub mod engine;
pub mod rule;
pub mod shared;

pub use clock::{Clock, ManualClock, SystemClock};
pub use condition::Condition;
pub use config::{
    ANY_PATTERN, ConditionConfig, DEFAULT_MAX_CHAIN_DEPTH, DEFAULT_MAX_DOMAIN_COMBINATIONS,
    EngineConfig, RuleConfig,
};
pub use engine::{
    Alarm, AlarmCallback, EnginePhase, ExecuteReport, FeedReport, MatchCallback, RuleEngine,
};
pub use rule::{Evaluation, Rule};
pub use shared::SharedEngine;
