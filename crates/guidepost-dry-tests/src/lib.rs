// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Guidepost crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`api`] - Scripted fake guide API
//! - [`builders`] - Guide, group and fetch-response builders
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`engine`] - Engine harness wired to the manual doubles
//! - [`frames`] - Socket frame helpers
//! - [`ports`] - Manual scheduler, recording sink, fixed clock

pub mod api;
pub mod builders;
pub mod config;
pub mod engine;
pub mod frames;
pub mod ports;

pub use api::FakeGuideApi;
pub use builders::{ts, GroupBuilder, GuideBuilder, ResponseBuilder};
pub use config::InMemoryConfigStore;
pub use engine::{EngineHarness, TestEngine, TEST_CHANNEL, TEST_USER};
pub use frames::{added_frame, removed_frame, updated_frame};
pub use ports::{FixedClock, ManualScheduler, RecordingSink};
