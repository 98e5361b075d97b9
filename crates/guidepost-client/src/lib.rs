// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Async client for the Guidepost engine (tokio + reqwest), plus the ports
//! its transports plug into.
#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod dispatch;
pub mod http;
pub mod scheduler;
pub mod socket;

pub use api::{ApiError, GuideApi};
pub use client::{engine_config, ClientEngine, ClientError, ClientEvent, GuideClient};
pub use dispatch::{spawn_engagement_worker, ChannelSink};
pub use http::HttpGuideApi;
pub use scheduler::TokioScheduler;
pub use socket::{ChannelSocket, GuideSocket, SocketError, SocketFeed};
