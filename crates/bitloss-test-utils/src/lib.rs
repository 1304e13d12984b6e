// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Bitloss integration tests.
//!
//! Provides mock collaborators and a harness for fast, deterministic tests
//! without a backend.
//!
//! # Components
//!
//! - [`MockBackend`] - Scripted `FeedBackend` with call recording and delays
//! - [`StaticIdentity`] - Switchable viewer session
//! - [`RecordingNotifier`] - Captures notices and haptic pulses
//! - [`TestHarness`] - A mounted feed wired to the mocks above

pub mod fixtures;
pub mod harness;
pub mod mock_backend;
pub mod mock_viewer;

pub use harness::TestHarness;
pub use mock_backend::MockBackend;
pub use mock_viewer::{RecordingNotifier, StaticIdentity};
