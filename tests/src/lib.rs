//! Integration test framework for ricxapp
#![allow(missing_docs)]
//!
//! This crate provides test utilities and a mock E2 node for exercising the
//! xApp end to end over the in-process RMR transport.
//!
//! # Components
//!
//! - [`mock_e2node`] - Mock E2 node answering subscription, control and reset requests
//! - [`test_fixtures`] - Common test configuration and intent builders
//! - [`test_utils`] - Utility functions for test setup and assertions
//!
//! # Test Categories
//!
//! 1. **Subscription Lifecycle Tests** - Subscribe, delete, timeouts, persistence
//! 2. **Indication Flow Tests** - Indication delivery, drops and health checks
//! 3. **Control and Reset Tests** - Control acknowledgement and E2 node reset

pub mod mock_e2node;
pub mod test_fixtures;
pub mod test_utils;

pub use mock_e2node::{MockE2Node, MockE2NodeConfig, MockE2NodeEvent, MockReply};
pub use test_fixtures::{
    control_intent, report_intent, test_config, test_node, TestXapp, TEST_RAN_FUNCTION,
};
pub use test_utils::{
    assert_quiet, init_test_logging, recv_within, wait_for_condition, TestResult,
    DEFAULT_POLL_INTERVAL, DEFAULT_TEST_TIMEOUT,
};
