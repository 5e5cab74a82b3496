//! Shared test infrastructure for debounced-key integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::thread;
use std::time::{Duration, Instant};

use debounced_key::sim::SimPlatform;
use debounced_key::{ButtonConfig, ButtonDriver, DeviceNode, Level};

// ============================================================================
// Fixtures
// ============================================================================

pub const GPIO: u32 = 12;
pub const IRQ: u32 = 45;

/// How long any wait for the debounce worker may take before a test gives up.
pub const PATIENCE: Duration = Duration::from_secs(2);

/// Enabled, compatible node for the key on gpio 12.
pub fn key_node() -> DeviceNode<'static> {
    DeviceNode {
        path: "/key",
        status: Some("okay"),
        compatible: Some("alientek,key"),
        gpio: Some(GPIO),
        interrupt: Some(IRQ),
    }
}

pub fn config_ms(millis: u64) -> ButtonConfig {
    ButtonConfig::builder().debounce_ms(millis).build().unwrap()
}

/// Sets up a driver on a released (high) line.
pub fn released_button(debounce_ms: u64) -> (SimPlatform, ButtonDriver<SimPlatform>) {
    let platform = SimPlatform::new(Level::High);
    let driver = ButtonDriver::setup(platform.clone(), &key_node(), &config_ms(debounce_ms)).unwrap();
    (platform, driver)
}

// ============================================================================
// Waiting on the debounce worker
// ============================================================================

/// Blocks until the bank has recorded at least `count` pin samples.
///
/// Samples are taken with the status guard held, so a `read()` issued after
/// this returns observes the evaluation that took the sample.
pub fn wait_for_samples(platform: &SimPlatform, count: usize) -> bool {
    let started = Instant::now();
    while platform.samples().len() < count {
        if started.elapsed() > PATIENCE {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
    true
}

/// Number of samples taken so far.
pub fn sample_count(platform: &SimPlatform) -> usize {
    platform.samples().len()
}
