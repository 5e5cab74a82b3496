//! Integration tests for ButtonDriver against the simulated platform

mod common;
use common::*;

use std::thread;
use std::time::Duration;

use debounced_key::sim::{SimError, SimEvent, SimFaults, SimPlatform};
use debounced_key::{
    ButtonConfig, ButtonDriver, DescriptorError, DeviceNode, Edge, GpioNum, IrqNum, IrqReturn,
    Level, MAX_DEBOUNCE, ReadError, STATUS_RECORD_LEN, SetupError, Status, Trigger,
};

use Level::{High, Low};

// ============================================================================
// Setup and teardown
// ============================================================================

#[test]
fn setup_claims_pin_then_irq() {
    let (platform, driver) = released_button(15);

    assert_eq!(driver.gpio(), GpioNum(GPIO));
    assert_eq!(driver.irq(), IrqNum(IRQ));
    assert_eq!(driver.debounce(), Duration::from_millis(15));
    assert_eq!(
        platform.events(),
        [
            SimEvent::PinRequested(GpioNum(GPIO)),
            SimEvent::IrqRequested(IrqNum(IRQ), Trigger::Both),
        ]
    );
    // Only the initial level read so far.
    assert_eq!(sample_count(&platform), 1);
}

#[test]
fn unset_trigger_defaults_to_both_edges() {
    let (platform, driver) = released_button(15);
    assert_eq!(driver.trigger(), Trigger::Both);
    assert_eq!(platform.attached_trigger(), Some(Trigger::Both));
}

#[test]
fn described_trigger_is_kept() {
    let platform = SimPlatform::new(High).with_trigger(Trigger::Falling);
    let driver = ButtonDriver::setup(platform.clone(), &key_node(), &config_ms(15)).unwrap();
    assert_eq!(driver.trigger(), Trigger::Falling);
    assert_eq!(platform.attached_trigger(), Some(Trigger::Falling));
}

#[test]
fn edges_outside_trigger_are_not_dispatched() {
    let platform = SimPlatform::new(High).with_trigger(Trigger::Falling);
    let driver = ButtonDriver::setup(platform.clone(), &key_node(), &config_ms(15)).unwrap();
    let base = sample_count(&platform);

    assert_eq!(platform.set_level(Low), Some(IrqReturn::Handled));
    assert!(wait_for_samples(&platform, base + 1));
    assert_eq!(driver.read(), Status::Pressed);

    // Rising edge on a falling-only line: no handler, no re-sample.
    assert_eq!(platform.set_level(High), None);
    thread::sleep(Duration::from_millis(60));
    assert_eq!(sample_count(&platform), base + 1);
    assert_eq!(driver.read(), Status::Unchanged);
}

#[test]
fn longest_window_edge_is_handled() {
    let config = ButtonConfig::builder().debounce(MAX_DEBOUNCE).build().unwrap();
    assert!(ButtonConfig::builder().debounce(Duration::MAX).build().is_err());

    let platform = SimPlatform::new(High);
    let driver = ButtonDriver::setup(platform.clone(), &key_node(), &config).unwrap();

    assert_eq!(platform.set_level(Low), Some(IrqReturn::Handled));
    assert_eq!(platform.set_level(High), Some(IrqReturn::Handled));
    assert_eq!(driver.read(), Status::Unchanged);

    // Teardown cancels the pending second-long window without waiting it out.
    driver.teardown();
    assert_eq!(sample_count(&platform), 1);
}

#[test]
fn configured_trigger_overrides_platform() {
    let platform = SimPlatform::new(High).with_trigger(Trigger::Falling);
    let config = ButtonConfig::builder().trigger(Trigger::Rising).build().unwrap();
    let driver = ButtonDriver::setup(platform.clone(), &key_node(), &config).unwrap();
    assert_eq!(driver.trigger(), Trigger::Rising);
}

#[test]
fn teardown_cancels_timer_then_frees_irq_then_pin() {
    let (platform, driver) = released_button(15);
    // The timer goes first even though it was acquired after the pin: once
    // cancelled, edges still arriving before the irq is freed arm nothing.
    // The irq and pin then follow in reverse acquisition order.
    driver.teardown();

    assert_eq!(
        platform.events(),
        [
            SimEvent::PinRequested(GpioNum(GPIO)),
            SimEvent::IrqRequested(IrqNum(IRQ), Trigger::Both),
            SimEvent::IrqFreed(IrqNum(IRQ)),
            SimEvent::PinReleased(GpioNum(GPIO)),
        ]
    );
    assert!(!platform.pin_claimed());
    assert_eq!(platform.attached_trigger(), None);
}

#[test]
fn drop_tears_down() {
    let (platform, driver) = released_button(15);
    drop(driver);

    assert!(!platform.pin_claimed());
    assert_eq!(platform.attached_trigger(), None);
    assert_eq!(platform.events().len(), 4);
}

#[test]
fn teardown_continues_after_release_failure() {
    let (platform, driver) = released_button(15);
    platform.set_faults(SimFaults {
        free_irq: true,
        ..SimFaults::default()
    });

    driver.teardown();

    assert!(!platform.pin_claimed());
    assert_eq!(
        platform.events().last(),
        Some(&SimEvent::PinReleased(GpioNum(GPIO)))
    );
}

#[test]
fn setup_rejects_bad_node_without_touching_hardware() {
    let platform = SimPlatform::new(High);
    let node = DeviceNode {
        interrupt: None,
        ..key_node()
    };

    let result = ButtonDriver::setup(platform.clone(), &node, &config_ms(15));
    assert!(matches!(
        result,
        Err(SetupError::Descriptor(DescriptorError::MissingInterrupt))
    ));
    assert!(platform.events().is_empty());
}

#[test]
fn setup_reports_pin_request_failure() {
    let platform = SimPlatform::new(High);
    platform.set_faults(SimFaults {
        request_pin: true,
        ..SimFaults::default()
    });

    let result = ButtonDriver::setup(platform.clone(), &key_node(), &config_ms(15));
    assert!(matches!(
        result,
        Err(SetupError::PinRequest(SimError::Injected("request_pin")))
    ));
    assert!(platform.events().is_empty());
}

#[test]
fn setup_unwinds_pin_when_initial_read_fails() {
    let platform = SimPlatform::new(High);
    platform.set_faults(SimFaults {
        read_level: true,
        ..SimFaults::default()
    });

    let result = ButtonDriver::setup(platform.clone(), &key_node(), &config_ms(15));
    assert!(matches!(result, Err(SetupError::InitialLevel(_))));
    assert_eq!(
        platform.events(),
        [
            SimEvent::PinRequested(GpioNum(GPIO)),
            SimEvent::PinReleased(GpioNum(GPIO)),
        ]
    );
    assert!(!platform.pin_claimed());
}

#[test]
fn setup_unwinds_pin_when_irq_request_fails() {
    let platform = SimPlatform::new(High);
    platform.set_faults(SimFaults {
        request_irq: true,
        ..SimFaults::default()
    });

    let result = ButtonDriver::setup(platform.clone(), &key_node(), &config_ms(15));
    let err = result.unwrap_err();
    assert!(matches!(err, SetupError::IrqRequest(_)));
    assert_eq!(
        err.to_string(),
        "failed to request button irq: injected request_irq failure"
    );
    assert_eq!(
        platform.events(),
        [
            SimEvent::PinRequested(GpioNum(GPIO)),
            SimEvent::PinReleased(GpioNum(GPIO)),
        ]
    );

    // Edges on the line reach nobody.
    platform.set_faults(SimFaults::default());
    assert_eq!(platform.set_level(Low), None);
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn idle_reads_are_unchanged() {
    let (_platform, driver) = released_button(15);
    assert_eq!(driver.read(), Status::Unchanged);
    assert_eq!(driver.read(), Status::Unchanged);
}

#[test]
fn interrupt_handler_reports_handled() {
    let (platform, _driver) = released_button(15);
    assert_eq!(platform.set_level(Low), Some(IrqReturn::Handled));
}

#[test]
fn settled_press_is_reported_once() {
    let (platform, driver) = released_button(15);
    let base = sample_count(&platform);

    platform.set_level(Low);
    assert!(wait_for_samples(&platform, base + 1));

    assert_eq!(driver.read(), Status::Pressed);
    assert_eq!(driver.read(), Status::Unchanged);
    assert_eq!(driver.read(), Status::Unchanged);
}

#[test]
fn press_then_release() {
    let (platform, driver) = released_button(15);
    let base = sample_count(&platform);

    platform.set_level(Low);
    assert!(wait_for_samples(&platform, base + 1));
    assert_eq!(driver.read(), Status::Pressed);

    thread::sleep(Duration::from_millis(5));
    assert_eq!(driver.read(), Status::Unchanged);

    platform.set_level(High);
    assert!(wait_for_samples(&platform, base + 2));
    assert_eq!(driver.read(), Status::Released);
    assert_eq!(driver.read(), Status::Unchanged);
}

#[test]
fn bounce_collapses_to_one_transition() {
    let (platform, driver) = released_button(60);
    let base = sample_count(&platform);

    platform.bounce(&[Low, High, Low, High, Low], Duration::from_millis(1));
    assert!(wait_for_samples(&platform, base + 1));

    assert_eq!(driver.read(), Status::Pressed);
    assert_eq!(driver.read(), Status::Unchanged);

    thread::sleep(Duration::from_millis(120));
    assert_eq!(sample_count(&platform), base + 1);
    assert_eq!(driver.read(), Status::Unchanged);
}

#[test]
fn bounce_back_to_rest_reports_nothing() {
    let (platform, driver) = released_button(60);
    let base = sample_count(&platform);

    platform.bounce(&[Low, High], Duration::from_millis(1));
    assert!(wait_for_samples(&platform, base + 1));

    assert_eq!(driver.read(), Status::Unchanged);
}

#[test]
fn resample_waits_full_window_after_last_edge() {
    let debounce = Duration::from_millis(80);
    let (platform, driver) = released_button(80);

    platform.bounce(&[Low, High, Low, High, Low], Duration::from_millis(10));
    let edges = platform.edges();
    let last_edge = edges.last().map(|&(at, _)| at).unwrap();
    assert_eq!(edges.last().map(|&(_, edge)| edge), Some(Edge::Falling));

    assert!(wait_for_samples(&platform, 2));
    thread::sleep(debounce * 2);

    // Every re-sample happened at least one full window after the most
    // recent edge preceding it.
    for &(sampled_at, _) in &platform.samples()[1..] {
        let preceding = edges
            .iter()
            .map(|&(at, _)| at)
            .filter(|&at| at <= sampled_at)
            .max()
            .unwrap();
        assert!(sampled_at.duration_since(preceding) >= debounce);
    }

    let (final_sample, level) = *platform.samples().last().unwrap();
    assert!(final_sample.duration_since(last_edge) >= debounce);
    assert_eq!(level, Low);
    assert_eq!(driver.read(), Status::Pressed);
}

#[test]
fn concurrent_readers_see_transition_once() {
    let (platform, driver) = released_button(15);
    let base = sample_count(&platform);

    platform.set_level(Low);
    assert!(wait_for_samples(&platform, base + 1));

    let observed: Vec<Status> = thread::scope(|s| {
        let readers: Vec<_> = (0..8).map(|_| s.spawn(|| driver.read())).collect();
        readers.into_iter().map(|r| r.join().unwrap()).collect()
    });

    assert_eq!(observed.iter().filter(|&&s| s == Status::Pressed).count(), 1);
    assert_eq!(
        observed.iter().filter(|&&s| s == Status::Unchanged).count(),
        7
    );
}

#[test]
fn failed_sample_counts_as_no_change() {
    let (platform, driver) = released_button(20);
    platform.set_faults(SimFaults {
        read_level: true,
        ..SimFaults::default()
    });

    platform.set_level(Low);
    thread::sleep(Duration::from_millis(80));
    assert_eq!(driver.read(), Status::Unchanged);

    // The settled level stayed high, so the next low sample is a press.
    platform.set_faults(SimFaults::default());
    let base = sample_count(&platform);
    platform.bounce(&[High, Low], Duration::ZERO);
    assert!(wait_for_samples(&platform, base + 1));
    assert_eq!(driver.read(), Status::Pressed);
}

#[test]
fn read_into_writes_status_record() {
    let (platform, driver) = released_button(15);
    let base = sample_count(&platform);

    let mut record = [0xffu8; STATUS_RECORD_LEN];
    assert_eq!(driver.read_into(&mut record), Ok(STATUS_RECORD_LEN));
    assert_eq!(i32::from_ne_bytes(record), 2);

    platform.set_level(Low);
    assert!(wait_for_samples(&platform, base + 1));

    let mut buf = [0u8; 8];
    assert_eq!(driver.read_into(&mut buf), Ok(STATUS_RECORD_LEN));
    assert_eq!(buf[..STATUS_RECORD_LEN], Status::Pressed.to_ne_bytes());
}

#[test]
fn read_into_rejects_short_buffer_without_consuming() {
    let (platform, driver) = released_button(15);
    let base = sample_count(&platform);

    platform.set_level(Low);
    assert!(wait_for_samples(&platform, base + 1));

    let mut short = [0u8; 2];
    assert_eq!(
        driver.read_into(&mut short),
        Err(ReadError::BufferTooSmall {
            needed: STATUS_RECORD_LEN,
            got: 2
        })
    );
    assert_eq!(driver.read(), Status::Pressed);
}

// ============================================================================
// Teardown safety
// ============================================================================

#[test]
fn no_resample_after_teardown() {
    let (platform, driver) = released_button(30);
    let base = sample_count(&platform);

    // Edge in flight when teardown starts.
    platform.set_level(Low);
    driver.teardown();

    let after_teardown = sample_count(&platform);
    assert!(after_teardown <= base + 1);

    thread::sleep(Duration::from_millis(100));
    assert_eq!(sample_count(&platform), after_teardown);

    // Handler is detached.
    assert_eq!(platform.set_level(High), None);
    thread::sleep(Duration::from_millis(60));
    assert_eq!(sample_count(&platform), after_teardown);
}

#[test]
fn scenario_press_and_release_on_gpio_12() {
    let (platform, driver) = released_button(15);
    let base = sample_count(&platform);

    // t=0: high -> low, no further edges.
    platform.set_level(Low);
    assert!(wait_for_samples(&platform, base + 1));
    assert_eq!(driver.read(), Status::Pressed);

    thread::sleep(Duration::from_millis(5));
    assert_eq!(driver.read(), Status::Unchanged);

    // t=25ms: low -> high.
    thread::sleep(Duration::from_millis(5));
    platform.set_level(High);
    assert!(wait_for_samples(&platform, base + 2));
    assert_eq!(driver.read(), Status::Released);

    driver.teardown();
    assert!(!platform.pin_claimed());
}
