//! Reader loop against the simulated button.
//!
//! A stimulus thread presses and releases the button a few times with
//! contact bounce; the main loop polls the status record the way a user
//! application reads the device node, printing only real transitions.

use std::thread;
use std::time::{Duration, Instant};

use debounced_key::sim::SimPlatform;
use debounced_key::{ButtonConfig, ButtonDriver, DeviceNode, Level, STATUS_RECORD_LEN, Status};

const PRESSES: usize = 3;
const BOUNCE_GAP: Duration = Duration::from_millis(2);
const HOLD: Duration = Duration::from_millis(120);
const POLL_INTERVAL: Duration = Duration::from_millis(5);
const RUN_FOR: Duration = Duration::from_millis(1500);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let platform = SimPlatform::new(Level::High);
    let node = DeviceNode {
        path: "/key",
        status: Some("okay"),
        compatible: Some("alientek,key"),
        gpio: Some(12),
        interrupt: Some(45),
    };

    let driver = ButtonDriver::setup(platform.clone(), &node, &ButtonConfig::default())?;
    println!("monitoring {} on {}", driver.gpio(), driver.irq());

    let stimulus = thread::spawn(move || {
        use Level::{High, Low};
        for _ in 0..PRESSES {
            platform.bounce(&[Low, High, Low, High, Low], BOUNCE_GAP);
            thread::sleep(HOLD);
            platform.bounce(&[High, Low, High], BOUNCE_GAP);
            thread::sleep(HOLD);
        }
    });

    let started = Instant::now();
    let mut record = [0u8; STATUS_RECORD_LEN];
    while started.elapsed() < RUN_FOR {
        driver.read_into(&mut record)?;
        match Status::try_from(i32::from_ne_bytes(record)) {
            Ok(Status::Pressed) => println!("Key Press"),
            Ok(Status::Released) => println!("Key Release"),
            _ => {}
        }
        thread::sleep(POLL_INTERVAL);
    }

    let _ = stimulus.join();
    driver.teardown();
    Ok(())
}
