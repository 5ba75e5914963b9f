//! Fuzz target: `Command::parse`
//!
//! Splits arbitrary bytes into a topic and a payload and asserts that
//! parsing never panics and that a parsed command only borrows text that
//! was actually present in its inputs.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use greenhouse::app::commands::{is_sensor_read, ActuatorAction, Command};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else { return };
    let (topic, payload) = text.split_once('\n').unwrap_or((text, ""));

    if let Ok(cmd) = Command::parse(topic, payload) {
        assert!(topic.contains(cmd.target));
        assert!(topic.contains(cmd.action) || payload.contains(cmd.action));
        assert!(!cmd.target.contains('/'));
        let _ = ActuatorAction::parse(cmd.action);
        let _ = is_sensor_read(cmd.action);
    }
});
