//! Inbound remote commands.
//!
//! Commands arrive on `<client_id>/<category>/<target>/<action>`.  The
//! action may instead travel in the payload, with the fourth topic level
//! left empty (`<client_id>/actuators/pump_1/` + payload `on`).

use crate::error::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Actuators,
    Sensors,
}

impl Category {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "actuators" => Some(Self::Actuators),
            "sensors" => Some(Self::Sensors),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorAction {
    On,
    Off,
    Toggle,
}

impl ActuatorAction {
    pub fn parse(action: &str) -> Option<Self> {
        if action.eq_ignore_ascii_case("on") {
            Some(Self::On)
        } else if action.eq_ignore_ascii_case("off") {
            Some(Self::Off)
        } else if action.eq_ignore_ascii_case("toggle") {
            Some(Self::Toggle)
        } else {
            None
        }
    }
}

/// Sensor action: the only one is `read`.
pub fn is_sensor_read(action: &str) -> bool {
    action.eq_ignore_ascii_case("read")
}

/// A parsed command, borrowing from the inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    pub category: Category,
    pub target: &'a str,
    pub action: &'a str,
}

impl<'a> Command<'a> {
    pub fn parse(topic: &'a str, payload: &'a str) -> Result<Self, CommandError> {
        let mut levels = topic.split('/');
        let (Some(_client), Some(category), Some(target), Some(action)) =
            (levels.next(), levels.next(), levels.next(), levels.next())
        else {
            return Err(CommandError::MalformedCommand);
        };
        let category = Category::parse(category).ok_or(CommandError::MalformedCommand)?;
        let action = if action.is_empty() { payload.trim() } else { action };
        Ok(Self { category, target, action })
    }
}
