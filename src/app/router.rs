//! Command router.
//!
//! Turns one inbound `(topic, payload)` pair into exactly one terminal
//! outcome: [`RouteOutcome::Applied`] with the acknowledgement to
//! publish, or [`RouteOutcome::Ignored`] with the reason.  Nothing here
//! can fail the calling task; there are no error acknowledgements.
//!
//! ```text
//!  topic ──▶ Command::parse ──▶ registry lookup ──▶ action ──▶ ack
//!                 │                   │               │
//!                 └─ Malformed        └─ UnknownTarget └─ UnsupportedAction
//! ```

use std::rc::Rc;

use log::{debug, info};
use serde::Serialize;

use super::commands::{is_sensor_read, ActuatorAction, Category, Command};
use super::ports::TimePort;
use crate::drivers::actuator::SwitchState;
use crate::error::CommandError;
use crate::registry::DeviceRegistry;
use crate::sensors::Readings;

/// Acknowledgement ready to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub topic: String,
    /// UTF-8 JSON.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Applied(Acknowledgement),
    Ignored(CommandError),
}

#[derive(Serialize)]
struct StateData {
    state: SwitchState,
}

#[derive(Serialize)]
struct ActuatorAck<'a> {
    actuator: &'a str,
    data: StateData,
}

#[derive(Serialize)]
struct SensorAck<'a> {
    sensor: &'a str,
    data: &'a Readings,
}

pub struct CommandRouter {
    registry: Rc<DeviceRegistry>,
    data_topic: String,
}

impl CommandRouter {
    pub fn new(registry: Rc<DeviceRegistry>, client_id: &str) -> Self {
        Self { registry, data_topic: format!("{client_id}/data") }
    }

    /// Topic acknowledgements are published on.
    pub fn data_topic(&self) -> &str {
        &self.data_topic
    }

    pub async fn route<T: TimePort>(&self, topic: &str, payload: &str, time: &T) -> RouteOutcome {
        match self.try_route(topic, payload, time).await {
            Ok(ack) => RouteOutcome::Applied(ack),
            Err(reason) => {
                debug!("Router: '{}' ignored ({})", topic, reason);
                RouteOutcome::Ignored(reason)
            }
        }
    }

    async fn try_route<T: TimePort>(
        &self,
        topic: &str,
        payload: &str,
        time: &T,
    ) -> Result<Acknowledgement, CommandError> {
        let cmd = Command::parse(topic, payload)?;
        match cmd.category {
            Category::Actuators => self.apply_actuator(&cmd),
            Category::Sensors => self.read_sensor(&cmd, time).await,
        }
    }

    fn apply_actuator(&self, cmd: &Command<'_>) -> Result<Acknowledgement, CommandError> {
        let actuator = self.registry.get_actuator(cmd.target).ok_or(CommandError::UnknownTarget)?;
        let action = ActuatorAction::parse(cmd.action).ok_or(CommandError::UnsupportedAction)?;
        match action {
            ActuatorAction::On => actuator.on(),
            ActuatorAction::Off => actuator.off(),
            ActuatorAction::Toggle => actuator.toggle(),
        }
        let state = actuator.state();
        info!("Router: {} -> {:?} ({})", cmd.target, action, state.as_str());
        self.ack(&ActuatorAck { actuator: cmd.target, data: StateData { state } })
    }

    async fn read_sensor<T: TimePort>(
        &self,
        cmd: &Command<'_>,
        time: &T,
    ) -> Result<Acknowledgement, CommandError> {
        let sensor = self.registry.get_sensor(cmd.target).ok_or(CommandError::UnknownTarget)?;
        if !is_sensor_read(cmd.action) {
            return Err(CommandError::UnsupportedAction);
        }
        let readings = sensor.read(time).await.ok_or(CommandError::SensorUnavailable)?;
        self.ack(&SensorAck { sensor: cmd.target, data: &readings })
    }

    fn ack<B: Serialize>(&self, body: &B) -> Result<Acknowledgement, CommandError> {
        let payload = serde_json::to_vec(body).map_err(|_| CommandError::Encoding)?;
        Ok(Acknowledgement { topic: self.data_topic.clone(), payload })
    }
}
