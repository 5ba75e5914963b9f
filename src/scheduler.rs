//! Cooperative task runtime.
//!
//! Four never-ending tasks share one single-threaded
//! `edge_executor::LocalExecutor`, driven by `futures_lite::future::block_on`.
//! Tasks yield only at their timed waits; GPIO and ADC access never
//! suspends.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  block_on(executor.run(pending))                               │
//! │  ┌──────────────┐ ┌──────────────┐ ┌────────────┐ ┌──────────┐ │
//! │  │ button-poll  │ │ telemetry    │ │ inbound    │ │ keepalive│ │
//! │  │ 20 ms ⏱      │ │ 10 s ⏱       │ │ 100 ms ⏱   │ │ 30 s ⏱   │ │
//! │  └──────┬───────┘ └──────┬───────┘ └─────┬──────┘ └────┬─────┘ │
//! │         │ toggle         │ read all      │ route       │ retry │
//! │         ▼                ▼               ▼             ▼       │
//! │   DeviceRegistry (Rc) ◀──────── CommandRouter    Network/PubSub│
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shared state lives in `RefCell`s owned by the [`Runtime`]; no borrow
//! is held across an `.await`.  Every per-cycle failure is logged and the
//! cycle skipped; tasks never terminate.

use core::cell::{OnceCell, RefCell};
use core::time::Duration;
use std::rc::Rc;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ConnectivityPort, EventSink, InboundMessage, PubSubPort, TimePort};
use crate::app::router::{CommandRouter, RouteOutcome};
use crate::app::telemetry;
use crate::config::TimingConfig;
use crate::drivers::button::Debouncer;
use crate::drivers::watchdog::TaskWatchdog;
use crate::error::TransportError;
use crate::registry::DeviceRegistry;

/// Executor task slots: four runtime tasks plus headroom.
pub const TASK_SLOTS: usize = 8;

pub type Executor<'a> = edge_executor::LocalExecutor<'a, TASK_SLOTS>;

/// Reset timeout of the runtime thread's task watchdog.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `connect_broker` waits for the broker to accept a session.
pub const BROKER_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const BROKER_CONNECT_POLL: Duration = Duration::from_millis(50);

fn millis(ms: u32) -> Duration {
    Duration::from_millis(u64::from(ms))
}

pub struct Runtime<N, P, T, S> {
    client_id: String,
    telemetry_topic: String,
    registry: Rc<DeviceRegistry>,
    router: CommandRouter,
    timing: TimingConfig,
    debouncers: RefCell<Vec<Debouncer>>,
    network: RefCell<N>,
    transport: RefCell<P>,
    time: T,
    sink: RefCell<S>,
    /// Armed by `spawn`, on the thread that runs the executor.
    watchdog: OnceCell<TaskWatchdog>,
}

impl<N, P, T, S> Runtime<N, P, T, S>
where
    N: ConnectivityPort,
    P: PubSubPort,
    T: TimePort,
    S: EventSink,
{
    pub fn new(
        client_id: &str,
        registry: Rc<DeviceRegistry>,
        timing: TimingConfig,
        network: N,
        transport: P,
        time: T,
        sink: S,
    ) -> Self {
        let debouncers =
            registry.buttons().iter().map(|_| Debouncer::new(timing.debounce_ms)).collect();
        Self {
            client_id: client_id.to_owned(),
            telemetry_topic: format!("{client_id}/telemetry"),
            router: CommandRouter::new(registry.clone(), client_id),
            registry,
            timing,
            debouncers: RefCell::new(debouncers),
            network: RefCell::new(network),
            transport: RefCell::new(transport),
            time,
            sink: RefCell::new(sink),
            watchdog: OnceCell::new(),
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn network(&self) -> &RefCell<N> {
        &self.network
    }

    pub fn transport(&self) -> &RefCell<P> {
        &self.transport
    }

    pub fn time(&self) -> &T {
        &self.time
    }

    pub fn sink(&self) -> &RefCell<S> {
        &self.sink
    }

    /// `None` until the tasks are spawned.
    pub fn watchdog(&self) -> Option<&TaskWatchdog> {
        self.watchdog.get()
    }

    fn emit(&self, event: AppEvent) {
        self.sink.borrow_mut().emit(&event);
    }

    // ── Button poll ───────────────────────────────────────────

    /// One scan over every button in registry order.  Returns the number
    /// of accepted presses.
    pub fn poll_buttons(&self) -> usize {
        let now = self.time.uptime_ms();
        let mut debouncers = self.debouncers.borrow_mut();
        let mut presses = 0;
        for (button, debouncer) in self.registry.buttons().iter().zip(debouncers.iter_mut()) {
            if !debouncer.update(button.is_pressed(), now) {
                continue;
            }
            presses += 1;
            let state = self.registry.get_actuator(button.target()).map(|actuator| {
                actuator.toggle();
                actuator.state()
            });
            self.emit(AppEvent::ButtonPressed {
                button: button.id().to_owned(),
                target: button.target().to_owned(),
                state,
            });
        }
        presses
    }

    pub async fn button_task(&self) {
        loop {
            self.poll_buttons();
            if let Some(wdt) = self.watchdog.get() {
                wdt.feed();
            }
            self.time.sleep(millis(self.timing.button_poll_interval_ms)).await;
        }
    }

    // ── Telemetry ─────────────────────────────────────────────

    /// Read everything and publish one snapshot.  Returns `true` if a
    /// payload was handed to the transport.
    pub async fn publish_telemetry(&self) -> bool {
        if !self.transport.borrow().is_connected() {
            info!("Telemetry: broker offline, cycle skipped");
            self.emit(AppEvent::TelemetrySkipped);
            return false;
        }

        let snapshot = telemetry::collect(&self.registry, &self.time).await;
        let payload = match snapshot.encode() {
            Ok(p) => p,
            Err(e) => {
                warn!("Telemetry: encoding failed: {}", e);
                return false;
            }
        };

        let res = self.transport.borrow_mut().publish(&self.telemetry_topic, &payload);
        match res {
            Ok(()) => {
                self.emit(AppEvent::TelemetryPublished {
                    sensors_read: snapshot.sensors_read,
                    sensors_failed: snapshot.sensors_failed,
                    bytes: payload.len(),
                });
                true
            }
            Err(error) => {
                self.emit(AppEvent::TransportFailure {
                    topic: Some(self.telemetry_topic.clone()),
                    error,
                });
                false
            }
        }
    }

    pub async fn telemetry_task(&self) {
        loop {
            self.publish_telemetry().await;
            self.time.sleep(Duration::from_secs(u64::from(self.timing.telemetry_interval_secs))).await;
        }
    }

    // ── Inbound commands ──────────────────────────────────────

    /// Route one message and publish its acknowledgement.
    pub async fn dispatch(&self, msg: &InboundMessage) -> RouteOutcome {
        let outcome = self.router.route(&msg.topic, &msg.payload, &self.time).await;
        if let RouteOutcome::Applied(ack) = &outcome {
            let res = self.transport.borrow_mut().publish(&ack.topic, &ack.payload);
            if let Err(error) = res {
                // The hardware action already happened; only the ack is lost.
                warn!("Router: ack on {} lost: {}", ack.topic, error);
                self.emit(AppEvent::TransportFailure { topic: Some(ack.topic.clone()), error });
            }
        }
        self.emit(AppEvent::CommandRouted { topic: msg.topic.to_string(), outcome: outcome.clone() });
        outcome
    }

    /// Drain one batch from the transport.  Returns the batch size.
    pub async fn drain_inbound(&self) -> usize {
        if !self.transport.borrow().is_connected() {
            return 0;
        }
        let batch = self.transport.borrow_mut().poll_incoming();
        for msg in &batch {
            self.dispatch(msg).await;
        }
        batch.len()
    }

    pub async fn inbound_task(&self) {
        loop {
            self.drain_inbound().await;
            self.time.sleep(millis(self.timing.inbound_poll_interval_ms)).await;
        }
    }

    // ── Keepalive ─────────────────────────────────────────────

    /// Initiate association, then probe the link up to
    /// `reconnect_attempts` times.  Returns `true` once the link is up.
    pub async fn connect_network(&self) -> bool {
        if self.network.borrow().is_connected() {
            return true;
        }
        let res = self.network.borrow_mut().connect();
        if let Err(e) = res {
            warn!("Keepalive: association request failed: {}", e);
            return false;
        }
        for _ in 0..self.timing.reconnect_attempts {
            if self.network.borrow().is_connected() {
                return true;
            }
            self.time.sleep(millis(self.timing.reconnect_poll_ms)).await;
        }
        self.network.borrow().is_connected()
    }

    /// Open the broker session if it is down, then wait up to
    /// [`BROKER_CONNECT_TIMEOUT`] for the broker to accept it.  Returns
    /// `true` when the session is up afterwards.
    pub async fn connect_broker(&self) -> bool {
        if self.transport.borrow().is_connected() {
            return true;
        }
        let res = self.transport.borrow_mut().connect();
        if let Err(error) = res {
            self.emit(AppEvent::TransportFailure { topic: None, error });
            return false;
        }
        let mut waited = Duration::ZERO;
        while !self.transport.borrow().is_connected() {
            if waited >= BROKER_CONNECT_TIMEOUT {
                warn!("Keepalive: broker silent for {:?}, session dropped", waited);
                self.transport.borrow_mut().disconnect();
                self.emit(AppEvent::TransportFailure {
                    topic: None,
                    error: TransportError::ConnectFailed,
                });
                return false;
            }
            self.time.sleep(BROKER_CONNECT_POLL).await;
            waited += BROKER_CONNECT_POLL;
        }
        info!("Keepalive: broker session up as '{}'", self.client_id);
        self.emit(AppEvent::BrokerConnected);
        true
    }

    /// One connectivity check: network first, then the broker session.
    pub async fn keepalive(&self) {
        if !self.network.borrow().is_connected() {
            self.emit(AppEvent::NetworkLost);
            if self.connect_network().await {
                self.emit(AppEvent::NetworkRestored);
            } else {
                self.emit(AppEvent::ReconnectFailed { attempts: self.timing.reconnect_attempts });
                return;
            }
        }
        self.connect_broker().await;
    }

    pub async fn keepalive_task(&self) {
        loop {
            self.keepalive().await;
            self.time.sleep(Duration::from_secs(u64::from(self.timing.keepalive_interval_secs))).await;
        }
    }

    // ── Executor wiring ───────────────────────────────────────

    /// Arm the task watchdog for the calling thread and spawn the four
    /// tasks onto `executor`.  The keepalive task's first pass brings the
    /// network and broker up.
    pub fn spawn<'a>(&'a self, executor: &Executor<'a>) {
        self.watchdog.get_or_init(|| TaskWatchdog::subscribe(WATCHDOG_TIMEOUT));
        self.emit(AppEvent::Started {
            client_id: self.client_id.clone(),
            actuators: self.registry.all_actuators().len(),
            sensors: self.registry.all_sensors().len(),
            buttons: self.registry.buttons().len(),
        });
        executor.spawn(self.button_task()).detach();
        executor.spawn(self.telemetry_task()).detach();
        executor.spawn(self.inbound_task()).detach();
        executor.spawn(self.keepalive_task()).detach();
    }

    /// Run the tasks on the calling thread.  Never returns.
    pub fn run(&self) {
        let executor: Executor<'_> = Executor::new();
        self.spawn(&executor);
        info!("Runtime: tasks spawned, entering executor");
        futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    }
}
