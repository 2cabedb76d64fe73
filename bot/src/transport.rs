//! Boundary with the link to the robot.
//!
//! The wire protocol lives behind [`TelemetrySource`] and [`CommandSink`].
//! [`RecvLoop`] and [`SendLoop`] are the bodies of the receive and send
//! activities, they talk to the control tick through channels only.

use std::sync::mpsc::{Receiver, Sender};

use anyhow::Result;

use crate::types::{Command, Telemetry};

pub trait TelemetrySource: Send {
    /// Returns the telemetry received since the last call, if any.
    fn receive(&mut self) -> Result<Option<Telemetry>>;
}

pub trait CommandSink: Send {
    fn send(&mut self, cmd: &Command) -> Result<()>;
}

pub struct RecvLoop<S: TelemetrySource> {
    source: S,
    telemetry_tx: Sender<Telemetry>,
}

impl<S: TelemetrySource> RecvLoop<S> {
    pub fn new(source: S, telemetry_tx: Sender<Telemetry>) -> Self {
        Self {
            source,
            telemetry_tx,
        }
    }

    pub fn tick(&mut self) -> Result<()> {
        if let Some(telemetry) = self.source.receive()? {
            let _ = self.telemetry_tx.send(telemetry);
        }
        Ok(())
    }
}

/// Sends the last staged command every period, until a newer one is staged.
pub struct SendLoop<S: CommandSink> {
    sink: S,
    command_rx: Receiver<Command>,
    staged: Option<Command>,
}

impl<S: CommandSink> SendLoop<S> {
    pub fn new(sink: S, command_rx: Receiver<Command>) -> Self {
        Self {
            sink,
            command_rx,
            staged: None,
        }
    }

    pub fn tick(&mut self) -> Result<()> {
        if let Some(cmd) = self.command_rx.try_iter().last() {
            self.staged = Some(cmd);
        }
        match &self.staged {
            Some(cmd) => self.sink.send(cmd),
            None => Ok(()),
        }
    }
}
