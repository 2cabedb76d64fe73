use std::sync::mpsc::{Receiver, Sender};

use crate::queue::InstructionQueue;
use crate::types::{Command, Telemetry};
use crate::validator::validate;

/// One robot session: the motion program and both ends of the telemetry /
/// command exchange with the transport.
pub struct Bot {
    queue: InstructionQueue,
    telemetry_rx: Receiver<Telemetry>,
    command_tx: Sender<Command>,
    /// Latest telemetry received
    telemetry: Option<Telemetry>,
}

impl Bot {
    pub fn new(queue: InstructionQueue, telemetry_rx: Receiver<Telemetry>, command_tx: Sender<Command>) -> Self {
        Self {
            queue,
            telemetry_rx,
            command_tx,
            telemetry: None,
        }
    }

    pub fn queue(&self) -> &InstructionQueue {
        &self.queue
    }

    /// Control tick.
    ///
    /// Never waits for telemetry: the latest snapshot received so far is
    /// used. Returns the command staged for transmission, if any. An invalid
    /// command is dropped but the queue still advances.
    #[cfg_attr(feature = "profiling", function_timer::time)]
    pub fn tick(&mut self) -> Option<Command> {
        if let Some(telemetry) = self.telemetry_rx.try_iter().last() {
            self.telemetry = Some(telemetry);
        }
        let telemetry = self.telemetry?;

        let cmd = self.queue.step(&telemetry)?;
        if validate(&cmd) {
            // Only fails once the send activity is gone
            let _ = self.command_tx.send(cmd);
            Some(cmd)
        } else {
            log::warn!("Dropping invalid command {:?}", cmd);
            None
        }
    }
}
