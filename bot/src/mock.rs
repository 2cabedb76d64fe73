//! Simulated robot, used when no hardware link is available.

use std::f32::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, Result};
use glam::Quat;

use crate::instruction::MAX_OMEGA;
use crate::transport::{CommandSink, TelemetrySource};
use crate::types::{Command, Mode, Telemetry};

struct Robot {
    cmd: Command,
    yaw: f32,
    dt: f32,
}

impl Robot {
    fn advance(&mut self) -> Telemetry {
        let mut telemetry = Telemetry {
            mode: self.cmd.mode,
            body_height: self.cmd.body_height,
            ..Default::default()
        };
        match self.cmd.mode {
            Mode::Rotation => {
                telemetry.rotate_speed = self.cmd.rotate_speed;
                self.yaw += self.cmd.rotate_speed * MAX_OMEGA * self.dt;
                if self.yaw > PI {
                    self.yaw -= 2.0 * PI;
                } else if self.yaw <= -PI {
                    self.yaw += 2.0 * PI;
                }
            },
            Mode::Locomotion => {
                telemetry.forward_speed = self.cmd.forward_speed;
                telemetry.side_speed = self.cmd.side_speed;
            },
            Mode::Idle => (),
        }
        // Yaw is read around the sensor x axis
        telemetry.imu.quaternion = Quat::from_rotation_x(self.yaw);
        telemetry
    }
}

/// A robot that turns as commanded.
///
/// Every telemetry read advances the simulation by one period.
pub struct SimulatedRobot {
    inner: Arc<Mutex<Robot>>,
}

impl SimulatedRobot {
    pub fn new(period: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Robot {
                cmd: Command::default(),
                yaw: 0.0,
                dt: period.as_secs_f32(),
            })),
        }
    }

    /// Splits the robot into the receive and send ends of its link.
    pub fn split(self) -> (SimulatedTelemetry, SimulatedCommands) {
        (
            SimulatedTelemetry {
                inner: Arc::clone(&self.inner),
            },
            SimulatedCommands {
                inner: self.inner,
            },
        )
    }
}

fn lock(robot: &Mutex<Robot>) -> Result<MutexGuard<'_, Robot>> {
    robot.lock().map_err(|_| anyhow!("Simulated robot state poisoned"))
}

pub struct SimulatedTelemetry {
    inner: Arc<Mutex<Robot>>,
}

impl TelemetrySource for SimulatedTelemetry {
    fn receive(&mut self) -> Result<Option<Telemetry>> {
        Ok(Some(lock(&self.inner)?.advance()))
    }
}

pub struct SimulatedCommands {
    inner: Arc<Mutex<Robot>>,
}

impl CommandSink for SimulatedCommands {
    fn send(&mut self, cmd: &Command) -> Result<()> {
        lock(&self.inner)?.cmd = *cmd;
        Ok(())
    }
}
