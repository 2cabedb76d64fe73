//! Motion primitives.
//!
//! An [`Instruction`] is evaluated every control tick against the telemetry
//! captured when it started and the latest telemetry. It produces the command
//! for this tick and tells the queue whether it is finished.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Command, Led, Mode, Telemetry};

/// Highest forward velocity
pub const MAX_FORWARD: f32 = 1.0;
/// Highest backward velocity (magnitude)
pub const MAX_BACKWARD: f32 = 0.7;
/// Highest side velocity (magnitude)
pub const MAX_SIDE: f32 = 0.4;
/// Highest angular rate (magnitude) in rad/s
pub const MAX_OMEGA: f32 = 2.0 * PI / 3.0;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum InstructionError {
    #[error("forward velocity {0} outside of (-0.7, 1)")]
    ForwardVelocity(f32),
    #[error("side velocity {0} outside of (-0.4, 0.4)")]
    SideVelocity(f32),
    #[error("angular rate {0} rad/s outside of (-2π/3, 2π/3)")]
    AngularRate(f32),
    #[error("expected 4 indicator colors, got {0}")]
    IndicatorCount(usize),
}

/// How a rotation decides it reached its target angle.
#[derive(Serialize, Deserialize, Default, Copy, Clone, Debug, PartialEq)]
#[serde(tag = "policy", content = "band", rename_all = "snake_case")]
pub enum RotationCompletion {
    /// Yaw change must be exactly the target angle.
    ///
    /// Sensor derived angles rarely hit the target exactly, so a rotation
    /// using this policy may never finish.
    #[default]
    Exact,
    /// Yaw change must be within the band (radians) around the target angle,
    /// modulo a full turn
    Tolerance(f32),
}

/// Wraps an angle into (-pi, pi].
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

impl RotationCompletion {
    fn reached(&self, delta: f32, theta: f32) -> bool {
        match *self {
            RotationCompletion::Exact => delta == theta,
            RotationCompletion::Tolerance(band) => wrap_angle(delta - theta).abs() <= band,
        }
    }
}

/// Result of one instruction evaluation
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InstructionOutput {
    pub cmd: Command,
    pub done: bool,
}

/// A single motion step.
///
/// Build instructions with the associated constructors, they reject
/// parameters outside of the robot operating envelope.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Walk along the forward axis
    MoveForward {
        distance: f32,
        velocity: f32,
    },
    /// Walk along the side axis
    MoveSide {
        distance: f32,
        velocity: f32,
    },
    /// Walk with both side (x) and forward (y) velocities
    Move {
        position: Vec2,
        velocity: Vec2,
    },
    /// Turn on the spot by `theta` radians at `omega` rad/s
    Rotate {
        theta: f32,
        omega: f32,
        completion: RotationCompletion,
    },
    /// Set the corner lights
    SetIndicator {
        colors: [Led; 4],
    },
}

pub(crate) fn check_forward(velocity: f32) -> Result<(), InstructionError> {
    if velocity > -MAX_BACKWARD && velocity < MAX_FORWARD {
        Ok(())
    } else {
        Err(InstructionError::ForwardVelocity(velocity))
    }
}

pub(crate) fn check_side(velocity: f32) -> Result<(), InstructionError> {
    if velocity > -MAX_SIDE && velocity < MAX_SIDE {
        Ok(())
    } else {
        Err(InstructionError::SideVelocity(velocity))
    }
}

pub(crate) fn check_omega(omega: f32) -> Result<(), InstructionError> {
    if omega > -MAX_OMEGA && omega < MAX_OMEGA {
        Ok(())
    } else {
        Err(InstructionError::AngularRate(omega))
    }
}

/// Backward velocities are rescaled so that both directions span the same
/// command range.
fn forward_speed(velocity: f32) -> f32 {
    if velocity < 0.0 {
        velocity / MAX_BACKWARD
    } else {
        velocity
    }
}

impl Instruction {
    pub fn move_forward(distance: f32, velocity: f32) -> Result<Self, InstructionError> {
        check_forward(velocity)?;
        Ok(Self::MoveForward {
            distance,
            velocity,
        })
    }

    pub fn move_side(distance: f32, velocity: f32) -> Result<Self, InstructionError> {
        check_side(velocity)?;
        Ok(Self::MoveSide {
            distance,
            velocity,
        })
    }

    pub fn move_vector(position: Vec2, velocity: Vec2) -> Result<Self, InstructionError> {
        check_side(velocity.x)?;
        check_forward(velocity.y)?;
        Ok(Self::Move {
            position,
            velocity,
        })
    }

    pub fn rotate(theta: f32, omega: f32, completion: RotationCompletion) -> Result<Self, InstructionError> {
        check_omega(omega)?;
        Ok(Self::Rotate {
            theta,
            omega,
            completion,
        })
    }

    pub fn set_indicator(colors: &[Led]) -> Result<Self, InstructionError> {
        let colors = <[Led; 4]>::try_from(colors).map_err(|_| InstructionError::IndicatorCount(colors.len()))?;
        Ok(Self::SetIndicator {
            colors,
        })
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MoveForward {
                ..
            } => "move_forward",
            Self::MoveSide {
                ..
            } => "move_side",
            Self::Move {
                ..
            } => "move",
            Self::Rotate {
                ..
            } => "rotate",
            Self::SetIndicator {
                ..
            } => "set_indicator",
        }
    }

    /// Computes the command for this tick.
    ///
    /// `initial` is the telemetry captured on the first tick of this
    /// instruction, `current` the latest one. Walking and light instructions
    /// are open loop and finish on their first tick.
    pub fn evaluate(&self, initial: &Telemetry, current: &Telemetry) -> InstructionOutput {
        let mut cmd = Command::default();
        let done = match *self {
            Self::MoveForward {
                velocity,
                ..
            } => {
                cmd.mode = Mode::Locomotion;
                cmd.forward_speed = forward_speed(velocity);
                true
            },
            Self::MoveSide {
                velocity,
                ..
            } => {
                cmd.mode = Mode::Locomotion;
                cmd.side_speed = velocity;
                true
            },
            Self::Move {
                velocity,
                ..
            } => {
                cmd.mode = Mode::Locomotion;
                cmd.side_speed = velocity.x;
                cmd.forward_speed = velocity.y;
                true
            },
            Self::Rotate {
                theta,
                omega,
                completion,
            } => {
                cmd.mode = Mode::Rotation;
                cmd.rotate_speed = omega / MAX_OMEGA;
                let delta = current.attitude().yaw - initial.attitude().yaw;
                completion.reached(delta, theta)
            },
            Self::SetIndicator {
                colors,
            } => {
                cmd.led = colors;
                true
            },
        };
        InstructionOutput {
            cmd,
            done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn facing(yaw: f32) -> Telemetry {
        let mut telemetry = Telemetry::default();
        telemetry.imu.quaternion = Quat::from_rotation_x(yaw);
        telemetry
    }

    #[test]
    fn test_move_forward_speed() {
        let still = Telemetry::default();

        let out = Instruction::move_forward(1.0, -0.5).unwrap().evaluate(&still, &still);
        assert_eq!(out.cmd.mode, Mode::Locomotion);
        assert_eq!(out.cmd.forward_speed, -0.5 / 0.7);
        assert!((out.cmd.forward_speed + 0.714).abs() < 1e-3);
        assert!(out.done);

        let out = Instruction::move_forward(1.0, 0.5).unwrap().evaluate(&still, &still);
        assert_eq!(out.cmd.mode, Mode::Locomotion);
        assert_eq!(out.cmd.forward_speed, 0.5);
        assert!(out.done);
    }

    #[test]
    fn test_move_forward_envelope() {
        assert!(Instruction::move_forward(1.0, 0.99).is_ok());
        assert!(Instruction::move_forward(1.0, -0.69).is_ok());
        assert_eq!(Instruction::move_forward(1.0, 1.0), Err(InstructionError::ForwardVelocity(1.0)));
        assert_eq!(Instruction::move_forward(1.0, -0.7), Err(InstructionError::ForwardVelocity(-0.7)));
        assert!(Instruction::move_forward(1.0, f32::NAN).is_err());
    }

    #[test]
    fn test_move_side() {
        let still = Telemetry::default();
        let out = Instruction::move_side(2.0, -0.3).unwrap().evaluate(&still, &still);
        assert_eq!(out.cmd.mode, Mode::Locomotion);
        assert_eq!(out.cmd.side_speed, -0.3);
        assert_eq!(out.cmd.forward_speed, 0.0);
        assert!(out.done);

        assert_eq!(Instruction::move_side(2.0, 0.4), Err(InstructionError::SideVelocity(0.4)));
        assert_eq!(Instruction::move_side(2.0, -0.4), Err(InstructionError::SideVelocity(-0.4)));
    }

    #[test]
    fn test_move_vector() {
        let still = Telemetry::default();
        let out = Instruction::move_vector(Vec2::new(1.0, 2.0), Vec2::new(0.2, -0.5))
            .unwrap()
            .evaluate(&still, &still);
        assert_eq!(out.cmd.mode, Mode::Locomotion);
        assert_eq!(out.cmd.side_speed, 0.2);
        // No backward rescaling for vector moves
        assert_eq!(out.cmd.forward_speed, -0.5);
        assert!(out.done);

        assert_eq!(
            Instruction::move_vector(Vec2::ZERO, Vec2::new(0.5, 0.0)),
            Err(InstructionError::SideVelocity(0.5))
        );
        assert_eq!(
            Instruction::move_vector(Vec2::ZERO, Vec2::new(0.0, -0.8)),
            Err(InstructionError::ForwardVelocity(-0.8))
        );
    }

    #[test]
    fn test_rotate_command() {
        let rotate = Instruction::rotate(1.0, PI / 3.0, RotationCompletion::Exact).unwrap();
        let out = rotate.evaluate(&facing(0.0), &facing(0.2));
        assert_eq!(out.cmd.mode, Mode::Rotation);
        assert!((out.cmd.rotate_speed - 0.5).abs() < 1e-6);
        assert!(!out.done);

        assert!(Instruction::rotate(1.0, MAX_OMEGA, RotationCompletion::Exact).is_err());
        assert!(Instruction::rotate(1.0, -MAX_OMEGA, RotationCompletion::Exact).is_err());
    }

    #[test]
    fn test_rotate_exact_completion() {
        let rotate = Instruction::rotate(0.0, 0.5, RotationCompletion::Exact).unwrap();
        let start = facing(0.3);
        assert!(rotate.evaluate(&start, &start).done);
        assert!(!rotate.evaluate(&start, &facing(0.3001)).done);

        let rotate = Instruction::rotate(0.5, 0.5, RotationCompletion::Exact).unwrap();
        for yaw in [0.0, 0.1, 0.25, 0.4999] {
            assert!(!rotate.evaluate(&facing(0.0), &facing(yaw)).done);
        }
    }

    #[test]
    fn test_rotate_tolerance_completion() {
        let rotate = Instruction::rotate(0.5, 0.5, RotationCompletion::Tolerance(1e-3)).unwrap();
        assert!(!rotate.evaluate(&facing(0.0), &facing(0.4)).done);
        assert!(rotate.evaluate(&facing(0.0), &facing(0.5)).done);
        assert!(rotate.evaluate(&facing(0.2), &facing(0.7)).done);
    }

    #[test]
    fn test_rotate_tolerance_negative_target() {
        let rotate = Instruction::rotate(-0.8, -0.5, RotationCompletion::Tolerance(1e-3)).unwrap();
        assert!(!rotate.evaluate(&facing(0.3), &facing(0.0)).done);
        assert!(rotate.evaluate(&facing(0.3), &facing(-0.5)).done);
        assert!(!rotate.evaluate(&facing(0.3), &facing(1.1)).done);
    }

    #[test]
    fn test_rotate_tolerance_across_half_turn() {
        // Left turn from 3.0 rad lands at 3.0 + 0.5 - 2pi
        let rotate = Instruction::rotate(0.5, 0.5, RotationCompletion::Tolerance(1e-3)).unwrap();
        assert!(!rotate.evaluate(&facing(3.0), &facing(3.1)).done);
        assert!(!rotate.evaluate(&facing(3.0), &facing(-3.0)).done);
        assert!(rotate.evaluate(&facing(3.0), &facing(3.5 - 2.0 * PI)).done);

        // Right turn from -3.0 rad lands at -3.0 - 0.5 + 2pi
        let rotate = Instruction::rotate(-0.5, -0.5, RotationCompletion::Tolerance(1e-3)).unwrap();
        assert!(!rotate.evaluate(&facing(-3.0), &facing(3.0)).done);
        assert!(rotate.evaluate(&facing(-3.0), &facing(2.0 * PI - 3.5)).done);
    }

    #[test]
    fn test_rotate_exact_is_not_wrapped() {
        assert!(!RotationCompletion::Exact.reached(2.0 * PI, 0.0));
        assert!(RotationCompletion::Tolerance(1e-3).reached(2.0 * PI, 0.0));
    }

    #[test]
    fn test_wrap_angle() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert!((wrap_angle(2.0 * PI + 0.25) - 0.25).abs() < 1e-5);
        assert!((wrap_angle(-2.0 * PI - 0.25) + 0.25).abs() < 1e-5);
        assert!((wrap_angle(3.5) - (3.5 - 2.0 * PI)).abs() < 1e-5);
        for angle in [-7.0f32, -PI, -1.0, PI, 4.0, 10.0] {
            let wrapped = wrap_angle(angle);
            assert!(wrapped > -PI && wrapped <= PI, "{} wrapped to {}", angle, wrapped);
        }
    }

    #[test]
    fn test_set_indicator() {
        let colors = [Led::new(255, 0, 0), Led::new(0, 255, 0), Led::new(0, 0, 255), Led::new(1, 2, 3)];
        let still = Telemetry::default();
        let out = Instruction::set_indicator(&colors).unwrap().evaluate(&still, &still);
        assert_eq!(out.cmd.led, colors);
        assert_eq!(out.cmd.mode, Mode::Idle);
        assert!(out.done);

        assert_eq!(Instruction::set_indicator(&colors[..3]), Err(InstructionError::IndicatorCount(3)));
        assert_eq!(Instruction::set_indicator(&[]), Err(InstructionError::IndicatorCount(0)));
    }
}
