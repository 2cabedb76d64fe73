//! Motion program files.
//!
//! A program is a TOML document listing the motion steps in execution order:
//!
//! ```toml
//! [[step]]
//! kind = "move_forward"
//! distance = 1.0
//! velocity = 0.5
//!
//! [[step]]
//! kind = "smooth_move"
//! position = [1.0, 2.0]
//! velocity = 0.4
//! omega = 1.0
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::instruction::{InstructionError, RotationCompletion};
use crate::queue::InstructionQueue;
use crate::types::Led;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    MoveForward {
        distance: f32,
        velocity: f32,
    },
    MoveSide {
        distance: f32,
        velocity: f32,
    },
    Move {
        position: Vec2,
        velocity: Vec2,
    },
    Rotate {
        theta: f32,
        omega: f32,
    },
    SmoothMove {
        position: Vec2,
        velocity: f32,
        omega: f32,
    },
    SetIndicator {
        colors: Vec<Led>,
    },
}

impl Step {
    pub fn append_to(&self, queue: &mut InstructionQueue) -> Result<(), InstructionError> {
        match self {
            Step::MoveForward {
                distance,
                velocity,
            } => queue.move_along_forward_axis(*distance, *velocity),
            Step::MoveSide {
                distance,
                velocity,
            } => queue.move_along_side_axis(*distance, *velocity),
            Step::Move {
                position,
                velocity,
            } => queue.move_vector(*position, *velocity),
            Step::Rotate {
                theta,
                omega,
            } => queue.rotate(*theta, *omega),
            Step::SmoothMove {
                position,
                velocity,
                omega,
            } => queue.smooth_move(*position, *velocity, *omega),
            Step::SetIndicator {
                colors,
            } => queue.set_indicator(colors),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Program {
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

impl Program {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Cannot open program {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Cannot parse program {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Builds the instruction queue, checking every step against the robot
    /// operating envelope.
    pub fn build(&self, rotation: RotationCompletion) -> Result<InstructionQueue> {
        let mut queue = InstructionQueue::new(rotation);
        for (index, step) in self.steps.iter().enumerate() {
            step.append_to(&mut queue).with_context(|| format!("Invalid step {}: {:?}", index, step))?;
        }
        Ok(queue)
    }
}
