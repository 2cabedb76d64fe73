//! Ordered, single pass executor of [`Instruction`]s.

use glam::Vec2;

use crate::instruction::{check_forward, check_omega, Instruction, InstructionError, RotationCompletion};
use crate::types::{Command, Led, Telemetry};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// No instruction started yet at the current index
    Idle,
    /// The instruction at the current index is running
    Active,
    /// Every instruction reported completion
    Exhausted,
}

/// Queue of motion steps.
///
/// Steps are appended before the control loop starts and are consumed left
/// to right, each one exactly once. The queue only moves to the next step
/// when the current one reports it is done.
#[derive(Clone, Debug, Default)]
pub struct InstructionQueue {
    instructions: Vec<Instruction>,
    index: usize,
    /// Telemetry captured on the first tick of the running instruction
    initial: Option<Telemetry>,
    rotation: RotationCompletion,
}

fn sgn(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl InstructionQueue {
    pub fn new(rotation: RotationCompletion) -> Self {
        Self {
            rotation,
            ..Default::default()
        }
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn move_along_forward_axis(&mut self, distance: f32, velocity: f32) -> Result<(), InstructionError> {
        self.push(Instruction::move_forward(distance, velocity)?);
        Ok(())
    }

    pub fn move_along_side_axis(&mut self, distance: f32, velocity: f32) -> Result<(), InstructionError> {
        self.push(Instruction::move_side(distance, velocity)?);
        Ok(())
    }

    pub fn move_vector(&mut self, position: Vec2, velocity: Vec2) -> Result<(), InstructionError> {
        self.push(Instruction::move_vector(position, velocity)?);
        Ok(())
    }

    pub fn rotate(&mut self, theta: f32, omega: f32) -> Result<(), InstructionError> {
        self.push(Instruction::rotate(theta, omega, self.rotation)?);
        Ok(())
    }

    /// Turns toward `position` then walks forward to it.
    ///
    /// Appends a rotation by the bearing of `position` followed by a forward
    /// move of its length. Nothing is appended if either step is rejected.
    pub fn smooth_move(&mut self, position: Vec2, velocity: f32, omega: f32) -> Result<(), InstructionError> {
        check_forward(velocity)?;
        check_omega(omega)?;
        let theta = position.y.atan2(position.x);
        let rotate = Instruction::rotate(theta, sgn(theta) * omega, self.rotation)?;
        let forward = Instruction::move_forward(position.length(), velocity)?;
        self.push(rotate);
        self.push(forward);
        Ok(())
    }

    pub fn set_indicator(&mut self, colors: &[Led]) -> Result<(), InstructionError> {
        self.push(Instruction::set_indicator(colors)?);
        Ok(())
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Index of the next instruction to run
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn initial_snapshot(&self) -> Option<&Telemetry> {
        self.initial.as_ref()
    }

    pub fn state(&self) -> SchedulerState {
        if self.index >= self.instructions.len() {
            SchedulerState::Exhausted
        } else if self.initial.is_some() {
            SchedulerState::Active
        } else {
            SchedulerState::Idle
        }
    }

    /// Advances the queue with the latest telemetry.
    ///
    /// Returns the command produced by the current instruction, or `None`
    /// once every instruction has completed.
    pub fn step(&mut self, telemetry: &Telemetry) -> Option<Command> {
        let instruction = self.instructions.get(self.index)?;
        let initial = match self.initial {
            Some(initial) => initial,
            None => {
                log::info!("Starting instruction {} ({})", self.index, instruction.kind());
                *self.initial.insert(*telemetry)
            },
        };

        let out = instruction.evaluate(&initial, telemetry);
        if out.done {
            log::info!("Instruction {} ({}) done", self.index, instruction.kind());
            self.initial = None;
            self.index += 1;
            if self.index == self.instructions.len() {
                log::info!("All {} instructions executed", self.index);
            }
        }
        Some(out.cmd)
    }
}
