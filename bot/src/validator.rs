use crate::types::{Command, Mode, HIGH_LEVEL};

fn normalized(value: f32) -> bool {
    value > -1.0 && value < 1.0
}

/// Safety gate applied to every command before it reaches the robot.
///
/// Lights are not checked: any color is forwarded as is.
pub fn validate(cmd: &Command) -> bool {
    cmd.level_flag == HIGH_LEVEL
        && matches!(cmd.mode, Mode::Rotation | Mode::Locomotion)
        && normalized(cmd.forward_speed)
        && normalized(cmd.side_speed)
        && normalized(cmd.rotate_speed)
        && normalized(cmd.body_height)
        && normalized(cmd.yaw)
        && normalized(cmd.pitch)
        && normalized(cmd.roll)
}
