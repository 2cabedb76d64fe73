use glam::Quat;
use serde::{Deserialize, Serialize};

/// Value of [`Command::level_flag`] for high level (walking) commands
pub const HIGH_LEVEL: u8 = 0x00;

/// Locomotion mode requested from the robot
#[repr(u8)]
#[derive(Serialize, Deserialize, Default, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Left by a zero initialized command, never sent to the robot
    #[default]
    Idle = 0,
    /// Stand and turn on the spot
    Rotation = 1,
    /// Walk continuously
    Locomotion = 2,
}

/// Color of one of the four corner lights
#[repr(C)]
#[derive(Serialize, Deserialize, Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Led {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Led {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
        }
    }
}

/// Command sent to the robot for one control period.
///
/// Speeds and posture values are normalized: the robot only accepts values
/// strictly inside (-1, 1).
#[repr(C)]
#[derive(Serialize, Deserialize, Default, Copy, Clone, Debug, PartialEq)]
pub struct Command {
    /// Reserved, must stay [`HIGH_LEVEL`]
    pub level_flag: u8,
    pub mode: Mode,
    pub forward_speed: f32,
    pub side_speed: f32,
    pub rotate_speed: f32,
    pub body_height: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    /// Corner lights, not checked by the validator
    pub led: [Led; 4],
}

#[repr(C)]
#[derive(Serialize, Deserialize, Default, Copy, Clone, Debug, PartialEq)]
pub struct Imu {
    /// Unit quaternion reported by the IMU
    pub quaternion: Quat,
    pub gyroscope: [f32; 3],
    pub accelerometer: [f32; 3],
}

/// Robot state captured at one instant
#[repr(C)]
#[derive(Serialize, Deserialize, Default, Copy, Clone, Debug, PartialEq)]
pub struct Telemetry {
    pub imu: Imu,
    pub mode: Mode,
    pub forward_speed: f32,
    pub side_speed: f32,
    pub rotate_speed: f32,
    pub body_height: f32,
}

impl Telemetry {
    pub fn attitude(&self) -> Ypr {
        quat_to_ypr(self.imu.quaternion)
    }
}

#[derive(Serialize, Deserialize, Default, Copy, Clone, Debug, PartialEq)]
pub struct Ypr {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Converts the IMU quaternion into yaw, pitch and roll (radians).
pub fn quat_to_ypr(q: Quat) -> Ypr {
    // The IMU is mounted so that the body vertical axis is the sensor x axis,
    // hence yaw is taken around x.
    let [x, y, z, w] = q.to_array().map(f64::from);
    Ypr {
        yaw: f64::atan2(2.0 * (y * z + w * x), w * w - x * x - y * y + z * z) as f32,
        pitch: f64::asin((-2.0 * (x * z - w * y)).clamp(-1.0, 1.0)) as f32,
        roll: f64::atan2(2.0 * (x * y + w * z), w * w + x * x - y * y - z * z) as f32,
    }
}
