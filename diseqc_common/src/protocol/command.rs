//! Positioner command builders.
//!
//! Every command starts with the framing byte `0xE0` (master, no reply) and the
//! address `0x31` (any positioner), followed by the command byte and up to two
//! payload bytes.

use crate::consts::{
    ADDR_ANY_POSITIONER, CMD_DRIVE_EAST, CMD_DRIVE_WEST, CMD_GOTOX, CMD_HALT, CMD_LIMITS_OFF,
    CMD_STORE_POS, GOTOX_DIR_EAST, GOTOX_DIR_WEST, GOTOX_MAX_ANGLE, GOTOX_UNITS_PER_DEGREE,
    MASTER_NOREPLY, MAX_STEPS,
};
use crate::hal::types::CommandBytes;
use crate::protocol::status::DiseqcError;

/// Drive direction for continuous and stepped movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Positive angles.
    East,
    /// Negative angles.
    West,
}

impl Direction {
    /// Command byte for this direction.
    #[inline]
    pub const fn command_byte(&self) -> u8 {
        match self {
            Self::East => CMD_DRIVE_EAST,
            Self::West => CMD_DRIVE_WEST,
        }
    }
}

/// A positioner command before encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Stop movement.
    Halt,
    /// Disable software travel limits.
    LimitsOff,
    /// Drive continuously until Halt.
    Drive(Direction),
    /// Drive a number of steps (1–128).
    Step(Direction, u8),
    /// Store the current position in a slot.
    StorePosition(u8),
    /// Drive to an absolute angle [°] (clamped when encoded).
    GotoAngle(f32),
}

impl Command {
    /// Encode into raw frame bytes.
    ///
    /// `max_angle` bounds `GotoAngle`; other commands ignore it.
    ///
    /// # Errors
    /// `InvalidParam` for a step count of 0 or above 128.
    pub fn to_bytes(&self, max_angle: f32) -> Result<CommandBytes, DiseqcError> {
        let mut frame = [MASTER_NOREPLY, ADDR_ANY_POSITIONER, 0, 0, 0, 0];
        let len = match *self {
            Self::Halt => {
                frame[2] = CMD_HALT;
                3
            }
            Self::LimitsOff => {
                frame[2] = CMD_LIMITS_OFF;
                3
            }
            Self::Drive(dir) => {
                frame[2] = dir.command_byte();
                frame[3] = 0x00;
                4
            }
            Self::Step(dir, steps) => {
                validate_steps(steps)?;
                frame[2] = dir.command_byte();
                frame[3] = steps;
                4
            }
            Self::StorePosition(slot) => {
                frame[2] = CMD_STORE_POS;
                frame[3] = slot;
                4
            }
            Self::GotoAngle(angle) => {
                let [hi, lo] = gotox_payload(clamp_angle(angle, max_angle));
                frame[2] = CMD_GOTOX;
                frame[3] = hi;
                frame[4] = lo;
                5
            }
        };
        CommandBytes::from_slice(&frame[..len]).map_err(|_| DiseqcError::InvalidParam("frame length"))
    }
}

/// Reject step counts outside 1–128.
#[inline]
pub fn validate_steps(steps: u8) -> Result<(), DiseqcError> {
    if steps == 0 || steps > MAX_STEPS {
        return Err(DiseqcError::InvalidParam("steps must be 1-128"));
    }
    Ok(())
}

/// Clamp an angle into `[-max_angle, max_angle]`.
///
/// NaN maps to 0.0; angles are never rejected. The limit itself is capped to
/// what GotoX can carry, and a limit that is not a positive number pins every
/// angle to 0.0.
#[inline]
pub fn clamp_angle(angle: f32, max_angle: f32) -> f32 {
    if angle.is_nan() || max_angle.is_nan() || max_angle <= 0.0 {
        return 0.0;
    }
    let limit = max_angle.min(GOTOX_MAX_ANGLE);
    angle.clamp(-limit, limit)
}

/// GotoX payload for an already clamped angle.
///
/// Byte 0 carries the direction nibble (`0xD_` east, `0xE_` west) and the top
/// four bits of `round(16 · |angle|)`; byte 1 the low eight bits.
#[inline]
pub fn gotox_payload(angle: f32) -> [u8; 2] {
    let direction = if angle < 0.0 {
        GOTOX_DIR_WEST
    } else {
        GOTOX_DIR_EAST
    };
    let raw = (GOTOX_UNITS_PER_DEGREE * angle.abs()).round() as u16;
    [direction | ((raw >> 8) & 0x0F) as u8, (raw & 0xFF) as u8]
}
