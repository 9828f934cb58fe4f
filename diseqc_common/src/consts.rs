//! System-wide constants for the DiSEqC workspace.
//!
//! Single source of truth for bit timings, buffer capacities and the DiSEqC 1.2
//! command bytes. Imported by all crates, no duplication permitted.

// ─── Bit Timing ─────────────────────────────────────────────────────

/// Nominal carrier frequency [Hz].
pub const CARRIER_FREQ_HZ: u32 = 22_000;

/// Bit `0`: carrier on [µs].
pub const BIT0_HIGH_US: u16 = 1000;

/// Bit `0`: carrier off [µs].
pub const BIT0_LOW_US: u16 = 500;

/// Bit `1`: carrier on [µs].
pub const BIT1_HIGH_US: u16 = 500;

/// Bit `1`: carrier off [µs].
pub const BIT1_LOW_US: u16 = 1000;

/// Duration of one transmitted bit, either polarity [µs].
pub const BIT_PERIOD_US: u32 = 1500;

// ─── Capacities ─────────────────────────────────────────────────────

/// Maximum number of bytes in one DiSEqC frame.
pub const MAX_FRAME_BYTES: usize = 6;

/// Bits on the wire per byte (8 data + 1 parity).
pub const BITS_PER_BYTE: usize = 9;

/// Segments per transmitted bit (carrier on, carrier off).
pub const SEGMENTS_PER_BIT: usize = 2;

/// Segments produced per encoded byte.
pub const SEGMENTS_PER_BYTE: usize = BITS_PER_BYTE * SEGMENTS_PER_BIT;

/// Capacity of the segment buffer (6 × 9 × 2 = 108).
pub const MAX_SEGMENTS: usize = MAX_FRAME_BYTES * SEGMENTS_PER_BYTE;

/// Upper bound on the replay time of the longest frame [µs].
pub const MAX_FRAME_DURATION_US: u32 = (MAX_FRAME_BYTES * BITS_PER_BYTE) as u32 * BIT_PERIOD_US;

// ─── Command Bytes ──────────────────────────────────────────────────

/// Framing: command from master, no reply required, first transmission.
pub const MASTER_NOREPLY: u8 = 0xE0;

/// Address: any positioner (azimuth or elevation).
pub const ADDR_ANY_POSITIONER: u8 = 0x31;

/// Drive motor to an absolute angle.
pub const CMD_GOTOX: u8 = 0x6E;

/// Stop positioner movement.
pub const CMD_HALT: u8 = 0x60;

/// Disable software limits.
pub const CMD_LIMITS_OFF: u8 = 0x63;

/// Drive east (payload 0x00 = continuous, otherwise step count).
pub const CMD_DRIVE_EAST: u8 = 0x68;

/// Drive west (payload 0x00 = continuous, otherwise step count).
pub const CMD_DRIVE_WEST: u8 = 0x69;

/// Store current position in a numbered slot.
pub const CMD_STORE_POS: u8 = 0x6A;

/// GotoX direction nibble for positive (east) angles.
pub const GOTOX_DIR_EAST: u8 = 0xD0;

/// GotoX direction nibble for negative (west) angles.
pub const GOTOX_DIR_WEST: u8 = 0xE0;

/// GotoX angle resolution: raw units per degree.
pub const GOTOX_UNITS_PER_DEGREE: f32 = 16.0;

/// Largest angle the 12-bit GotoX field can carry [°].
pub const GOTOX_MAX_ANGLE: f32 = 255.0;

/// Largest accepted step count for step commands.
pub const MAX_STEPS: u8 = 128;

// ─── Rotor Defaults ─────────────────────────────────────────────────

/// Default mechanical travel limit [°].
pub const DEFAULT_MAX_ANGLE: f32 = 80.0;

/// Default motor power-up delay before a command may be sent [ms].
pub const MOTOR_STARTUP_MS: u32 = 2000;

/// Default supervisor tick period [ms].
pub const TICK_INTERVAL_MS: u32 = 1;

/// Default PWM timer clock [Hz] (1 µs resolution).
pub const TIMER_CLOCK_HZ: u32 = 1_000_000;

/// Default carrier duty cycle (22 of 45 ticks).
pub const CARRIER_DUTY_CYCLE: f32 = 0.49;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/diseqc/rotor.toml";
