/// A telemetry packet is always 16 serial bytes: 2 header + 7 channel pairs.
pub const PACKET_FRAMES: usize = 16;
pub const HEADER_FRAMES: usize = 2;
pub const CHANNEL_SLOTS: usize = 7;

/// Inter-frame gap above which the stream has lost packet framing.
pub const MAX_FRAME_GAP_S: f64 = 0.002;

/// System-byte values reported by internal receivers.
pub const SYSTEM_DSM2_1024: u8 = 0x01;
pub const SYSTEM_DSM2_2048: u8 = 0x12;
pub const SYSTEM_DSMX_22MS: u8 = 0xA2;
pub const SYSTEM_DSMX_11MS: u8 = 0xB2;

// Channel word bit layouts from the datasheet.
pub const POSITION_MASK_1024: u16 = 0x03FF;
pub const CHANNEL_ID_SHIFT_1024: u16 = 10;
pub const CHANNEL_ID_MASK_1024: u16 = 0x3F;

pub const POSITION_MASK_2048: u16 = 0x07FF;
pub const CHANNEL_ID_SHIFT_2048: u16 = 11;
pub const CHANNEL_ID_MASK_2048: u16 = 0x0F;
pub const PHASE_SHIFT_2048: u16 = 15;

/// Logical channel assignment by id; ids beyond this table are reported
/// with `UNKNOWN_CHANNEL_NAME`.
pub const CHANNEL_NAMES: [&str; 12] = [
    "Throttle", "Aileron", "Elevator", "Rudder", "Gear", "Aux 1", "Aux 2", "Aux 3", "Aux 4",
    "Aux 5", "Aux 6", "Aux 7",
];

pub const UNKNOWN_CHANNEL_NAME: &str = "NOT_IDENTIFIED";
