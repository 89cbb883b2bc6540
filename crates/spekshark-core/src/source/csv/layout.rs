pub const START_TIME_COLUMN: usize = 0;
pub const END_TIME_COLUMN: usize = 1;
pub const DATA_COLUMN: usize = 2;

pub const MIN_COLUMNS: usize = 3;
