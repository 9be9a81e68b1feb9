// Numeric constants shared across the pipeline.

/// Absolute address of the first instruction word of every output.
pub const LOAD_BASE: i64 = 100;

/// Inclusive bounds on an immediate operand: signed 21-bit.
pub const IMMEDIATE_MIN: i64 = -(1 << 20);
pub const IMMEDIATE_MAX: i64 = (1 << 20) - 1;

/// Inclusive bounds on a `.data` value: signed 24-bit.
pub const DATA_MIN: i64 = -(1 << 23);
pub const DATA_MAX: i64 = (1 << 23) - 1;

/// ARE tag values.
pub const ARE_ABSOLUTE: i64 = 4;
pub const ARE_RELOCATABLE: i64 = 2;
pub const ARE_EXTERNAL: i64 = 1;
