pub mod consistency;
pub mod health;
pub mod metrics;
pub mod text;

/// Sampling temperature for the two free-text operations.
pub const TEXT_TEMPERATURE: f32 = 0.2;
