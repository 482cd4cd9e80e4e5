//! Actuator control.

pub mod duty_cycle;
