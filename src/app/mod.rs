//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules of the irrigation controller:
//! the decision-service contract and the per-cycle orchestration.  All
//! interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod decision;
pub mod events;
pub mod ports;
pub mod service;
