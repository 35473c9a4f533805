//! Foundation utilities shared across the engine
//!
//! Contains the math types and the logging setup that every other module
//! builds on. Nothing in here touches the graphics driver.

pub mod logging;
pub mod math;
