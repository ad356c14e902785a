//! Host-side behaviour tests for the pulse upsampler


mod control_tests;
mod property_tests;

pub use session::{Session, SessionLog, Stimulus};
