//! `tuklas-hal` – device seams for the scan flow.
//!
//! The scan pipeline never touches hardware directly. It captures through a
//! [`Camera`] and signals the learner through [`Haptics`]; front ends plug in
//! whatever device (or stand-in) they have.
//!
//! # Modules
//!
//! - [`camera`] – the [`Camera`] trait and a [`FileCamera`] that "photographs"
//!   an image file on disk.
//! - [`haptics`] – the [`Haptics`] trait, the [`Feedback`] patterns, and a
//!   [`LogHaptics`] sink that records feedback in the trace log.

pub mod camera;
pub mod haptics;

pub use camera::{Camera, CapturedImage, FileCamera};
pub use haptics::{Feedback, Haptics, LogHaptics};
