//! Integration test crate for the reframing pipeline.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It drives reframe-ai over reframe-media sources and checks the
//! end-to-end guarantees of the box tracks.

#[cfg(test)]
mod support;

#[cfg(test)]
mod scenes;

#[cfg(test)]
mod reframe;

#[cfg(test)]
mod video;

#[cfg(test)]
mod properties;
