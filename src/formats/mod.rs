//! File format implementations

pub mod tiff;
