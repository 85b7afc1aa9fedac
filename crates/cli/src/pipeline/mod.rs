//! Run statistics shared by the converting commands.

mod stats;

pub use stats::ConversionStats;
