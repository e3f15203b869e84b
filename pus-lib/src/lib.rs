#![doc = include_str!("../README.md")]

mod bytes;
mod error;

pub mod bits;
pub mod checksum;
pub mod dds;
pub mod packet;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};
