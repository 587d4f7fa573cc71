//! Tipos compartilhados do goldfile.

pub mod array;
pub mod config;
pub mod errors;
pub mod outcome;

pub use array::{ArrayData, Dtype, Element, NdArray};
pub use outcome::{CacheOutcome, SlotInfo};
