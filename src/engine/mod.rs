pub mod compatibility;
pub mod filter;
pub mod matcher;
pub mod sequencer;
