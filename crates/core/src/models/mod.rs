pub mod entry;
pub mod filter;
pub mod stats;
pub mod view;
