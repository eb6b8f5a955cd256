pub mod board;
pub mod labels;
pub mod models;
pub mod projection;
pub mod sync;

#[cfg(test)]
mod memory;
