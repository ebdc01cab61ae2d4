pub mod migrate;
pub mod onboard;
pub mod sample;
