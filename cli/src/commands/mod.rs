pub mod check;
pub mod config;
pub mod seed;
pub mod serve;
