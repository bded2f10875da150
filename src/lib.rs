pub mod backend;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod extract;
pub mod gate;
pub mod order;
pub mod policy;
pub mod service;
pub mod store;
pub mod utils;
