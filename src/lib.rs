//! cuaca: resolve free-text city names against a fixed catalog and pass
//! BMKG data-cuaca weather documents through for the resolved city.

pub mod city;
pub mod config;
pub mod server;
pub mod upstream;
