#![allow(clippy::nursery)] // Test infra prioritizes clarity over pedantry
#![allow(clippy::pedantic)] // Test infra prioritizes clarity over pedantry
#![allow(dead_code)] // Each test binary uses a different subset

pub mod fixture;
pub mod logs;

pub use fixture::Fixture;
pub use logs::capture_warnings;
