pub mod hacker;
pub mod scan;
