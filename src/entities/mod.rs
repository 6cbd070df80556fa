pub mod prelude;

pub mod hackers;
pub mod scans;
