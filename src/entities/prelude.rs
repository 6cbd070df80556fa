pub use super::hackers::Entity as Hackers;
pub use super::scans::Entity as Scans;
