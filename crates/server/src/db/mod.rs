pub mod accounts;
pub mod matches;
pub mod moves;
pub mod pool;
