pub mod core;
pub mod marks;
pub mod placements;
pub mod profiles;
pub mod ratings;
pub mod reports;
pub mod sessions;
pub mod students;
