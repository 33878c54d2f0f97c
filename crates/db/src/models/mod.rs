pub mod asset;
pub mod farm;
pub mod finance_movement;
pub mod map_feature;
pub mod task;
pub mod user;
