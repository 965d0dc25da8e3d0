pub mod activity;
pub mod normalize;
pub mod note;
pub mod priority;
pub mod task;
