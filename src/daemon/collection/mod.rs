pub mod activity;
pub mod sampler;
