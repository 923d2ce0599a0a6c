pub mod billing_period;
pub mod plan;
pub mod subscription;
pub mod usage;
