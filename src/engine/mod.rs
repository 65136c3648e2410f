pub mod assignment;
pub mod builder;
pub mod eligibility;
pub mod intent;
pub mod scheduler;
pub mod scoring;
pub mod validation;
pub mod workload;
