pub mod assignment;
pub mod employee;
pub mod operation;
pub mod patient;
pub mod service;
