pub mod dae;

pub use dae::DaeProblem;
