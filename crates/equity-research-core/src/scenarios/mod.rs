pub mod scenario;

pub use scenario::{generate_scenarios, ScenarioCase, ScenarioResult, ScenarioSet};
