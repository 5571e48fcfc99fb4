pub mod game_tester;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod tester;

pub use game_tester::{GameTester, PlaySession};
pub use scenarios::{TestScenario, get_scenario, list_scenarios};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
