use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::game_tester::GameTester;
use crate::logic::scenarios::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.tester.verbose() {
                println!(
                    "🧪 Testing scenario: {} (seed: {})",
                    scenario.name.bright_white(),
                    seed
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let mut session = self.tester.session(iteration_seed);

            match (scenario.run)(&mut session) {
                Ok(()) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.tester.verbose() {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) screen:{} events:{}",
                            i + 1,
                            iterations,
                            session.game.screen(),
                            session.events.len()
                        );
                    }
                }
                Err(err) => {
                    let message = format!(
                        "Iteration {} (seed {}, screen {}, clock {}ms): {err:#}",
                        i + 1,
                        iteration_seed,
                        session.game.screen(),
                        session.game.now_ms()
                    );
                    log::debug!("{} failed: {message}", scenario.key);
                    if self.tester.verbose() {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::get_scenario;
    use biovilla_game::GameEngine;
    use std::sync::Arc;

    fn logic_tester() -> LogicTester {
        let engine = Arc::new(GameEngine::embedded().unwrap());
        LogicTester::new(GameTester::new(engine, false))
    }

    #[test]
    fn runs_one_result_per_seed() {
        let scenario = get_scenario("smoke").unwrap();
        let results = logic_tester().run_scenario(&scenario, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
        assert!(results.iter().all(|r| r.successful_iterations == 2));
    }

    fn always_fails(_: &mut crate::logic::PlaySession) -> anyhow::Result<()> {
        anyhow::bail!("boom")
    }

    #[test]
    fn failures_are_recorded_with_context() {
        let scenario = TestScenario {
            key: "always-fails",
            name: "Always Fails",
            description: "",
            run: always_fails,
        };
        let results = logic_tester().run_scenario(&scenario, &[5], 1);
        assert!(!results[0].passed);
        assert!(results[0].failures[0].contains("seed 5"));
        assert!(results[0].failures[0].contains("boom"));
        assert_eq!(results[0].average_duration, Duration::ZERO);
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "Smoke".into(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.performance_data, result.performance_data);
    }
}
