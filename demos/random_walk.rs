//! Random Walk Example
//!
//! Three walkers with different step sizes are observed for 50 epochs.
//! Each epoch every walker takes one step; the final measurement stores the
//! distance from the origin. Results land under `target/exlab-demo/`.
//!
//! Run with: cargo run --example random_walk

use exlab::experiment::ExperimentBuilder;
use exlab::record::SubjectRecord;
use exlab::storage::FsStorage;
use exlab::subject::TestSubject;
use exlab::{logging, ExperimentConfig, SubjectResult};
use rand::Rng;
use serde_json::{json, Value};

/// A 1-D random walker
struct Walker {
    record: SubjectRecord,
    step: f64,
    position: f64,
}

impl Walker {
    const DEFAULT_NAME: &'static str = "Walker";

    fn new(name: Option<&str>, step: f64) -> Self {
        let mut record = SubjectRecord::new(name, Self::DEFAULT_NAME);
        record.info.insert("Step".to_string(), json!(step));
        Self {
            record,
            step,
            position: 0.0,
        }
    }
}

impl TestSubject for Walker {
    fn state(&self) -> &SubjectRecord {
        &self.record
    }

    fn state_mut(&mut self) -> &mut SubjectRecord {
        &mut self.record
    }

    fn measure(&mut self, epoch: u64) -> SubjectResult<Option<String>> {
        let direction = if rand::thread_rng().gen_bool(0.5) { 1.0 } else { -1.0 };
        self.position += direction * self.step;
        self.record.push_data("position", self.position);

        Ok((epoch % 10 == 9).then(|| format!("{} at {:+.2}", self.name(), self.position)))
    }

    fn on_final_measure(&mut self, _last_epoch: Option<u64>) -> SubjectResult<()> {
        self.record
            .data
            .insert("distance".to_string(), json!(self.position.abs()));
        Ok(())
    }

    fn analysis(&self) -> Value {
        let positions = self.record.data.get("position").and_then(Value::as_array);
        let max = positions
            .into_iter()
            .flatten()
            .filter_map(Value::as_f64)
            .fold(0.0_f64, |acc, p| acc.max(p.abs()));
        json!({ "max_excursion": max })
    }
}

fn main() -> anyhow::Result<()> {
    let config = ExperimentConfig::from_env()?;
    logging::init(&config.log_level);

    let mut exp = ExperimentBuilder::from_config("target/exlab-demo", &config)
        .id("RandomWalk")
        .subject(Walker::new(None, 1.0))
        .subject(Walker::new(Some("Careful"), 0.25))
        .subject(Walker::new(Some("Bold"), 4.0))
        .build(FsStorage::new())?;

    exp.run(config.epochs.min(50))?;

    println!("=== Random Walk Complete ===");
    println!("Save folder: {}", exp.save_folder().display());
    for (id, result) in exp.analysis() {
        println!("  {id}: {result}");
    }

    Ok(())
}
