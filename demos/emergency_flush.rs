//! Emergency Flush Example
//!
//! A subject fails at epoch 3. The experiment records every subject before
//! returning the failure, so the first three epochs are not lost.
//!
//! Run with: cargo run --example emergency_flush

use exlab::experiment::ExperimentBuilder;
use exlab::record::SubjectRecord;
use exlab::storage::{FsStorage, Storage};
use exlab::subject::{BaseSubject, TestSubject};
use exlab::{logging, SubjectResult};

/// Thermometer that breaks after a few readings
struct Thermometer {
    record: SubjectRecord,
    breaks_at: u64,
}

impl TestSubject for Thermometer {
    fn state(&self) -> &SubjectRecord {
        &self.record
    }

    fn state_mut(&mut self) -> &mut SubjectRecord {
        &mut self.record
    }

    #[allow(clippy::cast_precision_loss)]
    fn measure(&mut self, epoch: u64) -> SubjectResult<Option<String>> {
        if epoch == self.breaks_at {
            anyhow::bail!("thermometer cracked at epoch {epoch}");
        }
        self.record.push_data("celsius", 20.0 + epoch as f64 * 0.5);
        Ok(None)
    }
}

fn main() -> anyhow::Result<()> {
    logging::init("info");

    let mut exp = ExperimentBuilder::new("target/exlab-demo")
        .id("Emergency")
        .subject(BaseSubject::new(Some("Control")))
        .subject(Thermometer {
            record: SubjectRecord::new(Some("Thermo"), "Thermometer"),
            breaks_at: 3,
        })
        .build(FsStorage::new())?;

    let Err(err) = exp.run(10) else {
        anyhow::bail!("expected the thermometer to fail");
    };
    println!("Run aborted: {err}");

    let flushed = FsStorage::new().read_structured_record(&exp.save_folder().join("Thermo_1"))?;
    println!(
        "Flushed readings: {}",
        serde_json::to_string_pretty(&flushed["Data"]["celsius"])?
    );

    Ok(())
}
