use std::io;

use anyhow::{Context, Result};
use carry_rnn::{Calculator, TrainConfig, Trainer};
use carry_rnn::logging;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(logging::env_filter())
        .with_writer(io::stderr)
        .init();

    let config = TrainConfig::default();
    tracing::debug!(config = %serde_json::to_string(&config)?, "resolved configuration");

    let mut trainer = Trainer::new(config).context("invalid training configuration")?;
    let dataset = trainer.generate_dataset().context("failed to generate dataset")?;
    let report = trainer.fit(&dataset);
    tracing::debug!(report = %serde_json::to_string(&report)?, "training report");

    let width = trainer.config().width;
    let calculator = Calculator::new(trainer.model(), width);
    calculator.run(io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}
