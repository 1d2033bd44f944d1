use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::codec::bits::round_probabilities;
use crate::data::generator::{generate, Batch, Dataset};
use crate::error::Result;
use crate::model::rnn::RnnAdder;
use crate::optim::optimizer::Optimizer;
use crate::train::epoch_stats::{EpochStats, Evaluation, TrainReport};
use crate::train::train_config::TrainConfig;

/// Owns the model, its optimizer state and the run's random source.
///
/// One `Trainer` is one training session; nothing about it is global.
pub struct Trainer {
    config: TrainConfig,
    model: RnnAdder,
    optimizer: Box<dyn Optimizer>,
    rng: StdRng,
}

impl Trainer {
    /// Validates `config` and initialises a fresh model.
    pub fn new(config: TrainConfig) -> Result<Trainer> {
        config.validate()?;
        let mut rng = config.rng();
        let model = RnnAdder::new(config.hidden_size, config.activation, &mut rng);
        let optimizer = config.optimizer.build(config.learning_rate);
        Ok(Trainer { config, model, optimizer, rng })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn model(&self) -> &RnnAdder {
        &self.model
    }

    pub fn into_model(self) -> RnnAdder {
        self.model
    }

    /// Draws a dataset for this run from the trainer's random source.
    pub fn generate_dataset(&mut self) -> Result<Dataset> {
        generate(&self.config.data_config(), &mut self.rng)
    }

    /// One forward/backward pass and one optimizer step. Returns the batch loss.
    pub fn train_batch(&mut self, batch: &Batch) -> f64 {
        let (loss, mut grads) = self.model.loss_and_gradients(batch);
        if let Some(limit) = self.config.grad_clip {
            grads.clip(limit);
        }
        self.optimizer.step(&mut self.model.params, &grads);
        loss
    }

    /// One pass over `batches` in shuffled order. Returns the mean batch loss.
    pub fn train_epoch(&mut self, batches: &[Batch]) -> f64 {
        if batches.iter().all(Batch::is_empty) {
            return 0.0;
        }
        let mut order: Vec<usize> = (0..batches.len()).collect();
        order.shuffle(&mut self.rng);

        let total: f64 = order.into_iter()
            .map(|i| self.train_batch(&batches[i]))
            .sum();
        total / batches.len() as f64
    }

    /// Loss and accuracies over `batches`; `None` when there is nothing to score.
    pub fn evaluate(&self, batches: &[Batch]) -> Option<Evaluation> {
        evaluate(&self.model, batches)
    }

    /// Runs `config.epochs` epochs, logging and recording each one.
    ///
    /// Stops early if the training loss stops being finite.
    pub fn fit(&mut self, dataset: &Dataset) -> TrainReport {
        let total_epochs = self.config.epochs;
        let mut report = TrainReport::default();

        tracing::info!(
            width = self.config.width.bits(),
            hidden_size = self.config.hidden_size,
            learning_rate = self.optimizer.learning_rate(),
            train_batches = dataset.train.len(),
            validation_batches = dataset.validation.len(),
            epochs = total_epochs,
            "training started"
        );

        for epoch in 1..=total_epochs {
            let t_start = Instant::now();

            let train_loss = self.train_epoch(&dataset.train);
            if !train_loss.is_finite() {
                tracing::warn!(epoch, train_loss, "training loss is not finite; stopping");
                break;
            }

            let eval = self.evaluate(&dataset.validation);
            let stats = EpochStats {
                epoch,
                total_epochs,
                train_loss,
                val_loss: eval.map(|e| e.loss),
                val_bit_accuracy: eval.map(|e| e.bit_accuracy),
                val_exact_accuracy: eval.map(|e| e.exact_accuracy),
                elapsed_ms: t_start.elapsed().as_millis() as u64,
            };

            match eval {
                Some(e) => tracing::info!(
                    "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | bit_acc={:.2}% | exact_acc={:.2}% | {}ms",
                    epoch, total_epochs, train_loss, e.loss,
                    e.bit_accuracy * 100.0, e.exact_accuracy * 100.0, stats.elapsed_ms,
                ),
                None => tracing::info!(
                    "Epoch {:>3}/{} | train_loss={:.4} | {}ms",
                    epoch, total_epochs, train_loss, stats.elapsed_ms,
                ),
            }

            report.epochs.push(stats);
        }

        tracing::info!(completed = report.completed_epochs(), "training finished");
        report
    }
}

/// Scores `model` on `batches` without touching its weights.
pub fn evaluate(model: &RnnAdder, batches: &[Batch]) -> Option<Evaluation> {
    let samples: usize = batches.iter().map(Batch::len).sum();
    if samples == 0 {
        return None;
    }

    let mut weighted_loss = 0.0;
    let mut correct_bits = 0usize;
    let mut total_bits = 0usize;
    let mut correct_samples = 0usize;

    for batch in batches {
        let pass = model.forward(&batch.inputs, None);
        weighted_loss += model.loss(&pass, &batch.targets) * batch.len() as f64;

        for row in 0..batch.len() {
            let predicted = round_probabilities(&pass.row_probabilities(row));
            let matches = predicted.iter()
                .zip(batch.targets.iter())
                .filter(|(&bit, target)| f64::from(bit) == target.data[row][0])
                .count();
            correct_bits += matches;
            total_bits += predicted.len();
            if matches == predicted.len() {
                correct_samples += 1;
            }
        }
    }

    Some(Evaluation {
        loss: weighted_loss / samples as f64,
        bit_accuracy: correct_bits as f64 / total_bits as f64,
        exact_accuracy: correct_samples as f64 / samples as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::bits::Width;
    use crate::data::generator::Sample;

    fn small_config() -> TrainConfig {
        TrainConfig {
            width: Width::W8,
            hidden_size: 8,
            samples: 400,
            batch_size: 20,
            epochs: 3,
            seed: Some(17),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = TrainConfig { samples: 401, ..small_config() };
        assert!(Trainer::new(cfg).is_err());
    }

    #[test]
    fn same_seed_trains_identically() {
        let run = || {
            let mut trainer = Trainer::new(small_config()).unwrap();
            let data = trainer.generate_dataset().unwrap();
            let report = trainer.fit(&data);
            (report.final_train_loss(), trainer.into_model().params)
        };
        let (loss_a, params_a) = run();
        let (loss_b, params_b) = run();
        assert_eq!(loss_a, loss_b);
        assert_eq!(params_a, params_b);
    }

    #[test]
    fn report_has_one_entry_per_epoch() {
        let mut trainer = Trainer::new(small_config()).unwrap();
        let data = trainer.generate_dataset().unwrap();
        let report = trainer.fit(&data);
        assert_eq!(report.completed_epochs(), 3);
        assert!(report.epochs.iter().all(|s| s.val_loss.is_some() && s.total_epochs == 3));
        assert_eq!(report.epochs.iter().map(|s| s.epoch).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn evaluation_counts_bits_and_whole_sums() {
        let trainer = Trainer::new(small_config()).unwrap();
        let batch = Batch::from_samples(
            vec![Sample::new(1, 2, Width::W8), Sample::new(100, 200, Width::W8)],
            Width::W8,
        ).unwrap();
        let eval = trainer.evaluate(std::slice::from_ref(&batch)).unwrap();
        assert!((0.0..=1.0).contains(&eval.bit_accuracy));
        assert!(eval.exact_accuracy <= eval.bit_accuracy);
        assert!(eval.loss > 0.0);
        assert!(trainer.evaluate(&[]).is_none());
    }

    #[test]
    fn evaluation_of_an_all_zero_predictor() {
        let mut model = Trainer::new(small_config()).unwrap().into_model();
        model.params = model.params.zeros_like();
        model.params.b_o.data[0][0] = -10.0;
        let batch = Batch::from_samples(
            vec![Sample::new(0, 0, Width::W8), Sample::new(1, 2, Width::W8)],
            Width::W8,
        ).unwrap();

        let eval = evaluate(&model, std::slice::from_ref(&batch)).unwrap();
        // 0 + 0 is fully right; 1 + 2 = 0b11 misses its two low bits.
        assert_eq!(eval.bit_accuracy, 14.0 / 16.0);
        assert_eq!(eval.exact_accuracy, 0.5);
        assert!(eval.loss > 0.0);
    }

    #[test]
    fn epoch_over_no_samples_is_a_no_op() {
        let mut trainer = Trainer::new(small_config()).unwrap();
        let before = trainer.model().params.clone();
        let empty = Batch::from_samples(Vec::new(), Width::W8).unwrap();
        assert_eq!(trainer.train_epoch(&[]), 0.0);
        assert_eq!(trainer.train_epoch(std::slice::from_ref(&empty)), 0.0);
        assert_eq!(trainer.model().params, before);
    }

    #[test]
    fn batch_step_changes_weights() {
        let mut trainer = Trainer::new(small_config()).unwrap();
        let data = trainer.generate_dataset().unwrap();
        let before = trainer.model().params.clone();
        let loss = trainer.train_batch(&data.train[0]);
        assert!(loss.is_finite());
        assert_ne!(trainer.model().params, before);
    }
}
