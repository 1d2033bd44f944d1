use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::codec::bits::{encode, modular_sum, Width};
use crate::error::{AdderError, Result};
use crate::math::matrix::Matrix;

/// One addition problem: two operands and their wrapping sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub x0: u64,
    pub x1: u64,
    pub y: u64,
}

impl Sample {
    pub fn new(x0: u64, x1: u64, width: Width) -> Sample {
        Sample { x0, x1, y: modular_sum(x0, x1, width) }
    }
}

/// A group of samples laid out per timestep for the recurrent model.
///
/// `inputs[t]` is `B x 2` holding bit `t` of both operands, `targets[t]` is
/// `B x 1` holding bit `t` of the sum.
#[derive(Debug, Clone)]
pub struct Batch {
    pub width: Width,
    pub samples: Vec<Sample>,
    pub inputs: Vec<Matrix>,
    pub targets: Vec<Matrix>,
}

impl Batch {
    pub fn from_samples(samples: Vec<Sample>, width: Width) -> Result<Batch> {
        let steps = width.bits();
        let mut inputs = vec![Matrix::zeros(samples.len(), 2); steps];
        let mut targets = vec![Matrix::zeros(samples.len(), 1); steps];

        for (row, sample) in samples.iter().enumerate() {
            let a = encode(sample.x0, width)?;
            let b = encode(sample.x1, width)?;
            let y = encode(sample.y, width)?;
            for t in 0..steps {
                inputs[t].data[row][0] = f64::from(a[t]);
                inputs[t].data[row][1] = f64::from(b[t]);
                targets[t].data[row][0] = f64::from(y[t]);
            }
        }

        Ok(Batch { width, samples, inputs, targets })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Parameters for synthetic data generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub width: Width,
    /// Total number of samples; must be a multiple of `batch_size`.
    pub samples: usize,
    pub batch_size: usize,
    /// Share of batches held out for validation, in `[0, 1)`.
    pub validation_fraction: f64,
}

impl DataConfig {
    pub fn num_batches(&self) -> usize {
        if self.batch_size == 0 { 0 } else { self.samples / self.batch_size }
    }

    /// Number of whole batches held out for validation.
    pub fn validation_batches(&self) -> usize {
        (self.num_batches() as f64 * self.validation_fraction).round() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(AdderError::invalid_config("sample count must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(AdderError::invalid_config("batch size must be at least 1"));
        }
        if self.samples % self.batch_size != 0 {
            return Err(AdderError::BatchSizeMismatch {
                samples: self.samples,
                batch_size: self.batch_size,
            });
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(AdderError::invalid_config(format!(
                "validation fraction {} must lie in [0, 1)",
                self.validation_fraction
            )));
        }
        if self.validation_fraction > 0.0 && self.validation_batches() == 0 {
            return Err(AdderError::invalid_config(format!(
                "validation fraction {} holds out no batch of {}",
                self.validation_fraction,
                self.num_batches()
            )));
        }
        if self.validation_batches() >= self.num_batches() {
            return Err(AdderError::invalid_config(format!(
                "validation split leaves no training batch ({} of {} batches held out)",
                self.validation_batches(),
                self.num_batches()
            )));
        }
        Ok(())
    }
}

/// Training and validation batches drawn from the same distribution.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub train: Vec<Batch>,
    pub validation: Vec<Batch>,
}

/// Draws `config.samples` operand pairs uniformly from `[0, max_value]` and
/// splits them into training and validation batches.
pub fn generate<R: Rng + ?Sized>(config: &DataConfig, rng: &mut R) -> Result<Dataset> {
    config.validate()?;

    let width = config.width;
    let max = width.max_value();
    let mut batches = Vec::with_capacity(config.num_batches());
    for _ in 0..config.num_batches() {
        let samples = (0..config.batch_size)
            .map(|_| Sample::new(rng.gen_range(0..=max), rng.gen_range(0..=max), width))
            .collect();
        batches.push(Batch::from_samples(samples, width)?);
    }

    let split = batches.len() - config.validation_batches();
    let validation = batches.split_off(split);

    tracing::debug!(
        width = width.bits(),
        train_batches = batches.len(),
        validation_batches = validation.len(),
        batch_size = config.batch_size,
        "generated dataset"
    );

    Ok(Dataset { train: batches, validation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::bits::decode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(width: Width, samples: usize, batch_size: usize, fraction: f64) -> DataConfig {
        DataConfig { width, samples, batch_size, validation_fraction: fraction }
    }

    #[test]
    fn sample_sum_wraps() {
        let s = Sample::new(200, 100, Width::W8);
        assert_eq!(s.y, 44);
    }

    #[test]
    fn splits_batches_by_fraction() {
        let mut rng = StdRng::seed_from_u64(1);
        let ds = generate(&config(Width::W16, 200, 20, 0.2), &mut rng).unwrap();
        assert_eq!(ds.train.len(), 8);
        assert_eq!(ds.validation.len(), 2);
        assert!(ds.train.iter().chain(&ds.validation).all(|b| b.len() == 20));
    }

    #[test]
    fn batch_tensors_encode_every_sample() {
        let mut rng = StdRng::seed_from_u64(2);
        let ds = generate(&config(Width::W8, 64, 16, 0.25), &mut rng).unwrap();
        for batch in ds.train.iter().chain(&ds.validation) {
            assert_eq!(batch.inputs.len(), 8);
            assert_eq!(batch.targets.len(), 8);
            for (row, sample) in batch.samples.iter().enumerate() {
                assert_eq!(sample.y, (sample.x0 + sample.x1) % 256);
                let column = |m: &Vec<Matrix>, col: usize| -> Vec<u8> {
                    m.iter().map(|step| step.data[row][col] as u8).collect()
                };
                assert_eq!(decode(&column(&batch.inputs, 0), Width::W8).unwrap(), sample.x0);
                assert_eq!(decode(&column(&batch.inputs, 1), Width::W8).unwrap(), sample.x1);
                assert_eq!(decode(&column(&batch.targets, 0), Width::W8).unwrap(), sample.y);
            }
        }
    }

    #[test]
    fn operands_stay_within_width() {
        let mut rng = StdRng::seed_from_u64(3);
        let ds = generate(&config(Width::W8, 500, 50, 0.0), &mut rng).unwrap();
        assert!(ds.validation.is_empty());
        assert!(ds.train.iter().flat_map(|b| &b.samples).all(|s| s.x0 <= 255 && s.x1 <= 255));
    }

    #[test]
    fn same_seed_same_data() {
        let cfg = config(Width::W32, 40, 10, 0.25);
        let a = generate(&cfg, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = generate(&cfg, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a.train[0].samples, b.train[0].samples);
        assert_eq!(a.validation[0].samples, b.validation[0].samples);
    }

    #[test]
    fn rejects_uneven_batches() {
        let mut rng = StdRng::seed_from_u64(4);
        let err = generate(&config(Width::W8, 101, 10, 0.2), &mut rng).unwrap_err();
        assert!(matches!(err, AdderError::BatchSizeMismatch { samples: 101, batch_size: 10 }));
    }

    #[test]
    fn rejects_degenerate_splits() {
        assert!(config(Width::W8, 100, 10, 1.0).validate().is_err());
        assert!(config(Width::W8, 100, 10, -0.1).validate().is_err());
        assert!(config(Width::W8, 10, 10, 0.6).validate().is_err());
        assert!(config(Width::W8, 0, 10, 0.2).validate().is_err());
        assert!(config(Width::W8, 10, 0, 0.2).validate().is_err());
        assert!(config(Width::W8, 100, 10, 0.04).validate().is_err());
        assert!(config(Width::W8, 10, 10, 0.2).validate().is_err());
        assert!(config(Width::W8, 100, 10, 0.05).validate().is_ok());
        assert!(config(Width::W8, 10, 10, 0.0).validate().is_ok());
    }
}
