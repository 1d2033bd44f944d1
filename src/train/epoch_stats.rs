use serde::{Serialize, Deserialize};

/// Per-epoch training statistics emitted by `Trainer::fit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training loss over all batches in this epoch.
    pub train_loss: f64,
    /// Mean validation loss, if a validation split exists.
    pub val_loss: Option<f64>,
    /// Fraction of validation sum bits predicted correctly.
    pub val_bit_accuracy: Option<f64>,
    /// Fraction of validation samples whose whole sum was predicted correctly.
    pub val_exact_accuracy: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Loss and accuracy of the model over a set of batches, without updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f64,
    pub bit_accuracy: f64,
    pub exact_accuracy: f64,
}

/// Everything `Trainer::fit` observed, one entry per completed epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainReport {
    pub epochs: Vec<EpochStats>,
}

impl TrainReport {
    pub fn completed_epochs(&self) -> usize {
        self.epochs.len()
    }

    pub fn final_train_loss(&self) -> Option<f64> {
        self.epochs.last().map(|s| s.train_loss)
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.epochs.last().and_then(|s| s.val_loss)
    }
}
