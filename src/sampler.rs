use crate::config::SessionConfig;
use crate::errors::ProtocolError;
use crate::protocols::qkd::session::{Outcome, Session};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

/// Aggregated outcomes of repeated sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialStats {
    pub trials: usize,
    pub established: usize,
    pub detected: usize,
    /// Sessions that stopped on an empty or too short reconciled secret.
    pub aborted: usize,
    /// Mean QBER (percent) over completed sessions.
    pub mean_qber: f64,
}

impl TrialStats {
    /// Fraction of completed sessions that flagged interception.
    pub fn detection_rate(&self) -> f64 {
        let completed = self.established + self.detected;
        if completed == 0 {
            0.0
        } else {
            self.detected as f64 / completed as f64
        }
    }
}

/// Runs many independent sessions with a shared configuration.
///
/// All trials draw from a single RNG stream, so a seeded config gives a
/// reproducible batch.
#[derive(Debug, Clone)]
pub struct TrialSampler {
    pub config: SessionConfig,
}

impl TrialSampler {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Runs `num_trials` sessions.
    ///
    /// # Errors
    ///
    /// Configuration and backend errors abort the batch. Sessions whose
    /// reconciled secret is empty or shorter than the sample are counted as
    /// `aborted` instead.
    pub fn run(&self, num_trials: usize) -> Result<TrialStats, ProtocolError> {
        self.config.validate()?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut stats = TrialStats {
            trials: num_trials,
            ..TrialStats::default()
        };
        let mut qber_sum = 0.0;

        for trial in 0..num_trials {
            let session = Session::with_rng(self.config.clone(), StdRng::from_rng(&mut rng))?;
            match session.run() {
                Ok(report) => {
                    qber_sum += report.qber;
                    match report.outcome {
                        Outcome::SecretEstablished => stats.established += 1,
                        Outcome::InterceptionDetected => stats.detected += 1,
                    }
                }
                Err(ProtocolError::EmptyReduction | ProtocolError::SampleExceedsSecret { .. }) => {
                    debug!(trial, "session aborted");
                    stats.aborted += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let completed = stats.established + stats.detected;
        if completed > 0 {
            stats.mean_qber = qber_sum / completed as f64;
        }

        Ok(stats)
    }
}
