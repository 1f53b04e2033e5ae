use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::de::DeserializeOwned;
use tracing::debug;

use fuzzstat_core::protocol::{ProviderRequest, ProviderResponse, RawElement};
use fuzzstat_core::provider::{
    KSampleOutcome, MannWhitneyOutcome, ProviderError, StatisticsProvider, TwoSampleOutcome,
};
use fuzzstat_core::Sample;

use crate::config::ProviderConfig;

/// R program that answers one request on stdin with one response on stdout.
const DRIVER: &str = include_str!("driver.R");

/// Statistics provider backed by an R statistics script run through `Rscript`.
///
/// Each call starts a fresh `Rscript` process, which sources the configured
/// script and evaluates the requested test.
#[derive(Debug, Clone)]
pub struct RscriptProvider {
    /// The `Rscript` executable.
    rscript: PathBuf,
    /// Script defining `dec_twosamplecomparison` and `dec_anova`.
    script: PathBuf,
}

impl RscriptProvider {
    pub fn new(rscript: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            rscript: rscript.into(),
            script: script.into(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(&config.rscript, &config.script)
    }

    fn script(&self) -> String {
        self.script.display().to_string()
    }

    /// Send `request` to a new `Rscript` process and decode its result.
    fn call<T: DeserializeOwned>(&self, request: &ProviderRequest) -> Result<T, ProviderError> {
        let mut child = Command::new(&self.rscript)
            .arg("--vanilla")
            .arg("-e")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ProviderError::Spawn(format!("Failed to spawn {}: {}", self.rscript.display(), e))
            })?;

        // The child is reaped even if it stopped reading its input early.
        let sent = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::Spawn("stdin of Rscript unavailable".to_string()))
            .and_then(|mut stdin| {
                serde_json::to_writer(&mut stdin, request)?;
                stdin.flush()?;
                Ok(())
            });

        let output = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Err(e) = sent {
            return Err(ProviderError::Failed(format!(
                "Failed to send request to {} ({}): {}",
                self.rscript.display(),
                e,
                stderr.trim()
            )));
        }
        if !output.status.success() {
            return Err(ProviderError::Failed(format!(
                "{} exited with {}: {}",
                self.rscript.display(),
                output.status,
                stderr.trim()
            )));
        }

        debug!(
            "Provider response: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        let response: ProviderResponse = serde_json::from_slice(&output.stdout)?;
        response.into_result()
    }
}

impl StatisticsProvider for RscriptProvider {
    fn two_sample_test(
        &self,
        focal: &Sample,
        other: &Sample,
        alpha: f64,
        iterations: u32,
    ) -> Result<TwoSampleOutcome, ProviderError> {
        let raw: Vec<f64> = self.call(&ProviderRequest::TwoSample {
            script: self.script(),
            f1: focal.values().to_vec(),
            f2: other.values().to_vec(),
            alpha,
            iterations,
        })?;
        TwoSampleOutcome::from_raw(&raw)
    }

    fn k_sample_test(
        &self,
        samples: &[(&str, &Sample)],
        alpha: f64,
        iterations: u32,
    ) -> Result<KSampleOutcome, ProviderError> {
        let raw: Vec<RawElement> = self.call(&ProviderRequest::KSample {
            script: self.script(),
            names: samples.iter().map(|(name, _)| name.to_string()).collect(),
            samples: samples.iter().map(|(_, s)| s.values().to_vec()).collect(),
            alpha,
            iterations,
        })?;
        KSampleOutcome::from_raw(&raw)
    }

    fn mann_whitney_u(
        &self,
        baseline: &Sample,
        tweak: &Sample,
        exact: bool,
    ) -> Result<MannWhitneyOutcome, ProviderError> {
        let raw: Vec<f64> = self.call(&ProviderRequest::MannWhitneyU {
            x: baseline.values().to_vec(),
            y: tweak.values().to_vec(),
            exact,
        })?;
        MannWhitneyOutcome::from_raw(&raw)
    }
}
