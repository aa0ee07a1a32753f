use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::{
    dos::dos_util::{calculate_site_dos, sigma_pi_peaks, PeakSettings, SigmaPiDos},
    error::Result,
    plot::render_sigma_pi,
};

use super::TaskProcess;

/// Threshold and names of the labelled peaks of one curve.
#[derive(Deserialize, Debug, Clone)]
pub struct PeakConfig {
    threshold: f64,
    #[serde(default)]
    labels: Vec<String>,
}

impl PeakConfig {
    pub fn new(threshold: f64, labels: &[&str]) -> Self {
        Self {
            threshold,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn labels(&self) -> &[String] {
        self.labels.as_ref()
    }

    pub fn settings(&self) -> PeakSettings {
        PeakSettings::new(self.threshold, self.labels.clone())
    }
}

pub(crate) fn default_species() -> Vec<String> {
    vec!["C".to_string(), "O".to_string()]
}

pub(crate) fn default_sigma() -> PeakConfig {
    PeakConfig::new(0.9, &["3σ", "4σ", "5σ", "6σ"])
}

pub(crate) fn default_pi() -> PeakConfig {
    PeakConfig::new(1.2, &["1π", "2π"])
}

pub(crate) fn default_x_limit() -> f64 {
    11.0
}

/**
Configs of a site-projected DOS task.
# Field:
  * doscar: PathBuf - `DOSCAR.lobster`
  * poscar: PathBuf - structure used to look up the species
  * species: Vec<String> - the first atom of each species is projected, default C and O
  * sigma, pi: PeakConfig - thresholds 0.9 and 1.2 by default
  * x_limit: f64 - labels further right are pulled back to it
  * output: Option<PathBuf> - SVG written when given
*/
#[derive(Deserialize, Debug)]
pub struct DosTask {
    doscar: PathBuf,
    poscar: PathBuf,
    #[serde(default = "default_species")]
    species: Vec<String>,
    #[serde(default = "default_sigma")]
    sigma: PeakConfig,
    #[serde(default = "default_pi")]
    pi: PeakConfig,
    #[serde(default = "default_x_limit")]
    x_limit: f64,
    output: Option<PathBuf>,
}

impl DosTask {
    pub fn new(doscar: PathBuf, poscar: PathBuf) -> Self {
        Self {
            doscar,
            poscar,
            species: default_species(),
            sigma: default_sigma(),
            pi: default_pi(),
            x_limit: default_x_limit(),
            output: None,
        }
    }

    pub fn doscar(&self) -> &Path {
        self.doscar.as_ref()
    }

    pub fn poscar(&self) -> &Path {
        self.poscar.as_ref()
    }

    pub fn species(&self) -> &[String] {
        self.species.as_ref()
    }

    pub fn sigma(&self) -> &PeakConfig {
        &self.sigma
    }

    pub fn pi(&self) -> &PeakConfig {
        &self.pi
    }

    pub fn x_limit(&self) -> f64 {
        self.x_limit
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

impl TaskProcess for DosTask {
    type Output = SigmaPiDos;
    fn task_execute(&self) -> Result<SigmaPiDos> {
        let site = calculate_site_dos(self.doscar(), self.poscar(), self.species())?;
        let result = sigma_pi_peaks(
            &site,
            &self.sigma.settings(),
            &self.pi.settings(),
            self.x_limit,
        );
        info!(
            "Labelled {} sigma and {} pi peaks",
            result.sigma_labels().len(),
            result.pi_labels().len()
        );
        if let Some(output) = self.output() {
            render_sigma_pi(output, "σ/π DOS", &result, self.x_limit)?;
        }
        Ok(result)
    }
}
