use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    error::Result,
    scan::{run_scan, write_summary, ScanOptions, StepResult, BASE_DISTANCE},
};

use super::{
    dos_config::{default_pi, default_sigma, default_species, default_x_limit, PeakConfig},
    TaskProcess,
};

fn default_base_distance() -> f64 {
    BASE_DISTANCE
}

/**
Configs of a PES scan.
# Field:
  * root: PathBuf - directory holding the step directories `1`, `2`, ...
  * base_distance: f64 - added to each displacement, in Å
  * interaction: usize - 0-based position of the interaction whose ICOHP at E_F is reported
  * species, sigma, pi, x_limit - as in the DOS task
  * plots: bool - write COHP and DOS SVGs into each step directory
  * summary: Option<PathBuf> - table path, `<root>/summary.txt` by default
*/
#[derive(Deserialize, Debug)]
pub struct ScanTask {
    root: PathBuf,
    #[serde(default = "default_base_distance")]
    base_distance: f64,
    #[serde(default)]
    interaction: usize,
    #[serde(default = "default_species")]
    species: Vec<String>,
    #[serde(default = "default_sigma")]
    sigma: PeakConfig,
    #[serde(default = "default_pi")]
    pi: PeakConfig,
    #[serde(default = "default_x_limit")]
    x_limit: f64,
    #[serde(default)]
    plots: bool,
    summary: Option<PathBuf>,
}

impl ScanTask {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            base_distance: BASE_DISTANCE,
            interaction: 0,
            species: default_species(),
            sigma: default_sigma(),
            pi: default_pi(),
            x_limit: default_x_limit(),
            plots: false,
            summary: None,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.as_ref()
    }

    pub fn base_distance(&self) -> f64 {
        self.base_distance
    }

    pub fn plots(&self) -> bool {
        self.plots
    }

    pub fn summary_path(&self) -> PathBuf {
        self.summary
            .clone()
            .unwrap_or_else(|| self.root.join("summary.txt"))
    }

    pub fn options(&self) -> ScanOptions {
        ScanOptions::new(
            self.base_distance,
            self.interaction,
            self.species.clone(),
            self.sigma.settings(),
            self.pi.settings(),
            self.x_limit,
            self.plots,
        )
    }
}

impl TaskProcess for ScanTask {
    type Output = Vec<StepResult>;
    fn task_execute(&self) -> Result<Vec<StepResult>> {
        let results = run_scan(self.root(), &self.options())?;
        write_summary(self.summary_path(), &results)?;
        Ok(results)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use crate::{config::TaskProcess, scan::test::write_scan};

    use super::ScanTask;

    #[test]
    fn test_scan_task_writes_summary_and_plots() {
        let root = write_scan("lobster_rust_scan_task", 2);
        let mut task = ScanTask::new(root.clone());
        task.plots = true;
        let results = task.task_execute();
        let summary = fs::read_to_string(root.join("summary.txt"));
        let svg_written = root.join("2").join("2_cohp.svg").exists()
            && root.join("2").join("2_dos.svg").exists();
        fs::remove_dir_all(&root).unwrap();

        assert_eq!(results.unwrap().len(), 2);
        assert_eq!(summary.unwrap().lines().count(), 3);
        assert!(svg_written);
    }
}
