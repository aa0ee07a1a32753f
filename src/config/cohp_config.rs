use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::{
    cohp::{
        pool::{OrbitalPools, PoolOptions, PoolResolution},
        Cohp, CohpCurve,
    },
    error::Result,
    plot::render_cohp,
};

use super::TaskProcess;

/**
Configs of a COHP task on a single COHPCAR.
# Field:
  * cohpcar: PathBuf - path to `COHPCAR.lobster`
  * resolution: PoolResolution - "shell" (default) or "orbital"
  * atom_pair: Option<(u32, u32)> - only pool interactions from atom `a` to atom `b`
  * interaction: usize - 0-based position of the curve to report, after "Average"
  * output: Option<PathBuf> - SVG written when given
*/
#[derive(Deserialize, Debug)]
pub struct CohpTask {
    cohpcar: PathBuf,
    #[serde(default)]
    resolution: PoolResolution,
    atom_pair: Option<(u32, u32)>,
    #[serde(default)]
    interaction: usize,
    output: Option<PathBuf>,
}

impl CohpTask {
    pub fn new(cohpcar: PathBuf, resolution: PoolResolution) -> Self {
        Self {
            cohpcar,
            resolution,
            atom_pair: None,
            interaction: 0,
            output: None,
        }
    }

    pub fn cohpcar(&self) -> &Path {
        self.cohpcar.as_ref()
    }

    pub fn resolution(&self) -> PoolResolution {
        self.resolution
    }

    pub fn atom_pair(&self) -> Option<(u32, u32)> {
        self.atom_pair
    }

    pub fn interaction(&self) -> usize {
        self.interaction
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions::new(self.resolution, self.atom_pair)
    }
}

/// Result of a COHP task.
#[derive(Debug, Clone)]
pub struct CohpSummary {
    interaction: String,
    curve: CohpCurve,
    icohp_at_fermi: f64,
    pools: OrbitalPools,
}

impl CohpSummary {
    /// Label of the reported interaction, e.g. `Rh49->C51`.
    pub fn interaction(&self) -> &str {
        self.interaction.as_ref()
    }

    pub fn curve(&self) -> &CohpCurve {
        &self.curve
    }

    pub fn icohp_at_fermi(&self) -> f64 {
        self.icohp_at_fermi
    }

    pub fn pools(&self) -> &OrbitalPools {
        &self.pools
    }
}

impl TaskProcess for CohpTask {
    type Output = CohpSummary;
    fn task_execute(&self) -> Result<CohpSummary> {
        let cohp = Cohp::from_file(self.cohpcar())?;
        let interaction = cohp
            .interactions()
            .get(self.interaction)
            .map(|i| i.to_string())
            .unwrap_or_else(|| format!("#{}", self.interaction + 1));
        let curve = cohp.interaction_curve(self.interaction)?;
        let icohp_at_fermi = cohp.icohp_at_fermi(&curve);
        info!("ICOHP({}) at E_F: {:.5}", interaction, icohp_at_fermi);
        let pools = cohp.pools(&self.pool_options())?;
        pools
            .keys()
            .filter(|k| pools.contributions(k) > 0)
            .for_each(|k| info!("pool {:>8}: {} interactions", k, pools.contributions(k)));
        if let Some(output) = self.output() {
            render_cohp(output, &cohp, &interaction, &curve, &pools)?;
        }
        Ok(CohpSummary {
            interaction,
            curve,
            icohp_at_fermi,
            pools,
        })
    }
}

#[cfg(test)]
mod test {
    use std::{env, fs};

    use crate::{cohp::pool::PoolResolution, config::TaskProcess, scan::test::CO_COHPCAR};

    use super::CohpTask;

    #[test]
    fn test_cohp_task() {
        let path = env::temp_dir().join("lobster_rust_cohp_task.lobster");
        fs::write(&path, CO_COHPCAR).unwrap();
        let task = CohpTask::new(path.clone(), PoolResolution::Orbital);
        let summary = task.task_execute().unwrap();
        assert_eq!(summary.interaction(), "Rh1->C3");
        assert_eq!(summary.icohp_at_fermi(), -0.4);
        // ss + p_zp_z
        assert_eq!(summary.pools().sigma(), ndarray::array![3.0, 7.0, 11.0]);
        assert_eq!(summary.pools().contributions("p_zp_z"), 1);
        fs::remove_file(&path).unwrap();
    }
}
