use std::path::Path;

use log::warn;
use ndarray::{Array1, ArrayView1};

use crate::{
    error::Result,
    parser::cohpcar::{Cohpcar, Interaction},
};

pub mod layout;
pub mod pool;

use layout::ColumnLayout;
use pool::{pool_orbitals, OrbitalPools, PoolOptions};

/// Projected and integrated COHP of one interaction, spin channels summed.
#[derive(Debug, Clone)]
pub struct CohpCurve {
    cohp: Array1<f64>,
    icohp: Array1<f64>,
}

impl CohpCurve {
    pub fn new(cohp: Array1<f64>, icohp: Array1<f64>) -> Self {
        Self { cohp, icohp }
    }

    pub fn cohp(&self) -> &Array1<f64> {
        &self.cohp
    }

    pub fn icohp(&self) -> &Array1<f64> {
        &self.icohp
    }
}

/// A parsed COHPCAR together with its column layout.
#[derive(Debug, Clone)]
pub struct Cohp {
    cohpcar: Cohpcar,
    layout: ColumnLayout,
}

impl Cohp {
    pub fn new(cohpcar: Cohpcar) -> Result<Self> {
        let header = cohpcar.header();
        let layout = ColumnLayout::new(
            header.num_interactions(),
            header.num_spins(),
            cohpcar.data().ncols(),
        )?;
        Ok(Self { cohpcar, layout })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(Cohpcar::from_file(path)?)
    }

    pub fn cohpcar(&self) -> &Cohpcar {
        &self.cohpcar
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn interactions(&self) -> &[Interaction] {
        self.cohpcar.interactions()
    }

    pub fn e_fermi(&self) -> f64 {
        self.cohpcar.header().e_fermi()
    }

    /// Energies relative to the Fermi level, as written in the file.
    pub fn energies(&self) -> ArrayView1<f64> {
        self.cohpcar.data().column(self.layout.energy_column())
    }

    /// Energies on the absolute DFT scale, E + E_F.
    pub fn energies_absolute(&self) -> Array1<f64> {
        &self.energies() + self.e_fermi()
    }

    /// COHP of the interaction at 0-based `position` in the parsed list.
    pub fn interaction_curve(&self, position: usize) -> Result<CohpCurve> {
        let mut cohp = Array1::zeros(self.energies().len());
        let mut icohp = Array1::zeros(self.energies().len());
        for spin in self.layout.spins() {
            cohp += &self.cohpcar.data().column(self.layout.cohp_column(position, spin)?);
            icohp += &self.cohpcar.data().column(self.layout.icohp_column(position, spin)?);
        }
        Ok(CohpCurve::new(cohp, icohp))
    }

    pub fn average_curve(&self) -> Result<CohpCurve> {
        let mut cohp = Array1::zeros(self.energies().len());
        let mut icohp = Array1::zeros(self.energies().len());
        for spin in self.layout.spins() {
            cohp += &self.cohpcar.data().column(self.layout.average_cohp_column(spin)?);
            icohp += &self.cohpcar.data().column(self.layout.average_icohp_column(spin)?);
        }
        Ok(CohpCurve::new(cohp, icohp))
    }

    pub fn pools(&self, options: &PoolOptions) -> Result<OrbitalPools> {
        pool_orbitals(
            self.cohpcar.interactions(),
            self.cohpcar.data(),
            &self.layout,
            options,
        )
    }

    /// Row of the sample at E - E_F = 0. Falls back to the closest sample
    /// when the grid does not hit zero exactly.
    pub fn fermi_index(&self) -> usize {
        let energies = self.energies();
        if let Some(i) = energies.iter().position(|e| *e == 0.0) {
            return i;
        }
        let nearest = energies
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, e)| {
                if e.abs() < best.1 {
                    (i, e.abs())
                } else {
                    best
                }
            })
            .0;
        warn!(
            "No energy sample at the Fermi level, using E - E_F = {}",
            energies[nearest]
        );
        nearest
    }

    pub fn icohp_at_fermi(&self, curve: &CohpCurve) -> f64 {
        curve.icohp()[self.fermi_index()]
    }
}
