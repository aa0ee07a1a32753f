use std::path::Path;

use log::info;
use ndarray::Array1;

use crate::{
    error::Result,
    parser::{doscar::Doscar, poscar::Poscar},
};

use super::{
    peaks::{find_peaks, integrate_dos, peak_label_positions, place_labels, stack_on, PeakLabel},
    site::{project_sites, SiteProjection},
};

/// Project the DOS onto the first atom of each species in `species`,
/// looking the atoms up in the structure file.
pub fn calculate_site_dos<P: AsRef<Path>, Q: AsRef<Path>>(
    doscar_file: P,
    poscar_file: Q,
    species: &[String],
) -> Result<SiteProjection> {
    let poscar = Poscar::from_file(poscar_file)?;
    let atoms = species
        .iter()
        .map(|symbol| poscar.first_atom_index(symbol))
        .collect::<Result<Vec<usize>>>()?;
    info!("Projecting DOS on {:?} -> atoms {:?}", species, atoms);
    let doscar = Doscar::from_file(doscar_file)?;
    project_sites(&doscar, &atoms)
}

/// Threshold and peak names for one curve.
#[derive(Debug, Clone)]
pub struct PeakSettings {
    threshold: f64,
    names: Vec<String>,
}

impl PeakSettings {
    pub fn new(threshold: f64, names: Vec<String>) -> Self {
        Self { threshold, names }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn names(&self) -> &[String] {
        self.names.as_ref()
    }
}

/// Sigma and pi DOS with their labelled peaks; pi is stacked on sigma.
#[derive(Debug, Clone)]
pub struct SigmaPiDos {
    energies: Array1<f64>,
    sigma: Array1<f64>,
    pi: Array1<f64>,
    sigma_labels: Vec<PeakLabel>,
    pi_labels: Vec<PeakLabel>,
}

impl SigmaPiDos {
    pub fn energies(&self) -> &Array1<f64> {
        &self.energies
    }

    pub fn sigma(&self) -> &Array1<f64> {
        &self.sigma
    }

    pub fn pi(&self) -> &Array1<f64> {
        &self.pi
    }

    pub fn sigma_labels(&self) -> &[PeakLabel] {
        self.sigma_labels.as_ref()
    }

    pub fn pi_labels(&self) -> &[PeakLabel] {
        self.pi_labels.as_ref()
    }
}

pub fn sigma_pi_peaks(
    site: &SiteProjection,
    sigma_settings: &PeakSettings,
    pi_settings: &PeakSettings,
    x_limit: f64,
) -> SigmaPiDos {
    let energies = site.energies().clone();
    let sigma = site.sigma();
    let pi = site.pi();

    let sigma_idos = integrate_dos(sigma.view(), energies.view());
    let sigma_windows = find_peaks(sigma_settings.threshold(), sigma.view());
    let sigma_positions = peak_label_positions(sigma.view(), sigma_idos.view(), &sigma_windows);

    let pi_idos = integrate_dos(pi.view(), energies.view());
    let pi_windows = find_peaks(pi_settings.threshold(), pi.view());
    let mut pi_positions = peak_label_positions(pi.view(), pi_idos.view(), &pi_windows);
    stack_on(&mut pi_positions, sigma.view());

    let sigma_labels = place_labels(
        energies.view(),
        &sigma_windows,
        &sigma_positions,
        sigma_settings.names(),
        x_limit,
    );
    let pi_labels = place_labels(
        energies.view(),
        &pi_windows,
        &pi_positions,
        pi_settings.names(),
        x_limit,
    );
    SigmaPiDos {
        energies,
        sigma,
        pi,
        sigma_labels,
        pi_labels,
    }
}

#[cfg(test)]
mod test {
    use crate::{
        dos::site::project_sites,
        parser::doscar::{test::CO_DOSCAR, Doscar},
    };

    use super::{sigma_pi_peaks, PeakSettings};

    /// One atom; s carries two sigma peaks, p_x one pi peak.
    const PEAKED: &str = "       1       1       1       0
  0.1  0.1  0.1  0.1  0.5E-15
  1.0
  CAR
 C
     3.00000    -4.00000       8     0.00000     1.00000
   -4.0   0.0   0.0
   -3.0   0.0   0.0
   -2.0   0.0   0.0
   -1.0   0.0   0.0
    0.0   0.0   0.0
    1.0   0.0   0.0
    2.0   0.0   0.0
    3.0   0.0   0.0
     3.00000    -4.00000       8     0.00000     1.00000 2s 2p_y 2p_z 2p_x
   -4.0   0.0   0.0   0.0   0.0
   -3.0   1.0   0.0   0.0   0.0
   -2.0   2.0   0.0   0.0   0.0
   -1.0   0.5   0.0   0.0   2.0
    0.0   0.0   0.0   0.0   2.0
    1.0  30.0   0.0   0.0   0.0
    2.0  12.0   0.0   0.0   0.0
    3.0   0.0   0.0   0.0   0.0
";

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_sigma_pi_labels() {
        let doscar = Doscar::parse(PEAKED).unwrap();
        let site = project_sites(&doscar, &[0]).unwrap();
        let sigma = PeakSettings::new(0.9, names(&["3σ"]));
        let pi = PeakSettings::new(1.2, names(&["1π", "2π"]));
        let result = sigma_pi_peaks(&site, &sigma, &pi, 11.0);

        // Two sigma windows but only one name
        assert_eq!(result.sigma_labels().len(), 1);
        let s = &result.sigma_labels()[0];
        assert_eq!(s.text(), "3σ");
        assert!((s.x() - 1.1).abs() < 1e-12);
        assert!((s.energy() - -3.0).abs() < 1e-12);

        // pi is stacked on sigma, which is 0.5 at the pi maximum
        assert_eq!(result.pi_labels().len(), 1);
        let p = &result.pi_labels()[0];
        assert_eq!(p.text(), "1π");
        assert!((p.x() - 2.6).abs() < 1e-12);
        assert!((p.energy() - -1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_windows_no_labels() {
        let doscar = Doscar::parse(CO_DOSCAR).unwrap();
        let site = project_sites(&doscar, &[0, 1]).unwrap();
        // sigma = [2.5, 2.0, 1.0] never drops below 0.9; pi only rises at the end
        let sigma = PeakSettings::new(0.9, names(&["3σ"]));
        let pi = PeakSettings::new(1.2, names(&["1π"]));
        let result = sigma_pi_peaks(&site, &sigma, &pi, 11.0);
        assert!(result.sigma_labels().is_empty());
        assert!(result.pi_labels().is_empty());
        assert_eq!(result.sigma().len(), result.energies().len());
    }
}
