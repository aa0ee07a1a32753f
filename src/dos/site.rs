use std::collections::BTreeMap;

use log::debug;
use ndarray::Array1;

use crate::{
    error::Result,
    parser::doscar::{strip_principal, Doscar},
};

/// Orbital-projected DOS summed over a set of atoms, spin channels added.
#[derive(Debug, Clone)]
pub struct SiteProjection {
    atoms: Vec<usize>,
    energies: Array1<f64>,
    /// keyed by orbital name without principal quantum number, e.g. `p_z`
    channels: BTreeMap<String, Array1<f64>>,
}

impl SiteProjection {
    pub fn atoms(&self) -> &[usize] {
        self.atoms.as_ref()
    }

    pub fn energies(&self) -> &Array1<f64> {
        &self.energies
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(|k| k.as_str())
    }

    /// Channel by name; orbitals none of the atoms carry read as zeros.
    pub fn channel(&self, name: &str) -> Array1<f64> {
        self.channels
            .get(name)
            .cloned()
            .unwrap_or_else(|| Array1::zeros(self.energies.len()))
    }

    /// s + p_z, the sigma-symmetric part along the surface normal.
    pub fn sigma(&self) -> Array1<f64> {
        self.channel("s") + self.channel("p_z")
    }

    /// p_x + p_y
    pub fn pi(&self) -> Array1<f64> {
        self.channel("p_x") + self.channel("p_y")
    }
}

/**
Sum every orbital channel over the given atoms.
# Arguments:
  * `doscar`: parsed DOSCAR
  * `atoms`: 0-based atom indices, in DOSCAR block order
*/
pub fn project_sites(doscar: &Doscar, atoms: &[usize]) -> Result<SiteProjection> {
    let mut energies: Option<Array1<f64>> = None;
    let mut channels: BTreeMap<String, Array1<f64>> = BTreeMap::new();
    for &index in atoms {
        let atom = doscar.atom(index)?;
        energies.get_or_insert_with(|| atom.energies().to_owned());
        for orbital in atom.orbitals() {
            if let Some(values) = atom.spin_summed(orbital) {
                let name = strip_principal(orbital).to_string();
                match channels.get_mut(&name) {
                    Some(sum) => *sum += &values,
                    None => {
                        channels.insert(name, values);
                    }
                }
            }
        }
    }
    debug!("Projected DOS over atoms {:?}", atoms);
    Ok(SiteProjection {
        atoms: atoms.to_vec(),
        energies: energies.unwrap_or_else(|| Array1::zeros(doscar.num_points())),
        channels,
    })
}

#[cfg(test)]
mod test {
    use ndarray::array;

    use crate::parser::doscar::{test::CO_DOSCAR, Doscar};

    use super::project_sites;

    #[test]
    fn test_sigma_pi_over_two_atoms() {
        let doscar = Doscar::parse(CO_DOSCAR).unwrap();
        let site = project_sites(&doscar, &[0, 1]).unwrap();
        assert_eq!(site.channel("s"), array![1.5, 2.0, 0.0]);
        assert_eq!(site.sigma(), array![2.5, 2.0, 1.0]);
        let pi = site.pi();
        array![0.0, 0.6, 6.0]
            .iter()
            .zip(pi.iter())
            .for_each(|(a, b)| assert!((a - b).abs() < 1e-12));
        assert_eq!(site.channel("d_xy"), array![0.0, 0.0, 0.0]);
        assert!(project_sites(&doscar, &[5]).is_err());
    }
}
