use ndarray::Array1;

use crate::parser::doscar::Doscar;

pub mod dos_util;
pub mod peaks;
pub mod site;

/// Total density of states read from a DOSCAR, energies relative to E_F.
/// Spin 1 is always present; spin 2 only for spin-polarised runs.
#[derive(Debug, Clone)]
pub struct DOS {
    spin: u8,
    energies: Array1<f64>,
    dos: (Array1<f64>, Option<Array1<f64>>),
    idos: (Array1<f64>, Option<Array1<f64>>),
}

impl DOS {
    pub fn new(
        spin: u8,
        energies: Array1<f64>,
        dos: (Array1<f64>, Option<Array1<f64>>),
        idos: (Array1<f64>, Option<Array1<f64>>),
    ) -> Self {
        Self {
            spin,
            energies,
            dos,
            idos,
        }
    }

    /// Columns `E DOS IDOS`, or `E DOS_up DOS_dn IDOS_up IDOS_dn`.
    pub fn from_doscar(doscar: &Doscar) -> Self {
        let total = doscar.total();
        let column = |k: usize| total.column(k).to_owned();
        if doscar.num_spins() == 1 {
            Self::new(1, column(0), (column(1), None), (column(2), None))
        } else {
            Self::new(
                2,
                column(0),
                (column(1), Some(column(2))),
                (column(3), Some(column(4))),
            )
        }
    }

    pub fn spin(&self) -> u8 {
        self.spin
    }

    pub fn num_points(&self) -> usize {
        self.energies.len()
    }

    pub fn energies(&self) -> &Array1<f64> {
        &self.energies
    }

    pub fn dos(&self) -> &(Array1<f64>, Option<Array1<f64>>) {
        &self.dos
    }

    pub fn idos(&self) -> &(Array1<f64>, Option<Array1<f64>>) {
        &self.idos
    }

    /// DOS with both spin channels added.
    pub fn spin_summed(&self) -> Array1<f64> {
        match &self.dos {
            (up, Some(down)) => up + down,
            (up, None) => up.clone(),
        }
    }
}
