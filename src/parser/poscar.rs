use std::path::Path;

use log::debug;
use na::{Matrix3, Vector3};

use crate::error::{Error, Format, Result};

use super::general::{parse_float_row, read_text};

/**
Struct representing a VASP POSCAR/CONTCAR (VASP 5 layout with a
species line).
# Field:
  * lattice: rows are the scaled lattice vectors, in Angstrom
  * species / counts: species symbols and number of atoms of each
  * positions: Cartesian positions, in file order
*/
#[derive(Debug, Clone)]
pub struct Poscar {
    comment: String,
    lattice: Matrix3<f64>,
    species: Vec<String>,
    counts: Vec<usize>,
    positions: Vec<Vector3<f64>>,
}

impl Poscar {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = read_text(&path)?;
        debug!("Read {}", path.as_ref().display());
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < 8 {
            return Err(Error::parse(Format::Poscar, lines.len(), "file too short"));
        }
        let comment = lines[0].trim().to_string();
        let scale = match parse_float_row(lines[1], Format::Poscar, 2)?.as_slice() {
            [s] => *s,
            _ => return Err(Error::parse(Format::Poscar, 2, "expected one scaling factor")),
        };
        let mut rows = [Vector3::zeros(); 3];
        for (k, row) in rows.iter_mut().enumerate() {
            *row = vector3(lines[2 + k], 3 + k)? * scale;
        }
        let lattice = Matrix3::from_rows(&[
            rows[0].transpose(),
            rows[1].transpose(),
            rows[2].transpose(),
        ]);

        let species: Vec<String> = lines[5].split_whitespace().map(String::from).collect();
        if species.iter().any(|s| s.parse::<f64>().is_ok()) {
            return Err(Error::parse(
                Format::Poscar,
                6,
                "species line is missing (VASP 4 layout is not supported)",
            ));
        }
        let counts = lines[6]
            .split_whitespace()
            .map(|t| t.parse::<usize>())
            .collect::<std::result::Result<Vec<usize>, _>>()
            .map_err(|e| Error::parse(Format::Poscar, 7, e.to_string()))?;
        if counts.len() != species.len() {
            return Err(Error::parse(
                Format::Poscar,
                7,
                format!("{} species but {} counts", species.len(), counts.len()),
            ));
        }

        let mut cursor = 7;
        if lines[cursor].trim_start().starts_with(['S', 's']) {
            cursor += 1; // Selective dynamics
        }
        let mode = lines
            .get(cursor)
            .map(|l| l.trim_start())
            .ok_or_else(|| Error::parse(Format::Poscar, cursor + 1, "missing coordinate mode"))?;
        let direct = !mode.starts_with(['C', 'c', 'K', 'k']);
        cursor += 1;

        let num_atoms: usize = counts.iter().sum();
        let mut positions = Vec::with_capacity(num_atoms);
        for k in 0..num_atoms {
            let line = lines.get(cursor + k).ok_or_else(|| {
                Error::parse(Format::Poscar, cursor + k + 1, "missing atomic position")
            })?;
            let raw = vector3(line, cursor + k + 1)?;
            let cartesian = if direct {
                // Fractional coordinates times the row lattice
                lattice.transpose() * raw
            } else {
                raw * scale
            };
            positions.push(cartesian);
        }

        Ok(Self {
            comment,
            lattice,
            species,
            counts,
            positions,
        })
    }

    pub fn comment(&self) -> &str {
        self.comment.as_ref()
    }

    pub fn lattice(&self) -> &Matrix3<f64> {
        &self.lattice
    }

    pub fn species(&self) -> &[String] {
        self.species.as_ref()
    }

    pub fn counts(&self) -> &[usize] {
        self.counts.as_ref()
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        self.positions.as_ref()
    }

    /// 0-based index of the first atom of `symbol`, counting through the
    /// species blocks in file order.
    pub fn first_atom_index(&self, symbol: &str) -> Result<usize> {
        let rank = self
            .species
            .iter()
            .position(|s| s == symbol)
            .ok_or_else(|| Error::UnknownSpecies(symbol.to_string()))?;
        Ok(self.counts[..rank].iter().sum())
    }

    pub fn cartesian(&self, index: usize) -> Result<&Vector3<f64>> {
        self.positions.get(index).ok_or(Error::AtomOutOfRange {
            index,
            available: self.positions.len(),
        })
    }

    /// z(second) - z(first), both Cartesian.
    pub fn z_separation(&self, first: usize, second: usize) -> Result<f64> {
        Ok(self.cartesian(second)?.z - self.cartesian(first)?.z)
    }
}

fn vector3(line: &str, line_no: usize) -> Result<Vector3<f64>> {
    // Selective dynamics flags and labels may trail the coordinates
    let numbers: Vec<&str> = line.split_whitespace().take(3).collect();
    let row = parse_float_row(&numbers.join(" "), Format::Poscar, line_no)?;
    match row.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(Error::parse(Format::Poscar, line_no, "expected three coordinates")),
    }
}

#[cfg(test)]
pub(crate) mod test {
    use crate::error::Error;

    use super::Poscar;

    pub(crate) const CO_ON_RH: &str = "CO on Rh(111)
1.0
  4.0 0.0 0.0
  0.0 4.0 0.0
  0.0 0.0 20.0
Rh C O
2 1 1
Selective dynamics
Direct
  0.00 0.00 0.10 T T F
  0.50 0.50 0.10 T T F
  0.00 0.00 0.20 F F F
  0.00 0.00 0.2575 F F T
";

    #[test]
    fn test_poscar_positions() {
        let poscar = Poscar::parse(CO_ON_RH).unwrap();
        assert_eq!(poscar.species(), ["Rh", "C", "O"]);
        assert_eq!(poscar.positions().len(), 4);
        assert_eq!(poscar.first_atom_index("Rh").unwrap(), 0);
        assert_eq!(poscar.first_atom_index("C").unwrap(), 2);
        assert_eq!(poscar.first_atom_index("O").unwrap(), 3);
        let rh = poscar.cartesian(1).unwrap();
        assert!((rh.x - 2.0).abs() < 1e-12 && (rh.z - 2.0).abs() < 1e-12);
        let bond = poscar.z_separation(2, 3).unwrap();
        assert!((bond - 1.15).abs() < 1e-9);
        assert!(matches!(
            poscar.first_atom_index("Pt"),
            Err(Error::UnknownSpecies(_))
        ));
    }

    #[test]
    fn test_cartesian_mode_is_scaled() {
        let text = CO_ON_RH
            .replace("1.0\n", "2.0\n")
            .replace("Direct", "Cartesian");
        let poscar = Poscar::parse(&text).unwrap();
        assert_eq!(poscar.lattice()[(2, 2)], 40.0);
        assert!((poscar.cartesian(3).unwrap().z - 0.515).abs() < 1e-12);
    }
}
