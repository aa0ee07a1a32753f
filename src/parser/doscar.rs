use std::path::Path;

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{Error, Format, Result};

use super::general::{float, parse_float_row, read_text};

/// Orbital order LOBSTER uses for an s/p basis when a block header
/// carries no labels.
const DEFAULT_SP_ORBITALS: [&str; 4] = ["s", "p_y", "p_z", "p_x"];

/// Drop the principal quantum number: `2p_z` -> `p_z`.
pub fn strip_principal(label: &str) -> &str {
    label.trim_start_matches(|c: char| c.is_ascii_digit())
}

/**
Projected DOS of one atom in `DOSCAR.lobster`.
Columns: energy, then one column per orbital, up/down interleaved
when spin-polarised.
*/
#[derive(Debug, Clone)]
pub struct AtomDos {
    orbitals: Vec<String>,
    num_spins: u8,
    /// dimension = (num_points, 1 + num_orbitals * num_spins)
    data: Array2<f64>,
}

impl AtomDos {
    pub fn new(orbitals: Vec<String>, num_spins: u8, data: Array2<f64>) -> Self {
        Self {
            orbitals,
            num_spins,
            data,
        }
    }

    pub fn orbitals(&self) -> &[String] {
        self.orbitals.as_ref()
    }

    pub fn energies(&self) -> ArrayView1<f64> {
        self.data.column(0)
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Orbital channel at the given spin (1 or 2). `name` may omit the
    /// principal quantum number.
    pub fn channel(&self, name: &str, spin: u8) -> Option<ArrayView1<f64>> {
        if spin == 0 || spin > self.num_spins {
            return None;
        }
        let k = self
            .orbitals
            .iter()
            .position(|o| o == name || strip_principal(o) == name)?;
        let column = 1 + k * self.num_spins as usize + (spin - 1) as usize;
        (column < self.data.ncols()).then(|| self.data.column(column))
    }

    /// Channel with both spins added.
    pub fn spin_summed(&self, name: &str) -> Option<Array1<f64>> {
        (1..=self.num_spins)
            .map(|spin| self.channel(name, spin))
            .try_fold(Array1::zeros(self.data.nrows()), |acc, ch| {
                ch.map(|c| acc + &c)
            })
    }
}

/**
Parsed `DOSCAR.lobster`.
 line 1: num_atoms ...
 lines 2-5: ignored
 line 6: Emax Emin NEDOS Efermi weight
 NEDOS rows of total DOS: E DOS IDOS (E DOS_up DOS_dn IDOS_up IDOS_dn if polarised)
 then per atom: a line like line 6, optionally followed by orbital labels,
 and NEDOS rows of projected DOS.
*/
#[derive(Debug, Clone)]
pub struct Doscar {
    num_spins: u8,
    e_max: f64,
    e_min: f64,
    num_points: usize,
    e_fermi: f64,
    total: Array2<f64>,
    atoms: Vec<AtomDos>,
}

impl Doscar {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = read_text(&path)?;
        debug!("Read {}", path.as_ref().display());
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let num_atoms = lines
            .first()
            .and_then(|l| l.split_whitespace().next())
            .and_then(|t| t.parse::<usize>().ok())
            .ok_or_else(|| Error::parse(Format::Doscar, 1, "missing number of atoms"))?;
        let (e_max, e_min, num_points, e_fermi, _) = block_header(&lines, 5)?;

        let total = read_block(&lines, 6, num_points)?;
        let num_spins = match total.ncols() {
            3 => 1,
            5 => 2,
            n => {
                return Err(Error::parse(
                    Format::Doscar,
                    7,
                    format!("total DOS has {n} columns, expected 3 or 5"),
                ))
            }
        };

        let mut atoms = Vec::with_capacity(num_atoms);
        let mut cursor = 6 + num_points;
        for atom in 0..num_atoms {
            if cursor >= lines.len() {
                warn!("DOSCAR holds projections for {atom} of {num_atoms} atoms");
                break;
            }
            let (_, _, points, _, labels) = block_header(&lines, cursor)?;
            if points != num_points {
                return Err(Error::parse(
                    Format::Doscar,
                    cursor + 1,
                    format!("atom block has {points} points, expected {num_points}"),
                ));
            }
            let data = read_block(&lines, cursor + 1, num_points)?;
            let num_orbitals = (data.ncols() - 1) / num_spins as usize;
            let orbitals = if labels.len() == num_orbitals {
                labels
            } else if num_orbitals == DEFAULT_SP_ORBITALS.len() {
                DEFAULT_SP_ORBITALS.iter().map(|o| o.to_string()).collect()
            } else {
                (1..=num_orbitals).map(|k| format!("orbital{k}")).collect()
            };
            atoms.push(AtomDos::new(orbitals, num_spins, data));
            cursor += 1 + num_points;
        }

        Ok(Self {
            num_spins,
            e_max,
            e_min,
            num_points,
            e_fermi,
            total,
            atoms,
        })
    }

    pub fn num_spins(&self) -> u8 {
        self.num_spins
    }

    pub fn e_max(&self) -> f64 {
        self.e_max
    }

    pub fn e_min(&self) -> f64 {
        self.e_min
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn e_fermi(&self) -> f64 {
        self.e_fermi
    }

    pub fn total(&self) -> &Array2<f64> {
        &self.total
    }

    pub fn atoms(&self) -> &[AtomDos] {
        self.atoms.as_ref()
    }

    /// Projection of the atom at 0-based `index`.
    pub fn atom(&self, index: usize) -> Result<&AtomDos> {
        self.atoms.get(index).ok_or(Error::AtomOutOfRange {
            index,
            available: self.atoms.len(),
        })
    }
}

type BlockHeader = (f64, f64, usize, f64, Vec<String>);

/// `Emax Emin NEDOS Efermi weight [labels...]` at 0-based line `at`.
fn block_header(lines: &[&str], at: usize) -> Result<BlockHeader> {
    let line = lines
        .get(at)
        .ok_or_else(|| Error::parse(Format::Doscar, at + 1, "missing block header"))?;
    let mut numbers = Vec::new();
    let mut labels = Vec::new();
    for token in line.split_whitespace() {
        match float(token) {
            Ok(("", value)) if labels.is_empty() => numbers.push(value),
            _ => labels.push(token.to_string()),
        }
    }
    if numbers.len() < 4 || numbers[2] < 0.0 || numbers[2].fract() != 0.0 {
        return Err(Error::parse(
            Format::Doscar,
            at + 1,
            "expected Emax Emin NEDOS Efermi",
        ));
    }
    Ok((numbers[0], numbers[1], numbers[2] as usize, numbers[3], labels))
}

/// `rows` float rows starting at 0-based line `at`.
fn read_block(lines: &[&str], at: usize, rows: usize) -> Result<Array2<f64>> {
    if at + rows > lines.len() {
        return Err(Error::parse(
            Format::Doscar,
            lines.len(),
            format!("expected {rows} rows from line {}", at + 1),
        ));
    }
    let mut width = None;
    let mut flat = Vec::new();
    for (offset, line) in lines[at..at + rows].iter().enumerate() {
        let line_no = at + offset + 1;
        let row = parse_float_row(line, Format::Doscar, line_no)?;
        let expected = *width.get_or_insert(row.len());
        if row.len() != expected {
            return Err(Error::RaggedRow {
                row: line_no,
                found: row.len(),
                expected,
            });
        }
        flat.extend(row);
    }
    Array2::from_shape_vec((rows, width.unwrap_or(0)), flat)
        .map_err(|e| Error::parse(Format::Doscar, at + 1, e.to_string()))
}
