/**
Walk the step directories of a PES scan of CO over a surface. Each step
directory holds `COHPCAR.lobster`, `DOSCAR.lobster`, `CONTCAR` and a
`param.txt` with the displacement of the molecule.
*/
use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use rayon::prelude::*;

use crate::{
    cohp::{
        pool::{PoolOptions, PoolResolution},
        Cohp,
    },
    dos::{
        dos_util::{sigma_pi_peaks, PeakSettings, SigmaPiDos},
        site::project_sites,
    },
    error::{Error, Format, Result},
    parser::{
        doscar::Doscar,
        general::{parse_float_row, read_text},
        poscar::Poscar,
    },
    plot::{render_cohp, render_sigma_pi},
};

/// Surface to C distance of the unshifted structure, in Å.
pub const BASE_DISTANCE: f64 = 1.389121355;

pub const COHPCAR: &str = "COHPCAR.lobster";
pub const DOSCAR: &str = "DOSCAR.lobster";
pub const CONTCAR: &str = "CONTCAR";
pub const PARAM: &str = "param.txt";

#[derive(Debug, Clone)]
pub struct ScanOptions {
    base_distance: f64,
    /// 0-based position of the interaction whose ICOHP is reported
    interaction: usize,
    species: Vec<String>,
    sigma: PeakSettings,
    pi: PeakSettings,
    x_limit: f64,
    plots: bool,
}

impl ScanOptions {
    pub fn new(
        base_distance: f64,
        interaction: usize,
        species: Vec<String>,
        sigma: PeakSettings,
        pi: PeakSettings,
        x_limit: f64,
        plots: bool,
    ) -> Self {
        Self {
            base_distance,
            interaction,
            species,
            sigma,
            pi,
            x_limit,
            plots,
        }
    }

    pub fn base_distance(&self) -> f64 {
        self.base_distance
    }

    pub fn species(&self) -> &[String] {
        self.species.as_ref()
    }

    pub fn plots(&self) -> bool {
        self.plots
    }
}

/// Everything extracted from one step directory.
#[derive(Debug, Clone)]
pub struct StepResult {
    step: usize,
    distance: f64,
    bond_length: Option<f64>,
    icohp_at_fermi: f64,
    dos: SigmaPiDos,
}

impl StepResult {
    pub fn step(&self) -> usize {
        self.step
    }

    /// Surface distance: displacement plus the base distance.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// z separation of the first two species; `None` with fewer species.
    pub fn bond_length(&self) -> Option<f64> {
        self.bond_length
    }

    pub fn icohp_at_fermi(&self) -> f64 {
        self.icohp_at_fermi
    }

    pub fn dos(&self) -> &SigmaPiDos {
        &self.dos
    }
}

/// Numbered subdirectories of `root`, sorted by step number.
pub fn discover_steps<P: AsRef<Path>>(root: P) -> Result<Vec<(usize, PathBuf)>> {
    let root = root.as_ref();
    let entries = fs::read_dir(root).map_err(|e| Error::io(root, e))?;
    let mut steps = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(root, e))?.path();
        if !path.is_dir() {
            continue;
        }
        let number = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse::<usize>().ok());
        if let Some(n) = number {
            steps.push((n, path));
        }
    }
    steps.sort_by_key(|(n, _)| *n);
    Ok(steps)
}

/// First number of `param.txt`.
pub fn read_displacement<P: AsRef<Path>>(path: P) -> Result<f64> {
    let text = read_text(path)?;
    let (line_no, line) = text
        .lines()
        .enumerate()
        .find(|(_, line)| !line.trim().is_empty())
        .ok_or_else(|| Error::parse(Format::ScanParam, 1, "file is empty"))?;
    let first = line.split_whitespace().take(1).collect::<String>();
    let row = parse_float_row(&first, Format::ScanParam, line_no + 1)?;
    Ok(row[0])
}

pub fn analyse_step<P: AsRef<Path>>(
    dir: P,
    step: usize,
    options: &ScanOptions,
) -> Result<StepResult> {
    let dir = dir.as_ref();
    let distance = read_displacement(dir.join(PARAM))? + options.base_distance;

    let contcar = Poscar::from_file(dir.join(CONTCAR))?;
    let atoms = options
        .species
        .iter()
        .map(|symbol| contcar.first_atom_index(symbol))
        .collect::<Result<Vec<usize>>>()?;
    let bond_length = match atoms.as_slice() {
        [a, b, ..] => Some(contcar.z_separation(*a, *b)?),
        _ => None,
    };

    let doscar = Doscar::from_file(dir.join(DOSCAR))?;
    let site = project_sites(&doscar, &atoms)?;
    let dos = sigma_pi_peaks(&site, &options.sigma, &options.pi, options.x_limit);

    let cohp = Cohp::from_file(dir.join(COHPCAR))?;
    let curve = cohp.interaction_curve(options.interaction)?;
    let icohp_at_fermi = cohp.icohp_at_fermi(&curve);

    if options.plots {
        let pools = cohp.pools(&PoolOptions::new(PoolResolution::Orbital, None))?;
        let title = format!("step {step}: d = {distance:.2} Å");
        render_cohp(
            dir.join(format!("{step}_cohp.svg")),
            &cohp,
            &title,
            &curve,
            &pools,
        )?;
        render_sigma_pi(
            dir.join(format!("{step}_dos.svg")),
            &title,
            &dos,
            options.x_limit,
        )?;
    }
    debug!(
        "Step {}: d = {:.3}, ICOHP(E_F) = {:.4}",
        step, distance, icohp_at_fermi
    );
    Ok(StepResult {
        step,
        distance,
        bond_length,
        icohp_at_fermi,
        dos,
    })
}

/// Analyse every step under `root` in parallel; results come back in step order.
pub fn run_scan<P: AsRef<Path>>(root: P, options: &ScanOptions) -> Result<Vec<StepResult>> {
    let steps = discover_steps(root.as_ref())?;
    info!(
        "Found {} scan steps under {}",
        steps.len(),
        root.as_ref().display()
    );
    steps
        .par_iter()
        .map(|(step, dir)| analyse_step(dir, *step, options))
        .collect()
}

/// Whitespace separated table, one row per step.
pub fn format_summary(results: &[StepResult]) -> String {
    let mut table = String::from("# step  d_surface  d_bond  icohp_ef  n_sigma  n_pi\n");
    for r in results {
        let bond = r
            .bond_length
            .map(|b| format!("{b:.4}"))
            .unwrap_or_else(|| "nan".to_string());
        table.push_str(&format!(
            "{:>6} {:>10.4} {:>7} {:>9.5} {:>8} {:>5}\n",
            r.step,
            r.distance,
            bond,
            r.icohp_at_fermi,
            r.dos.sigma_labels().len(),
            r.dos.pi_labels().len()
        ));
    }
    table
}

pub fn write_summary<P: AsRef<Path>>(path: P, results: &[StepResult]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_summary(results)).map_err(|e| Error::io(path, e))?;
    info!("Scan summary written to {}", path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod test {
    use std::{env, fs, path::PathBuf};

    use crate::{dos::dos_util::PeakSettings, error::Error, parser::doscar::test::CO_DOSCAR};

    use super::{
        discover_steps, format_summary, read_displacement, run_scan, ScanOptions, BASE_DISTANCE,
        CONTCAR, COHPCAR, DOSCAR, PARAM,
    };

    /// Rh1->C3 total bond plus the C-O s-s and p_z-p_z interactions.
    pub(crate) const CO_COHPCAR: &str = "COHPCAR.lobster
       4       1       3     -10.00000      5.00000     -6.00000
Average
No.1:Rh1->C3(1.89)
No.2:C3[2s]->O4[2s](1.15)
No.3:C3[2p_z]->O4[2p_z](1.15)
 -1.0 0.0 0.0 -0.5 -0.1 1.0 0.1 2.0 0.2
  0.0 0.0 0.0 -1.5 -0.4 3.0 0.4 4.0 0.6
  1.0 0.0 0.0 -2.5 -0.9 5.0 0.9 6.0 1.2
";

    /// Matches the two atoms of the DOS fixture.
    pub(crate) const GAS_CO: &str = "CO in vacuum
1.0
  10.0 0.0 0.0
  0.0 10.0 0.0
  0.0 0.0 10.0
C O
1 1
Cartesian
  5.0 5.0 5.0
  5.0 5.0 6.15
";

    pub(crate) fn options(plots: bool) -> ScanOptions {
        ScanOptions::new(
            BASE_DISTANCE,
            0,
            vec!["C".to_string(), "O".to_string()],
            PeakSettings::new(0.9, vec!["3σ".to_string()]),
            PeakSettings::new(1.2, vec!["1π".to_string()]),
            11.0,
            plots,
        )
    }

    /// A scan tree with `steps` identical steps, displaced by 0.1 Å each.
    pub(crate) fn write_scan(name: &str, steps: usize) -> PathBuf {
        let root = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&root);
        for n in 1..=steps {
            let dir = root.join(n.to_string());
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(COHPCAR), CO_COHPCAR).unwrap();
            fs::write(dir.join(DOSCAR), CO_DOSCAR).unwrap();
            fs::write(dir.join(CONTCAR), GAS_CO).unwrap();
            fs::write(dir.join(PARAM), format!("{:.1}\n", 0.1 * (n - 1) as f64)).unwrap();
        }
        fs::write(root.join("notes.txt"), "not a step").unwrap();
        fs::create_dir_all(root.join("images")).unwrap();
        root
    }

    #[test]
    fn test_discover_steps_sorted_numerically() {
        let root = env::temp_dir().join("lobster_rust_discover");
        let _ = fs::remove_dir_all(&root);
        for name in ["10", "2", "1", "images"] {
            fs::create_dir_all(root.join(name)).unwrap();
        }
        let steps: Vec<usize> = discover_steps(&root)
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(steps, vec![1, 2, 10]);
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_read_displacement() {
        let path = env::temp_dir().join("lobster_rust_param.txt");
        fs::write(&path, "\n  0.25  12\n").unwrap();
        assert_eq!(read_displacement(&path).unwrap(), 0.25);
        fs::write(&path, "").unwrap();
        assert!(matches!(
            read_displacement(&path),
            Err(Error::Parse { .. })
        ));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_root() {
        let root = env::temp_dir().join("lobster_rust_no_such_scan");
        assert!(matches!(
            run_scan(&root, &options(false)),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_scan_summary() {
        let root = write_scan("lobster_rust_scan_summary", 3);
        let results = run_scan(&root, &options(false));
        fs::remove_dir_all(&root).unwrap();
        let results = results.unwrap();
        assert_eq!(
            results.iter().map(|r| r.step()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!((results[2].distance() - (0.2 + BASE_DISTANCE)).abs() < 1e-12);
        assert!((results[0].bond_length().unwrap() - 1.15).abs() < 1e-9);
        assert_eq!(results[1].icohp_at_fermi(), -0.4);

        let table = format_summary(&results);
        assert_eq!(table.lines().count(), 4);
        let row: Vec<&str> = table.lines().nth(2).unwrap().split_whitespace().collect();
        assert_eq!(row[0], "2");
        assert_eq!(row[3], "-0.40000");
    }
}
