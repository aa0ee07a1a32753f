/**
Define and control Structs for deserialization of the config.toml
*/
use std::path::Path;

use serde::Deserialize;

use crate::{error::Result, parser::general::read_text};

use self::{cohp_config::CohpTask, dos_config::DosTask, scan_config::ScanTask};
pub mod cohp_config;
pub mod dos_config;
pub mod scan_config;

/**
Config file struct for deserialization
# Field:
  * title: String,
  * tasks: Task - Struct of Task
*/
#[derive(Deserialize, Debug)]
pub struct Config {
    title: String,
    tasks: Task,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = read_text(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn title(&self) -> &str {
        self.title.as_ref()
    }

    pub fn tasks(&self) -> &Task {
        &self.tasks
    }
}

/**
Tasks of a run. Each section is optional; absent sections are skipped.
# Field:
  * cohp: Option<CohpTask> - COHP curves and orbital pools of one COHPCAR
  * dos: Option<DosTask> - sigma/pi site DOS with peak labels
  * scan: Option<ScanTask> - every step of a PES scan
*/
#[derive(Deserialize, Debug)]
pub struct Task {
    cohp: Option<CohpTask>,
    dos: Option<DosTask>,
    scan: Option<ScanTask>,
}

impl Task {
    pub fn cohp(&self) -> Option<&CohpTask> {
        self.cohp.as_ref()
    }

    pub fn dos(&self) -> Option<&DosTask> {
        self.dos.as_ref()
    }

    pub fn scan(&self) -> Option<&ScanTask> {
        self.scan.as_ref()
    }
}

pub trait TaskProcess {
    type Output;
    fn task_execute(&self) -> Result<Self::Output>;
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use crate::{cohp::pool::PoolResolution, error::Error};

    use super::Config;

    #[test]
    fn test_toml() {
        let config = Config::from_toml(
            r#"title = "lobster-rust config"

[tasks]
[tasks.cohp]
cohpcar = "./1/COHPCAR.lobster"
resolution = "orbital"
atom_pair = [37, 38]

[tasks.dos]
doscar = "./1/DOSCAR.lobster"
poscar = "./1/CONTCAR"
[tasks.dos.pi]
threshold = 1.5
labels = ["1π"]

[tasks.scan]
root = "./output"
plots = true
"#,
        )
        .unwrap();
        assert_eq!(config.title(), "lobster-rust config");
        let cohp = config.tasks().cohp().unwrap();
        assert_eq!(cohp.resolution(), PoolResolution::Orbital);
        assert_eq!(cohp.atom_pair(), Some((37, 38)));
        assert_eq!(cohp.interaction(), 0);

        let dos = config.tasks().dos().unwrap();
        assert_eq!(dos.species(), ["C".to_string(), "O".to_string()]);
        assert_eq!(dos.sigma().threshold(), 0.9);
        assert_eq!(dos.sigma().labels().len(), 4);
        assert_eq!(dos.pi().threshold(), 1.5);
        assert_eq!(dos.x_limit(), 11.0);

        let scan = config.tasks().scan().unwrap();
        assert_eq!(scan.root(), Path::new("./output"));
        assert_eq!(scan.base_distance(), 1.389121355);
        assert!(scan.plots());
    }

    #[test]
    fn test_empty_tasks() {
        let config = Config::from_toml("title = \"nothing\"\n[tasks]\n").unwrap();
        assert!(config.tasks().cohp().is_none());
        assert!(config.tasks().scan().is_none());
    }

    #[test]
    fn test_bad_resolution() {
        let err = Config::from_toml(
            "title = \"t\"\n[tasks.cohp]\ncohpcar = \"x\"\nresolution = \"atom\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
