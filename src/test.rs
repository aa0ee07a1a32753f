use std::{env, fs, path::PathBuf};

use crate::{
    config::{Config, TaskProcess},
    error::Error,
    parser::doscar::test::CO_DOSCAR,
    scan::test::{CO_COHPCAR, GAS_CO},
};

fn workdir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_config_file_tasks() {
    let dir = workdir("lobster_rust_config_tasks");
    fs::write(dir.join("COHPCAR.lobster"), CO_COHPCAR).unwrap();
    fs::write(dir.join("DOSCAR.lobster"), CO_DOSCAR).unwrap();
    fs::write(dir.join("CONTCAR"), GAS_CO).unwrap();
    let config_path = dir.join("config.toml");
    fs::write(
        &config_path,
        format!(
            r#"title = "CO"
[tasks.cohp]
cohpcar = "{dir}/COHPCAR.lobster"
atom_pair = [3, 4]
output = "{dir}/cohp.svg"

[tasks.dos]
doscar = "{dir}/DOSCAR.lobster"
poscar = "{dir}/CONTCAR"
output = "{dir}/dos.svg"
"#,
            dir = dir.display()
        ),
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    let cohp = config.tasks().cohp().unwrap().task_execute().unwrap();
    let dos = config.tasks().dos().unwrap().task_execute().unwrap();
    let svgs = dir.join("cohp.svg").exists() && dir.join("dos.svg").exists();
    fs::remove_dir_all(&dir).unwrap();

    // Shell resolution: both C3->O4 interactions land in ss and pp
    assert_eq!(cohp.pools().contributions("ss"), 1);
    assert_eq!(cohp.pools().contributions("pp"), 1);
    assert_eq!(cohp.pools().pool("pp"), ndarray::array![2.0, 4.0, 6.0]);
    assert_eq!(cohp.pools().pool("sd"), ndarray::array![0.0, 0.0, 0.0]);
    assert_eq!(dos.sigma(), &ndarray::array![2.5, 2.0, 1.0]);
    assert!(svgs);
}

#[test]
fn test_malformed_cohpcar_file() {
    let dir = workdir("lobster_rust_malformed");
    let path = dir.join("COHPCAR.lobster");
    fs::write(&path, CO_COHPCAR.replace("No.2:C3[2s]->O4[2s]", "No.2:C3[2s]=>O4[2s]")).unwrap();
    let result = crate::cohp::Cohp::from_file(&path);
    fs::remove_dir_all(&dir).unwrap();
    match result {
        Err(Error::MalformedInteraction { line }) => {
            assert_eq!(line, "No.2:C3[2s]=>O4[2s](1.15)")
        }
        other => panic!("expected a malformed interaction, got {:?}", other),
    }
}

#[test]
fn test_missing_file_reports_path() {
    let path = env::temp_dir().join("lobster_rust_missing").join("COHPCAR.lobster");
    match crate::cohp::Cohp::from_file(&path) {
        Err(Error::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}
