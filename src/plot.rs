/// SVG output of energy-resolved curves, energy on the vertical axis
use std::path::Path;

use log::info;
use ndarray::ArrayView1;
use plotters::prelude::*;

use crate::{
    cohp::{
        pool::{OrbitalPools, PoolResolution},
        Cohp, CohpCurve,
    },
    dos::{dos_util::SigmaPiDos, peaks::PeakLabel},
    error::{Error, Result},
};

pub const PALETTE: [RGBColor; 5] = [
    RGBColor(0x2a, 0x9d, 0x8f), // s
    RGBColor(0xe9, 0xc4, 0x6a), // p
    RGBColor(0xf4, 0xa2, 0x61),
    RGBColor(0xe7, 0x6f, 0x51),
    RGBColor(0x26, 0x46, 0x53), // total
];

/// One curve sampled on the shared energy grid.
#[derive(Debug, Clone)]
pub struct Series<'a> {
    label: String,
    values: ArrayView1<'a, f64>,
    colour: RGBColor,
}

impl<'a> Series<'a> {
    pub fn new(label: &str, values: ArrayView1<'a, f64>, colour: RGBColor) -> Self {
        Self {
            label: label.to_string(),
            values,
            colour,
        }
    }
}

/// Axis ranges and annotations of one panel.
#[derive(Debug, Clone)]
pub struct Panel<'a> {
    title: &'a str,
    x_desc: &'a str,
    x_range: (f64, f64),
    y_range: (f64, f64),
    /// Horizontal marker, e.g. the Fermi level
    fermi: Option<f64>,
    labels: &'a [PeakLabel],
}

impl<'a> Panel<'a> {
    pub fn new(title: &'a str, x_desc: &'a str, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            title,
            x_desc,
            x_range,
            y_range,
            fermi: None,
            labels: &[],
        }
    }

    pub fn with_fermi(mut self, fermi: f64) -> Self {
        self.fermi = Some(fermi);
        self
    }

    pub fn with_labels(mut self, labels: &'a [PeakLabel]) -> Self {
        self.labels = labels;
        self
    }
}

/// Smallest range holding every value of `series`, widened by 5 %.
pub fn span(series: &[Series]) -> (f64, f64) {
    let (lo, hi) = series
        .iter()
        .flat_map(|s| s.values.iter())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if lo > hi {
        return (-1.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1e-3);
    (lo - pad, hi + pad)
}

pub fn energy_range(energies: ArrayView1<f64>) -> (f64, f64) {
    energies
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
            (lo.min(*e), hi.max(*e))
        })
}

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

pub fn render_curves<P: AsRef<Path>>(
    path: P,
    panel: &Panel,
    energies: ArrayView1<f64>,
    series: &[Series],
) -> Result<()> {
    let root = SVGBackend::new(path.as_ref(), (600, 900)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let (x0, x1) = panel.x_range;
    let (y0, y1) = panel.y_range;
    let mut chart = ChartBuilder::on(&root)
        .caption(panel.title, ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc(panel.x_desc)
        .y_desc("Energy [eV]")
        .draw()
        .map_err(plot_err)?;

    for curve in series {
        let colour = curve.colour;
        chart
            .draw_series(LineSeries::new(
                curve
                    .values
                    .iter()
                    .zip(energies.iter())
                    .map(|(x, e)| (*x, *e)),
                &colour,
            ))
            .map_err(plot_err)?
            .label(curve.label.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], colour.stroke_width(2))
            });
    }
    if let Some(fermi) = panel.fermi {
        chart
            .draw_series(LineSeries::new(vec![(x0, fermi), (x1, fermi)], &RED))
            .map_err(plot_err)?
            .label("E_F")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
    }
    chart
        .draw_series(panel.labels.iter().map(|l| {
            Text::new(
                l.text().to_string(),
                (l.x(), l.energy()),
                ("sans-serif", 14).into_font(),
            )
        }))
        .map_err(plot_err)?;
    chart
        .configure_series_labels()
        .background_style(&WHITE)
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    info!("Saved {}", path.as_ref().display());
    Ok(())
}

/// COHP and ICOHP of one interaction; sigma and pi as well at orbital resolution.
pub fn render_cohp<P: AsRef<Path>>(
    path: P,
    cohp: &Cohp,
    title: &str,
    curve: &CohpCurve,
    pools: &OrbitalPools,
) -> Result<()> {
    let energies = cohp.energies();
    let (sigma, pi) = (pools.sigma(), pools.pi());
    let mut series = vec![
        Series::new("COHP", curve.cohp().view(), PALETTE[4]),
        Series::new("ICOHP", curve.icohp().view(), PALETTE[3]),
    ];
    if pools.resolution() == PoolResolution::Orbital {
        series.push(Series::new("σ", sigma.view(), PALETTE[0]));
        series.push(Series::new("π", pi.view(), PALETTE[1]));
    }
    let y_range = energy_range(energies);
    let panel = Panel::new(title, "COHP (-)", span(&series), y_range).with_fermi(0.0);
    render_curves(path, &panel, energies, &series)
}

/// Sigma and pi DOS, pi drawn stacked on sigma, with the peak labels.
pub fn render_sigma_pi<P: AsRef<Path>>(
    path: P,
    title: &str,
    dos: &SigmaPiDos,
    x_limit: f64,
) -> Result<()> {
    let energies = dos.energies();
    let stacked = dos.sigma() + dos.pi();
    let series = [
        Series::new("σ", dos.sigma().view(), PALETTE[0]),
        Series::new("σ+π", stacked.view(), PALETTE[1]),
    ];
    let labels: Vec<_> = dos
        .sigma_labels()
        .iter()
        .chain(dos.pi_labels())
        .cloned()
        .collect();
    let y_range = energy_range(energies.view());
    let panel = Panel::new(title, "pDOS (-)", (0.0, x_limit + 1.0), y_range)
        .with_fermi(0.0)
        .with_labels(&labels);
    render_curves(path, &panel, energies.view(), &series)
}

#[cfg(test)]
mod test {
    use std::{env, fs};

    use itertools_num::linspace;
    use ndarray::Array1;

    use super::{render_curves, span, Panel, Series, PALETTE};

    #[test]
    fn test_render_svg() {
        let energies: Array1<f64> = linspace(-10.0, 5.0, 151).collect();
        let curve = energies.mapv(|e| (-e * e / 4.0).exp());
        let path = env::temp_dir().join("lobster_rust_render_test.svg");
        let panel = Panel::new("test", "DOS", (0.0, 2.0), (-10.0, 5.0)).with_fermi(0.0);
        render_curves(
            &path,
            &panel,
            energies.view(),
            &[Series::new("s", curve.view(), PALETTE[0])],
        )
        .unwrap();
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_span() {
        let a = ndarray::array![-1.0, 0.0, f64::NAN];
        let b = ndarray::array![2.0, 3.0, 1.0];
        let (lo, hi) = span(&[
            Series::new("a", a.view(), PALETTE[0]),
            Series::new("b", b.view(), PALETTE[1]),
        ]);
        assert!((lo - -1.2).abs() < 1e-12);
        assert!((hi - 3.2).abs() < 1e-12);
        assert_eq!(span(&[]), (-1.0, 1.0));
    }
}
