/// Peak detection and labelling on a projected DOS curve
use log::debug;
use ndarray::{s, Array1, ArrayView1};
use ndarray_stats::QuantileExt;

/// Peaks whose integrated weight changes less than this are ignored.
const MIN_PEAK_WEIGHT: f64 = 0.00001;
/// Horizontal gap between a peak maximum and its label.
const LABEL_OFFSET: f64 = 0.1;
/// Labels are drawn this far below the window centre.
const LABEL_DROP: f64 = 0.5;

/**
Integrate the DOS as a running sum with a uniform step
`dx = (|e_first| + |e_last|) / n`.
The step only equals the grid spacing when the grid spans zero, which is
the case for energies relative to the Fermi level.
*/
pub fn integrate_dos(dos: ArrayView1<f64>, energies: ArrayView1<f64>) -> Array1<f64> {
    let n = energies.len();
    let mut idos = Array1::zeros(n);
    if n == 0 {
        return idos;
    }
    let dx = (energies[0].abs() + energies[n - 1].abs()) / n as f64;
    let mut running = 0.0;
    for (i, value) in dos.iter().take(n).enumerate() {
        running += value * dx;
        idos[i] = running;
    }
    idos
}

/// A region where |DOS| stays at or above the threshold, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakWindow {
    start: usize,
    end: usize,
}

impl PeakWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Change of the integrated DOS across the window.
    pub fn weight(&self, idos: ArrayView1<f64>) -> f64 {
        idos[self.end] - idos[self.start]
    }
}

/**
Indices where |DOS| crosses the threshold: `i + 1` when it switches on,
`i` when it switches off. Edges are returned in grid order.
*/
pub fn find_peak_edges(threshold: f64, dos: ArrayView1<f64>) -> Vec<usize> {
    let above: Vec<bool> = dos.iter().map(|x| x.abs() >= threshold).collect();
    let mut edges = Vec::new();
    for (i, pair) in above.windows(2).enumerate() {
        match (pair[0], pair[1]) {
            (false, true) => edges.push(i + 1),
            (true, false) => edges.push(i),
            _ => (),
        }
    }
    edges
}

/// Pair consecutive edges into windows. A trailing unpaired edge (a peak
/// still open at the end of the grid) is dropped.
pub fn peak_windows(edges: &[usize]) -> Vec<PeakWindow> {
    edges
        .chunks_exact(2)
        .map(|pair| PeakWindow::new(pair[0], pair[1]))
        .collect()
}

pub fn find_peaks(threshold: f64, dos: ArrayView1<f64>) -> Vec<PeakWindow> {
    peak_windows(&find_peak_edges(threshold, dos))
}

/// Where the label of a window goes on the DOS axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPosition {
    window: usize,
    x: f64,
    max_index: usize,
}

impl PeakPosition {
    /// Index of the window this position belongs to.
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    /// Grid index of the peak maximum.
    pub fn max_index(&self) -> usize {
        self.max_index
    }
}

/**
Label positions for windows carrying weight: just right of the highest
DOS value in `start..end`.
*/
pub fn peak_label_positions(
    dos: ArrayView1<f64>,
    idos: ArrayView1<f64>,
    windows: &[PeakWindow],
) -> Vec<PeakPosition> {
    windows
        .iter()
        .enumerate()
        .filter(|(_, w)| w.weight(idos).abs() > MIN_PEAK_WEIGHT && w.end > w.start)
        .filter_map(|(k, w)| {
            let region = dos.slice(s![w.start..w.end]);
            let peak = *region.max_skipnan();
            let offset = region.iter().position(|v| *v == peak)?;
            Some(PeakPosition {
                window: k,
                x: peak + LABEL_OFFSET,
                max_index: w.start + offset,
            })
        })
        .collect()
}

/// Shift positions of a curve drawn stacked on top of `lower`.
pub fn stack_on(positions: &mut [PeakPosition], lower: ArrayView1<f64>) {
    positions
        .iter_mut()
        .for_each(|p| p.x += lower[p.max_index]);
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeakLabel {
    text: String,
    x: f64,
    energy: f64,
}

impl PeakLabel {
    pub fn text(&self) -> &str {
        self.text.as_ref()
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }
}

/**
Attach names to the weighted windows. A window takes the name at its own
index in `windows`; windows past the end of `names`, or with an empty
name, get no label. Positions beyond `x_limit` are pulled back onto it.
*/
pub fn place_labels(
    energies: ArrayView1<f64>,
    windows: &[PeakWindow],
    positions: &[PeakPosition],
    names: &[String],
    x_limit: f64,
) -> Vec<PeakLabel> {
    let labels: Vec<PeakLabel> = positions
        .iter()
        .filter_map(|p| {
            let name = names.get(p.window).filter(|n| !n.is_empty())?;
            let w = windows.get(p.window)?;
            let (e1, e2) = (energies[w.start], energies[w.end]);
            Some(PeakLabel {
                text: name.clone(),
                x: p.x.min(x_limit),
                energy: e1 + ((e1 - e2) / 2.0).abs() - LABEL_DROP,
            })
        })
        .collect();
    debug!("Placed {} of {} peak labels", labels.len(), windows.len());
    labels
}

#[cfg(test)]
mod test {
    use ndarray::{array, Array1};

    use super::{
        find_peak_edges, find_peaks, integrate_dos, peak_label_positions, place_labels,
        stack_on, PeakWindow,
    };

    #[test]
    fn test_integrate_uniform_step() {
        let e = array![-2.0, -1.0, 0.0, 1.0];
        let dos = array![1.0, 1.0, 2.0, 0.0];
        // dx = (2 + 1) / 4
        let idos = integrate_dos(dos.view(), e.view());
        assert_eq!(idos, array![0.75, 1.5, 3.0, 3.0]);
    }

    #[test]
    fn test_edges_and_windows() {
        let dos = array![0.0, 1.0, 2.0, 0.5, 0.0, -1.5, -1.0, 0.0];
        assert_eq!(find_peak_edges(0.9, dos.view()), vec![1, 2, 5, 6]);
        assert_eq!(
            find_peaks(0.9, dos.view()),
            vec![PeakWindow::new(1, 2), PeakWindow::new(5, 6)]
        );
        // Open peak at the end of the grid yields a lone edge
        let open = array![0.0, 0.0, 2.0, 2.0];
        assert_eq!(find_peak_edges(1.0, open.view()), vec![2]);
        assert!(find_peaks(1.0, open.view()).is_empty());
    }

    #[test]
    fn test_positions_and_labels() {
        let e: Array1<f64> = array![-4.0, -3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0];
        let dos = array![0.0, 1.0, 2.0, 0.5, 0.0, 30.0, 12.0, 0.0];
        let idos = integrate_dos(dos.view(), e.view());
        let windows = find_peaks(0.9, dos.view());
        assert_eq!(windows, vec![PeakWindow::new(1, 2), PeakWindow::new(5, 6)]);

        let positions = peak_label_positions(dos.view(), idos.view(), &windows);
        assert_eq!(positions.len(), 2);
        assert!((positions[0].x() - 1.1).abs() < 1e-12);
        assert_eq!(positions[0].max_index(), 1);
        assert_eq!(positions[1].max_index(), 5);

        let names = vec!["3σ".to_string(), "4σ".to_string()];
        let labels = place_labels(e.view(), &windows, &positions, &names, 11.0);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].text(), "3σ");
        assert!((labels[0].energy() - (-3.0 + 0.5 - 0.5)).abs() < 1e-12);
        // 30.1 is clamped onto the limit
        assert_eq!(labels[1].x(), 11.0);

        let mut stacked = positions.clone();
        stack_on(&mut stacked, array![5.0, 5.0, 5.0, 5.0, 5.0, 1.0, 1.0, 1.0].view());
        assert!((stacked[0].x() - 6.1).abs() < 1e-12);
        assert!((stacked[1].x() - 31.1).abs() < 1e-12);
    }

    #[test]
    fn test_flat_window_is_skipped() {
        let e = array![-1.0, 0.0, 1.0];
        let dos = array![0.0, 5.0, 0.0];
        let idos = integrate_dos(dos.view(), e.view());
        // Single-sample peak: window (1, 1) carries no weight
        let windows = find_peaks(1.0, dos.view());
        assert_eq!(windows, vec![PeakWindow::new(1, 1)]);
        assert!(peak_label_positions(dos.view(), idos.view(), &windows).is_empty());
    }

    #[test]
    fn test_label_keeps_window_index() {
        let e = array![-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0];
        let dos = array![0.0, 5.0, 0.0, 0.0, 2.0, 3.0, 0.0];
        let idos = integrate_dos(dos.view(), e.view());
        let windows = find_peaks(1.0, dos.view());
        assert_eq!(windows, vec![PeakWindow::new(1, 1), PeakWindow::new(4, 5)]);
        let positions = peak_label_positions(dos.view(), idos.view(), &windows);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].window(), 1);

        // The skipped first window does not hand its name to the second
        let names = vec!["3σ".to_string(), "4σ".to_string()];
        let labels = place_labels(e.view(), &windows, &positions, &names, 11.0);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text(), "4σ");
    }
}
