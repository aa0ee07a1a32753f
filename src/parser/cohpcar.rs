use std::{fmt, path::Path};

use log::{debug, info, warn};
use ndarray::Array2;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while_m_n},
    character::complete::{anychar, char, one_of},
    combinator::{map, opt, recognize},
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::error::{Error, Format, Result};

use super::general::{decimal, float_row, parse_float_row, read_text};

/// An atom named in an interaction label, e.g. `Rh12`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomSite {
    element: String,
    /// 1-based index in the source structure
    index: u32,
}

impl AtomSite {
    pub fn new(element: &str, index: u32) -> Self {
        Self {
            element: element.to_string(),
            index,
        }
    }

    pub fn element(&self) -> &str {
        self.element.as_ref()
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionKind {
    /// Whole bond, e.g. `No.1:O2->C1`
    Total,
    /// Orbital-resolved sub-interaction, e.g. `No.2:O2[2s]->C1[2p_z]`
    Orbitalwise { orbital1: String, orbital2: String },
}

/// One declared line of the interaction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    id: u32,
    kind: InteractionKind,
    first: AtomSite,
    second: AtomSite,
}

impl Interaction {
    pub fn new(id: u32, kind: InteractionKind, first: AtomSite, second: AtomSite) -> Self {
        Self {
            id,
            kind,
            first,
            second,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> &InteractionKind {
        &self.kind
    }

    pub fn first(&self) -> &AtomSite {
        &self.first
    }

    pub fn second(&self) -> &AtomSite {
        &self.second
    }

    pub fn is_orbitalwise(&self) -> bool {
        matches!(self.kind, InteractionKind::Orbitalwise { .. })
    }

    pub fn orbitals(&self) -> Option<(&str, &str)> {
        match &self.kind {
            InteractionKind::Orbitalwise { orbital1, orbital2 } => {
                Some((orbital1.as_str(), orbital2.as_str()))
            }
            InteractionKind::Total => None,
        }
    }

    /// Whether the interaction runs from atom `at1` to atom `at2`, in that order.
    pub fn connects(&self, at1: u32, at2: u32) -> bool {
        self.first.index == at1 && self.second.index == at2
    }

    pub fn parse(line: &str) -> IResult<&str, Self> {
        alt((orbitalwise_line, total_line))(line)
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = (&self.first, &self.second);
        match &self.kind {
            InteractionKind::Total => {
                write!(f, "{}{}->{}{}", a.element, a.index, b.element, b.index)
            }
            InteractionKind::Orbitalwise { orbital1, orbital2 } => write!(
                f,
                "{}{}[{}]->{}{}[{}]",
                a.element, a.index, orbital1, b.element, b.index, orbital2
            ),
        }
    }
}

fn line_id(input: &str) -> IResult<&str, u32> {
    // "No" followed by any separator character, usually '.'
    delimited(tuple((tag("No"), anychar)), decimal, char(':'))(input)
}

fn element(input: &str) -> IResult<&str, &str> {
    take_while_m_n(1, 2, |c: char| c.is_ascii_alphabetic())(input)
}

fn site(input: &str) -> IResult<&str, AtomSite> {
    map(tuple((element, decimal)), |(elm, idx)| AtomSite::new(elm, idx))(input)
}

/// Bracketed orbital label such as `[2s]`, `[2p_z]` or `[3d_x^2-y^2]`.
fn orbital(input: &str) -> IResult<&str, &str> {
    delimited(
        char('['),
        recognize(tuple((
            one_of("0123456789"),
            one_of("spdf"),
            opt(char('_')),
            take_while(|c: char| c.is_ascii_lowercase() || matches!(c, '^' | '2' | '-')),
        ))),
        char(']'),
    )(input)
}

fn orbitalwise_line(input: &str) -> IResult<&str, Interaction> {
    let (i, id) = line_id(input)?;
    let (i, (first, orbital1)) = tuple((site, orbital))(i)?;
    let (i, (second, orbital2)) = preceded(tag("->"), tuple((site, orbital)))(i)?;
    let kind = InteractionKind::Orbitalwise {
        orbital1: orbital1.to_string(),
        orbital2: orbital2.to_string(),
    };
    Ok((i, Interaction::new(id, kind, first, second)))
}

fn total_line(input: &str) -> IResult<&str, Interaction> {
    let (i, id) = line_id(input)?;
    let (i, first) = site(i)?;
    let (i, second) = preceded(tag("->"), site)(i)?;
    Ok((i, Interaction::new(id, InteractionKind::Total, first, second)))
}

/// Metadata on the second line of a COHPCAR.
#[derive(Debug, Clone, PartialEq)]
pub struct CohpHeader {
    /// Declared count; includes the leading "Average" pseudo-interaction.
    num_interactions: usize,
    num_spins: u8,
    num_points: usize,
    e_min: f64,
    e_max: f64,
    e_fermi: f64,
}

impl CohpHeader {
    pub fn new(
        num_interactions: usize,
        num_spins: u8,
        num_points: usize,
        e_min: f64,
        e_max: f64,
        e_fermi: f64,
    ) -> Self {
        Self {
            num_interactions,
            num_spins,
            num_points,
            e_min,
            e_max,
            e_fermi,
        }
    }

    /// `count  spin  npoints  emin  emax  efermi`
    fn parse(line: &str) -> Result<Self> {
        let (_, tokens) = float_row(line)
            .map_err(|e| Error::parse(Format::Cohpcar, 2, format!("bad metadata line: {e}")))?;
        if tokens.len() < 6 {
            return Err(Error::parse(
                Format::Cohpcar,
                2,
                format!("expected 6 metadata values, found {}", tokens.len()),
            ));
        }
        // Line numbers run up to count + 3
        let count = as_count(tokens[0])
            .filter(|c| *c >= 1 && c.checked_add(3).is_some())
            .ok_or_else(|| {
                Error::parse(
                    Format::Cohpcar,
                    2,
                    format!("bad interaction count {}", tokens[0]),
                )
            })?;
        let num_spins = match as_count(tokens[1]) {
            Some(1) => 1,
            Some(2) => 2,
            _ => {
                return Err(Error::parse(
                    Format::Cohpcar,
                    2,
                    format!("spin flag must be 1 or 2, found {}", tokens[1]),
                ))
            }
        };
        let num_points = as_count(tokens[2])
            .ok_or_else(|| Error::parse(Format::Cohpcar, 2, "bad number of energy points"))?;
        Ok(Self::new(
            count, num_spins, num_points, tokens[3], tokens[4], tokens[5],
        ))
    }

    pub fn num_interactions(&self) -> usize {
        self.num_interactions
    }

    pub fn num_spins(&self) -> u8 {
        self.num_spins
    }

    pub fn is_spin_polarized(&self) -> bool {
        self.num_spins == 2
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn e_min(&self) -> f64 {
        self.e_min
    }

    pub fn e_max(&self) -> f64 {
        self.e_max
    }

    pub fn e_fermi(&self) -> f64 {
        self.e_fermi
    }
}

fn as_count(value: f64) -> Option<usize> {
    (value >= 0.0 && value.fract() == 0.0).then_some(value as usize)
}

/**
Parsed `COHPCAR.lobster`.
Layout:
 line 1: free text
 line 2: metadata, see `CohpHeader`
 line 3: "Average"
 `count - 1` interaction declarations
 energy rows:
 col0    col1           col2           col3           col4          ... col(2*nints+1)  ...
 energy  pcohp_avg_up   icohp_avg_up   pcohp_int1_up  icohp_int1_up ... pcohp_avg_down  ...
*/
#[derive(Debug, Clone)]
pub struct Cohpcar {
    header: CohpHeader,
    interactions: Vec<Interaction>,
    /// dimension = (num_points, columns)
    data: Array2<f64>,
}

impl Cohpcar {
    pub fn new(header: CohpHeader, interactions: Vec<Interaction>, data: Array2<f64>) -> Self {
        Self {
            header,
            interactions,
            data,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = read_text(&path)?;
        debug!("Read {}", path.as_ref().display());
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let _ = lines.next(); // Skip first line
        let header = lines
            .next()
            .ok_or_else(|| Error::parse(Format::Cohpcar, 2, "missing metadata line"))
            .and_then(CohpHeader::parse)?;
        let _ = lines.next(); // Skip "Average"

        info!("Exploring {} interactions", header.num_interactions());

        // The declared count covers the "Average" line already skipped.
        let mut interactions = Vec::new();
        for line_no in 4..header.num_interactions() + 3 {
            let line = lines.next().ok_or_else(|| {
                Error::parse(Format::Cohpcar, line_no, "interaction list ended early")
            })?;
            let (_, interaction) =
                Interaction::parse(line).map_err(|_| Error::MalformedInteraction {
                    line: line.trim_end().to_string(),
                })?;
            interactions.push(interaction);
        }

        let first_data_line = header.num_interactions() + 3;
        let mut width = None;
        let mut rows = 0_usize;
        let mut flat: Vec<f64> = Vec::new();
        for (offset, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = first_data_line + offset;
            let row = parse_float_row(line, Format::Cohpcar, line_no)?;
            let expected = *width.get_or_insert(row.len());
            if row.len() != expected {
                return Err(Error::RaggedRow {
                    row: line_no,
                    found: row.len(),
                    expected,
                });
            }
            flat.extend(row);
            rows += 1;
        }
        let width = width
            .ok_or_else(|| Error::parse(Format::Cohpcar, first_data_line, "no data rows"))?;
        if rows != header.num_points() {
            warn!(
                "Header declares {} energy points but {} rows were read",
                header.num_points(),
                rows
            );
        }
        let data = Array2::from_shape_vec((rows, width), flat)
            .map_err(|e| Error::parse(Format::Cohpcar, first_data_line, e.to_string()))?;
        Ok(Self::new(header, interactions, data))
    }

    pub fn header(&self) -> &CohpHeader {
        &self.header
    }

    pub fn interactions(&self) -> &[Interaction] {
        self.interactions.as_ref()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }
}
