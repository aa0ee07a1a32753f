use crate::error::{Error, Result};

/**
Column addressing of the COHPCAR matrix, derived once from the header.
Every declared interaction (the "Average" included) owns a
(projected, integrated) column pair per spin; spin-down pairs follow
all spin-up pairs.
# Field:
  * num_interactions: declared count, "Average" included
  * num_spins: 1 or 2
  * width: actual number of matrix columns
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    num_interactions: usize,
    num_spins: u8,
    width: usize,
}

impl ColumnLayout {
    pub fn new(num_interactions: usize, num_spins: u8, width: usize) -> Result<Self> {
        let layout = Self {
            num_interactions,
            num_spins,
            width,
        };
        let required = layout.required_width();
        if width < required {
            return Err(Error::ColumnOutOfRange {
                column: required - 1,
                width,
            });
        }
        Ok(layout)
    }

    /// Energy plus a column pair per interaction and spin.
    pub fn required_width(&self) -> usize {
        1 + 2 * self.num_interactions * self.num_spins as usize
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn num_spins(&self) -> u8 {
        self.num_spins
    }

    pub fn num_interactions(&self) -> usize {
        self.num_interactions
    }

    pub fn spins(&self) -> impl Iterator<Item = u8> {
        1..=self.num_spins
    }

    pub fn energy_column(&self) -> usize {
        0
    }

    pub fn average_cohp_column(&self, spin: u8) -> Result<usize> {
        self.checked(1 + self.spin_offset(spin)?)
    }

    pub fn average_icohp_column(&self, spin: u8) -> Result<usize> {
        self.checked(2 + self.spin_offset(spin)?)
    }

    /// Projected COHP of the interaction at 0-based `position` in the
    /// parsed list, i.e. ordinal `position + 1`.
    pub fn cohp_column(&self, position: usize, spin: u8) -> Result<usize> {
        self.pair_column(1, position, spin)
    }

    pub fn icohp_column(&self, position: usize, spin: u8) -> Result<usize> {
        self.pair_column(2, position, spin)
    }

    fn pair_column(&self, base: usize, position: usize, spin: u8) -> Result<usize> {
        let column = base + 2 * (position + 1) + self.spin_offset(spin)?;
        // Ordinal `position + 1` must be a declared interaction
        if position + 1 >= self.num_interactions {
            return Err(Error::ColumnOutOfRange {
                column,
                width: 1 + 2 * self.num_interactions,
            });
        }
        self.checked(column)
    }

    fn spin_offset(&self, spin: u8) -> Result<usize> {
        match spin {
            1 => Ok(0),
            2 if self.num_spins == 2 => Ok(2 * self.num_interactions),
            // First column of the missing spin block
            _ => Err(Error::ColumnOutOfRange {
                column: 1 + 2 * self.num_interactions * (spin.max(1) as usize - 1),
                width: self.required_width(),
            }),
        }
    }

    fn checked(&self, column: usize) -> Result<usize> {
        // Columns past the declared block belong to nothing, even if present
        if column < self.required_width() {
            Ok(column)
        } else {
            Err(Error::ColumnOutOfRange {
                column,
                width: self.required_width(),
            })
        }
    }
}

#[cfg(test)]
mod test {
    use crate::error::Error;

    use super::ColumnLayout;

    #[test]
    fn test_offsets() {
        let layout = ColumnLayout::new(3, 2, 13).unwrap();
        assert_eq!(layout.average_cohp_column(1).unwrap(), 1);
        assert_eq!(layout.cohp_column(0, 1).unwrap(), 3);
        assert_eq!(layout.icohp_column(0, 1).unwrap(), 4);
        assert_eq!(layout.cohp_column(1, 1).unwrap(), 5);
        assert_eq!(layout.cohp_column(0, 2).unwrap(), 9);
        assert_eq!(layout.icohp_column(1, 2).unwrap(), 12);
        assert!(layout.cohp_column(2, 1).is_err());
    }

    #[test]
    fn test_no_spin_down_when_unpolarized() {
        let layout = ColumnLayout::new(3, 1, 7).unwrap();
        assert_eq!(layout.spins().collect::<Vec<u8>>(), vec![1]);
        assert!(matches!(
            layout.cohp_column(0, 2),
            Err(Error::ColumnOutOfRange { .. })
        ));
        // Extra trailing columns are never addressed
        let wide = ColumnLayout::new(3, 1, 13).unwrap();
        assert!(wide.cohp_column(0, 2).is_err());
    }

    #[test]
    fn test_too_narrow() {
        assert!(ColumnLayout::new(3, 2, 7).is_err());
    }
}
