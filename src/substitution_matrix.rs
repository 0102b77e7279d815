use std::cmp::Reverse;
use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::record::{Base, CramRecord, ReadFeature};

/// Rank of a base in the bytewise-sorted alphabet `A,C,G,N,T`. Drives
/// tie-breaks and, for rows the data never touches, the default ordering.
const fn bytewise_rank(base: Base) -> usize {
    match base {
        Base::A => 0,
        Base::C => 1,
        Base::G => 2,
        Base::N => 3,
        Base::T => 4,
    }
}

/// The substitution matrix: per reference base, the other four bases ranked
/// by descending substitution frequency in the batch. A substitution code is
/// the rank of the read base in the row of its reference base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionMatrix {
    codes: [[u8; Base::COUNT]; Base::COUNT],
    bases: [[Base; 4]; Base::COUNT],
}

impl SubstitutionMatrix {
    /// Builds the matrix from the substitution features of a batch.
    ///
    /// # Examples
    /// ```
    /// use cramplan::record::{Base, CramRecord, ReadFeature, Substitution};
    /// use cramplan::substitution_matrix::SubstitutionMatrix;
    ///
    /// let records = vec![CramRecord::new(
    ///     vec![],
    ///     vec![ReadFeature::Substitution(Substitution::new(
    ///         7,
    ///         Base::C,
    ///         Base::A,
    ///     ))],
    /// )];
    /// let matrix = SubstitutionMatrix::from_records(&records);
    /// assert_eq!(matrix.code(Base::A, Base::C), 0);
    /// ```
    #[must_use]
    pub fn from_records(records: &[CramRecord]) -> Self {
        let mut frequencies = [[0u64; Base::COUNT]; Base::COUNT];

        for record in records {
            for feature in record.read_features() {
                if let ReadFeature::Substitution(substitution) = feature {
                    let reference = substitution.reference_base().index();
                    let read = substitution.base().index();
                    frequencies[reference][read] += 1;
                }
            }
        }

        Self::from_frequencies(&frequencies)
    }

    fn from_frequencies(frequencies: &[[u64; Base::COUNT]; Base::COUNT]) -> Self {
        let mut codes = [[0u8; Base::COUNT]; Base::COUNT];
        let mut bases = [[Base::A; 4]; Base::COUNT];

        for reference in Base::ALL {
            let row = &frequencies[reference.index()];
            let ranked = Base::ALL
                .iter()
                .copied()
                .filter(|&read| read != reference)
                .sorted_by_key(|&read| (Reverse(row[read.index()]), bytewise_rank(read)));

            for (code, read) in ranked.enumerate() {
                codes[reference.index()][read.index()] = code as u8;
                bases[reference.index()][code] = read;
            }
        }

        Self { codes, bases }
    }

    /// The code of a read base in the row of the given reference base.
    /// The self cell is never consulted: a substitution's read base differs
    /// from its reference base.
    #[inline]
    #[must_use]
    pub fn code(&self, reference: Base, read: Base) -> u8 {
        self.codes[reference.index()][read.index()]
    }

    /// The read base a code selects in the row of the given reference base.
    #[inline]
    #[must_use]
    pub fn base(&self, reference: Base, code: u8) -> Base {
        self.bases[reference.index()][code as usize]
    }
}

impl Default for SubstitutionMatrix {
    fn default() -> Self {
        Self::from_frequencies(&[[0; Base::COUNT]; Base::COUNT])
    }
}

impl Display for SubstitutionMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, reference) in Base::ALL.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}:", reference)?;
            for base in &self.bases[reference.index()] {
                write!(f, "{}", base)?;
            }
        }

        Ok(())
    }
}
