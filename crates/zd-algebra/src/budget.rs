//! Triplet budgets and matrix selectors.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

/// Which of the three assembled matrices a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    /// Coefficients of the time derivative `ẏ`.
    E,
    /// Coefficients of the state `y`.
    F,
    /// `∂C/∂y`: tangent of the solution-dependent terms.
    D,
}

impl Term {
    pub fn label(self) -> &'static str {
        match self {
            Term::E => "E",
            Term::F => "F",
            Term::D => "D",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Upper bound on the number of distinct entries a block writes into each
/// matrix over all of its update phases.
///
/// Field order follows `F, E, D`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripletBudget {
    pub f: usize,
    pub e: usize,
    pub d: usize,
}

impl TripletBudget {
    pub const fn new(f: usize, e: usize, d: usize) -> Self {
        Self { f, e, d }
    }

    pub fn get(&self, term: Term) -> usize {
        match term {
            Term::E => self.e,
            Term::F => self.f,
            Term::D => self.d,
        }
    }

    pub fn total(&self) -> usize {
        self.f + self.e + self.d
    }

    /// True when every count in `self` is within `limit`.
    pub fn fits_within(&self, limit: &TripletBudget) -> bool {
        self.f <= limit.f && self.e <= limit.e && self.d <= limit.d
    }
}

impl Add for TripletBudget {
    type Output = TripletBudget;

    fn add(self, rhs: Self) -> Self::Output {
        TripletBudget {
            f: self.f + rhs.f,
            e: self.e + rhs.e,
            d: self.d + rhs.d,
        }
    }
}

impl Sum for TripletBudget {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TripletBudget::default(), Add::add)
    }
}

impl fmt::Display for TripletBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F={}, E={}, D={}", self.f, self.e, self.d)
    }
}
