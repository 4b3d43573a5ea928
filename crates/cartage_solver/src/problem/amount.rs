use std::ops::{Add, AddAssign, Index, IndexMut, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Fixed-dimension load vector (weight, volume, pieces, ...). All components
/// are exact integers; the dimension is set once per problem by the first
/// vehicle's capacity and shared by every amount in it.
type Vector = SmallVec<[i64; 2]>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Amount(Vector);

impl Amount {
    pub const EMPTY: Amount = Amount(Vector::new_const());

    pub fn zeros(dimensions: usize) -> Self {
        let mut vec = SmallVec::with_capacity(dimensions);
        vec.resize(dimensions, 0);
        Amount(vec)
    }

    pub fn from_vec(vec: Vec<i64>) -> Self {
        Amount(SmallVec::from_vec(vec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }

    #[inline]
    pub fn get(&self, index: usize) -> i64 {
        self.0.get(index).copied().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        for v in self.0.iter_mut() {
            *v = 0;
        }
    }

    pub fn update(&mut self, other: &Amount) {
        self.0.clone_from(&other.0);
    }

    pub fn update_max(&mut self, other: &Amount) {
        let max_len = self.len().max(other.len());
        self.0.resize(max_len, 0);
        for i in 0..max_len {
            self.0[i] = self.0[i].max(other.get(i));
        }
    }

    /// Component-wise `self <= other`, the capacity test. Shorter vectors are
    /// padded with zeros, so a zero-dimension amount fits anywhere.
    pub fn fits_in(&self, other: &Amount) -> bool {
        (0..self.len().max(other.len())).all(|i| self.get(i) <= other.get(i))
    }

    /// Lexicographic total order used for deterministic tie-breaking in the
    /// heuristics (larger total demand first).
    pub fn lex_cmp(&self, other: &Amount) -> std::cmp::Ordering {
        let len = self.len().max(other.len());
        for i in 0..len {
            match self.get(i).cmp(&other.get(i)) {
                std::cmp::Ordering::Equal => continue,
                ord => return ord,
            }
        }
        std::cmp::Ordering::Equal
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Index<usize> for Amount {
    type Output = i64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for Amount {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        if index >= self.0.len() {
            self.0.resize(index + 1, 0);
        }
        &mut self.0[index]
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), 0);
        }
        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a += b;
        }
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), 0);
        }
        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a -= b;
        }
    }
}

impl Add<&Amount> for &Amount {
    type Output = Amount;

    fn add(self, rhs: &Amount) -> Amount {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl Sub<&Amount> for &Amount {
    type Output = Amount;

    fn sub(self, rhs: &Amount) -> Amount {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assign_resizes() {
        let mut a = Amount::from_vec(vec![10, 20]);
        let b = Amount::from_vec(vec![5, 15, 25]);

        a += &b;

        assert_eq!(a.get(0), 15);
        assert_eq!(a.get(1), 35);
        assert_eq!(a.get(2), 25);
    }

    #[test]
    fn test_sub_assign() {
        let mut a = Amount::from_vec(vec![10, 20, 30]);
        let b = Amount::from_vec(vec![5, 15]);

        a -= &b;

        assert_eq!(a, Amount::from_vec(vec![5, 5, 30]));
    }

    #[test]
    fn test_fits_in() {
        let capacity = Amount::from_vec(vec![10, 10]);
        assert!(Amount::from_vec(vec![10, 10]).fits_in(&capacity));
        assert!(Amount::from_vec(vec![0, 10]).fits_in(&capacity));
        assert!(!Amount::from_vec(vec![11, 0]).fits_in(&capacity));
        assert!(Amount::EMPTY.fits_in(&capacity));
        // Zero-capacity vehicle still accepts zero amounts.
        assert!(Amount::from_vec(vec![0]).fits_in(&Amount::zeros(1)));
        assert!(!Amount::from_vec(vec![1]).fits_in(&Amount::zeros(1)));
    }

    #[test]
    fn test_update_max() {
        let mut a = Amount::from_vec(vec![1, 5]);
        a.update_max(&Amount::from_vec(vec![3, 2, 4]));
        assert_eq!(a, Amount::from_vec(vec![3, 5, 4]));
    }

    #[test]
    fn test_lex_cmp() {
        use std::cmp::Ordering;
        let a = Amount::from_vec(vec![2, 1]);
        let b = Amount::from_vec(vec![2, 3]);
        assert_eq!(a.lex_cmp(&b), Ordering::Less);
        assert_eq!(b.lex_cmp(&a), Ordering::Greater);
        assert_eq!(a.lex_cmp(&a.clone()), Ordering::Equal);
    }
}
