use error_chain::bail;
use itertools::Itertools;
use serde_derive::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::errors::*;

pub type LocationValues = SmallVec<[i64; 2]>;

/// An integer position with a dimensionality fixed when it is created.
///
/// Equality and hashing agree with the canonical `[v0,v1,...]` encoding, so a `Location` and
/// its `encode()`d string are interchangeable as keys.
#[derive(Hash, Eq, PartialEq, Clone, Debug, Ord, PartialOrd)]
pub struct Location {
    values: LocationValues,
}

/// Field-for-field snapshot of a location for persistence layers.
#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct LocationState {
    pub dimensionality: usize,
    pub values: LocationValues,
}

impl Location {
    pub fn new<V: Into<LocationValues>>(values: V) -> Location {
        Location { values: values.into() }
    }

    /// All zero location with `dimensionality` axes.
    pub fn origin(dimensionality: usize) -> Location {
        Location { values: SmallVec::from_elem(0, dimensionality) }
    }

    #[inline]
    pub fn dimensionality(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn get(&self, axis: usize) -> Result<i64> {
        self.values
            .get(axis)
            .cloned()
            .ok_or_else(|| ErrorKind::AxisOutOfRange(axis, self.dimensionality()).into())
    }

    pub fn set(&mut self, axis: usize, value: i64) -> Result<()> {
        let dimensionality = self.dimensionality();
        match self.values.get_mut(axis) {
            Some(v) => {
                *v = value;
                Ok(())
            }
            None => bail!(ErrorKind::AxisOutOfRange(axis, dimensionality)),
        }
    }

    pub fn adjust(&mut self, axis: usize, delta: i64) -> Result<()> {
        let current = self.get(axis)?;
        self.set(axis, current + delta)
    }

    /// Shift every axis at once. `offsets` must have exactly one entry per axis.
    pub fn translate(&mut self, offsets: &[i64]) -> Result<()> {
        if offsets.len() != self.dimensionality() {
            bail!(ErrorKind::DimensionMismatch(self.dimensionality(), offsets.len()));
        }
        for (v, offset) in self.values.iter_mut().zip(offsets) {
            *v += *offset;
        }
        Ok(())
    }

    /// The canonical string form, e.g. `[3,-1]`.
    pub fn encode(&self) -> String {
        format!("[{}]", self.values.iter().join(","))
    }

    pub fn state(&self) -> LocationState {
        LocationState {
            dimensionality: self.dimensionality(),
            values: self.values.clone(),
        }
    }
}

impl From<LocationState> for Location {
    fn from(state: LocationState) -> Location {
        Location::new(state.values)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn origin_has_requested_dimensionality() {
        let l = Location::origin(3);
        assert_eq!(l.dimensionality(), 3);
        assert_eq!(l.values(), &[0, 0, 0]);
    }

    #[test]
    fn axis_access() {
        let mut l = Location::new(vec![4, -2]);
        assert_eq!(l.get(0).unwrap(), 4);
        assert_eq!(l.get(1).unwrap(), -2);
        l.set(0, 10).unwrap();
        l.adjust(1, -3).unwrap();
        assert_eq!(l.values(), &[10, -5]);
        assert_eq!(l.dimensionality(), 2);
    }

    #[test]
    fn axis_out_of_range() {
        let mut l = Location::origin(2);
        match l.get(2) {
            Err(Error(ErrorKind::AxisOutOfRange(2, 2), _)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(l.set(5, 1).is_err());
        assert!(l.adjust(2, 1).is_err());
        assert_eq!(l, Location::origin(2));
    }

    #[test]
    fn translate_checks_dimensions() {
        let mut l = Location::new(vec![1, 1]);
        l.translate(&[2, 3]).unwrap();
        assert_eq!(l.values(), &[3, 4]);
        assert!(l.translate(&[1]).is_err());
        assert_eq!(l.values(), &[3, 4]);
    }

    #[test]
    fn canonical_encoding() {
        assert_eq!(Location::new(vec![0, -1]).encode(), "[0,-1]");
        assert_eq!(Location::new(vec![12, 3, 4]).to_string(), "[12,3,4]");
        assert_eq!(Location::origin(0).encode(), "[]");

        let mut moved = Location::origin(2);
        moved.adjust(0, 5).unwrap();
        moved.adjust(0, -5).unwrap();
        assert_eq!(moved.encode(), Location::origin(2).encode());
        assert_eq!(moved, Location::origin(2));
    }

    #[test]
    fn state_snapshot() {
        let l = Location::new(vec![7, 8]);
        let state = l.state();
        assert_eq!(state.dimensionality, 2);
        assert_eq!(&*state.values, &[7, 8]);
        assert_eq!(Location::from(state), l);
    }
}
