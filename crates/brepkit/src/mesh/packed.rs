//! Packed variable-arity rows, the storage of polygon and polyhedron
//! vertex lists.
//!
//! Classic CSR layout: one flat value array plus an offset array with one
//! entry per row plus one. Rows are indexed contiguously; deletion and
//! permutation compact or reorder whole rows at once, in the same pass the
//! attribute managers apply to their columns.

use serde::{Deserialize, Serialize};

use crate::NO_ID;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedRows {
    values: Vec<u32>,
    offsets: Vec<u32>,
}

impl PackedRows {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            offsets: vec![0],
        }
    }

    pub fn len(&self) -> u32 {
        (self.offsets.len() - 1) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.len() == 1
    }

    pub fn nb_values(&self) -> u32 {
        self.values.len() as u32
    }

    pub fn row(&self, row: u32) -> &[u32] {
        let start = self.offsets[row as usize] as usize;
        let stop = self.offsets[row as usize + 1] as usize;
        &self.values[start..stop]
    }

    pub fn row_mut(&mut self, row: u32) -> &mut [u32] {
        let start = self.offsets[row as usize] as usize;
        let stop = self.offsets[row as usize + 1] as usize;
        &mut self.values[start..stop]
    }

    pub fn row_len(&self, row: u32) -> u32 {
        self.offsets[row as usize + 1] - self.offsets[row as usize]
    }

    pub fn push_row(&mut self, values: &[u32]) -> u32 {
        self.values.extend_from_slice(values);
        self.offsets.push(self.values.len() as u32);
        self.len() - 1
    }

    pub fn push_row_filled(&mut self, len: u32, value: u32) -> u32 {
        self.values.extend(std::iter::repeat_n(value, len as usize));
        self.offsets.push(self.values.len() as u32);
        self.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u32]> {
        (0..self.len()).map(|row| self.row(row))
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [u32] {
        &mut self.values
    }

    /// Removes the rows whose flag is `true`, preserving order.
    pub fn delete_rows(&mut self, to_delete: &[bool]) {
        debug_assert_eq!(to_delete.len(), self.len() as usize);
        let mut values = Vec::with_capacity(self.values.len());
        let mut offsets = Vec::with_capacity(self.offsets.len());
        offsets.push(0);
        for (row, &deleted) in to_delete.iter().enumerate() {
            if deleted {
                continue;
            }
            values.extend_from_slice(self.row(row as u32));
            offsets.push(values.len() as u32);
        }
        self.values = values;
        self.offsets = offsets;
    }

    /// Reorders rows: `new[i] = old[permutation[i]]`.
    pub fn permute_rows(&mut self, permutation: &[u32]) {
        debug_assert_eq!(permutation.len(), self.len() as usize);
        let mut values = Vec::with_capacity(self.values.len());
        let mut offsets = Vec::with_capacity(self.offsets.len());
        offsets.push(0);
        for &old_row in permutation {
            values.extend_from_slice(self.row(old_row));
            offsets.push(values.len() as u32);
        }
        self.values = values;
        self.offsets = offsets;
    }

    /// Rewrites every value through `old_to_new`; values mapped to `NO_ID`
    /// are left in place for the caller to handle.
    pub fn remap_values(&mut self, old_to_new: &[u32]) {
        for value in &mut self.values {
            if *value != NO_ID {
                *value = old_to_new[*value as usize];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PackedRows {
        let mut rows = PackedRows::new();
        rows.push_row(&[0, 1, 2]);
        rows.push_row(&[1, 3, 4, 2]);
        rows.push_row(&[1, 5, 6, 3]);
        rows
    }

    #[test]
    fn rows_round_trip() {
        let rows = sample();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.row(1), &[1, 3, 4, 2]);
        assert_eq!(rows.row_len(2), 4);
        assert_eq!(rows.nb_values(), 11);
    }

    #[test]
    fn deletion_compacts() {
        let mut rows = sample();
        rows.delete_rows(&[true, false, false]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.row(0), &[1, 3, 4, 2]);
        assert_eq!(rows.row(1), &[1, 5, 6, 3]);
    }

    #[test]
    fn permutation_reorders() {
        let mut rows = sample();
        rows.permute_rows(&[2, 0, 1]);
        assert_eq!(rows.row(0), &[1, 5, 6, 3]);
        assert_eq!(rows.row(1), &[0, 1, 2]);
    }
}
