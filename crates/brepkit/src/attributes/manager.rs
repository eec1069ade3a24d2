//! The per-element-set attribute manager.
//!
//! A manager owns a row count and a name -> column map in insertion order.
//! Every bulk operation (resize, delete, permute, interpolate, import) fans
//! out to every column so that user data never drifts out of lockstep with
//! the element set it is attached to.

use std::any::TypeId;
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use super::column::{
    Attribute, AttributeData, AttributeFlags, Column, SharedColumn,
};
use super::value::AttributeValue;
use crate::error::AttributeError;

#[derive(Debug, Default)]
pub struct AttributeManager {
    nb_rows: u32,
    names: Vec<String>,
    columns: Vec<SharedColumn>,
    index: FxHashMap<String, usize>,
}

impl Clone for AttributeManager {
    fn clone(&self) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                Arc::new(RwLock::new(column.read().unwrap().clone_column()))
            })
            .collect();
        Self {
            nb_rows: self.nb_rows,
            names: self.names.clone(),
            columns,
            index: self.index.clone(),
        }
    }
}

impl AttributeManager {
    pub fn new(nb_rows: u32) -> Self {
        Self {
            nb_rows,
            ..Self::default()
        }
    }

    pub fn nb_rows(&self) -> u32 {
        self.nb_rows
    }

    /// Column names, in insertion order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn attribute_exists(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Creates a variable column of `T` if absent; returns the existing one
    /// when its element type matches, fails otherwise.
    pub fn find_or_create_attribute<T: AttributeValue>(
        &mut self,
        name: &str,
        default: T,
    ) -> Result<Attribute<T>, AttributeError> {
        self.find_or_create_attribute_with_flags(
            name,
            default,
            AttributeFlags::default(),
        )
    }

    pub fn find_or_create_attribute_with_flags<T: AttributeValue>(
        &mut self,
        name: &str,
        default: T,
        flags: AttributeFlags,
    ) -> Result<Attribute<T>, AttributeError> {
        if let Some(&slot) = self.index.get(name) {
            return self.typed_handle(name, slot);
        }
        let data = AttributeData::variable(default, flags, self.nb_rows);
        Ok(self.insert_column(name, Box::new(data)))
    }

    /// Creates a constant column: one value shared by every row.
    pub fn find_or_create_constant_attribute<T: AttributeValue>(
        &mut self,
        name: &str,
        value: T,
        flags: AttributeFlags,
    ) -> Result<Attribute<T>, AttributeError> {
        if let Some(&slot) = self.index.get(name) {
            return self.typed_handle(name, slot);
        }
        let data = AttributeData::constant(value, flags, self.nb_rows);
        Ok(self.insert_column(name, Box::new(data)))
    }

    /// Creates a sparse column: explicit entries over a default.
    pub fn find_or_create_sparse_attribute<T: AttributeValue>(
        &mut self,
        name: &str,
        default: T,
        flags: AttributeFlags,
    ) -> Result<Attribute<T>, AttributeError> {
        if let Some(&slot) = self.index.get(name) {
            return self.typed_handle(name, slot);
        }
        let data = AttributeData::sparse(default, flags, self.nb_rows);
        Ok(self.insert_column(name, Box::new(data)))
    }

    /// Typed handle on an existing column; `None` when the name is absent
    /// or bound to another element type.
    pub fn find_attribute<T: AttributeValue>(
        &self,
        name: &str,
    ) -> Option<Attribute<T>> {
        let &slot = self.index.get(name)?;
        let column = &self.columns[slot];
        if column.read().unwrap().element_type_id() != TypeId::of::<T>() {
            return None;
        }
        Some(Attribute::new(Arc::clone(column)))
    }

    pub fn delete_attribute(&mut self, name: &str) {
        let Some(slot) = self.index.remove(name) else {
            return;
        };
        self.names.remove(slot);
        self.columns.remove(slot);
        for moved in self.index.values_mut() {
            if *moved > slot {
                *moved -= 1;
            }
        }
    }

    pub fn resize(&mut self, nb_rows: u32) {
        if nb_rows == self.nb_rows {
            return;
        }
        self.nb_rows = nb_rows;
        self.for_each_column(|column| column.resize(nb_rows));
    }

    /// Capacity hint, no semantic effect.
    pub fn reserve(&mut self, capacity: u32) {
        self.for_each_column(|column| column.reserve(capacity));
    }

    /// Compacts every column by the same keep-map. Row `k` of the result is
    /// row `pi(k)` of the original, `pi` enumerating the kept rows in
    /// ascending order.
    pub fn delete_rows(
        &mut self,
        to_delete: &[bool],
    ) -> Result<(), AttributeError> {
        if to_delete.len() != self.nb_rows as usize {
            return Err(AttributeError::IndexOutOfRange {
                row: to_delete.len() as u32,
                nb_rows: self.nb_rows,
            });
        }
        let kept =
            to_delete.iter().filter(|&&deleted| !deleted).count() as u32;
        self.for_each_column(|column| column.delete(to_delete));
        self.nb_rows = kept;
        Ok(())
    }

    /// Reorders every column: `new[i] = old[permutation[i]]`.
    pub fn permute_rows(
        &mut self,
        permutation: &[u32],
    ) -> Result<(), AttributeError> {
        self.check_permutation(permutation)?;
        self.for_each_column(|column| column.permute(permutation));
        Ok(())
    }

    /// Copies the value of row `from` into row `to` for every assignable
    /// column.
    pub fn assign_row(&mut self, from: u32, to: u32) -> Result<(), AttributeError> {
        self.check_row(from)?;
        self.check_row(to)?;
        self.for_each_column(|column| {
            if column.flags().assignable {
                column.assign(from, to);
            }
        });
        Ok(())
    }

    /// Writes the linear combination of `sources` by `weights` into
    /// `target` for every interpolable column.
    pub fn interpolate_into(
        &mut self,
        target: u32,
        sources: &[u32],
        weights: &[f64],
    ) -> Result<(), AttributeError> {
        self.check_row(target)?;
        for &source in sources {
            self.check_row(source)?;
        }
        if sources.len() != weights.len() {
            return Err(AttributeError::IndexOutOfRange {
                row: weights.len() as u32,
                nb_rows: sources.len() as u32,
            });
        }
        self.for_each_column(|column| {
            if column.flags().interpolable {
                column.interpolate(target, sources, weights);
            }
        });
        Ok(())
    }

    /// Deep-copies the row count and the assignable/transferable columns
    /// of `other` into this manager.
    pub fn copy_from(&mut self, other: &AttributeManager) {
        self.nb_rows = other.nb_rows;
        for (name, column) in other.names.iter().zip(&other.columns) {
            let guard = column.read().unwrap();
            let flags = guard.flags();
            if !flags.assignable && !flags.transferable {
                continue;
            }
            let clone = guard.clone_column();
            if let Some(&slot) = self.index.get(name) {
                *self.columns[slot].write().unwrap() = clone;
            } else {
                self.insert_raw(name, clone);
            }
        }
        self.for_each_column(|column| column.resize(other.nb_rows));
    }

    /// Imports rows of `other` through an `(in, out)` mapping, creating the
    /// missing transferable columns.
    pub fn import_from(
        &mut self,
        other: &AttributeManager,
        mapping: &[(u32, u32)],
    ) -> Result<(), AttributeError> {
        for (name, column) in other.names.iter().zip(&other.columns) {
            let guard = column.read().unwrap();
            if !guard.flags().transferable {
                continue;
            }
            let slot = match self.index.get(name) {
                Some(&slot) => slot,
                None => {
                    let structure = guard.clone_structure(self.nb_rows);
                    self.insert_raw(name, structure);
                    self.columns.len() - 1
                }
            };
            self.columns[slot]
                .write()
                .unwrap()
                .import_values_from(&**guard, mapping)?;
        }
        Ok(())
    }

    pub fn is_genericable(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&slot| self.columns[slot].read().unwrap().is_genericable())
    }

    pub fn item_count(&self, name: &str) -> usize {
        self.index
            .get(name)
            .map_or(0, |&slot| self.columns[slot].read().unwrap().item_count())
    }

    pub fn generic_value(&self, name: &str, row: u32, item: usize) -> f64 {
        self.index.get(name).map_or(0.0, |&slot| {
            self.columns[slot].read().unwrap().float_value(row, item)
        })
    }

    fn typed_handle<T: AttributeValue>(
        &self,
        name: &str,
        slot: usize,
    ) -> Result<Attribute<T>, AttributeError> {
        let column = &self.columns[slot];
        let guard = column.read().unwrap();
        if guard.element_type_id() != TypeId::of::<T>() {
            return Err(AttributeError::TypeMismatch {
                name: name.to_string(),
                existing: guard.element_type_name(),
                requested: std::any::type_name::<T>(),
            });
        }
        drop(guard);
        Ok(Attribute::new(Arc::clone(column)))
    }

    fn insert_column<T: AttributeValue>(
        &mut self,
        name: &str,
        column: Box<dyn Column>,
    ) -> Attribute<T> {
        self.insert_raw(name, column);
        Attribute::new(Arc::clone(self.columns.last().unwrap()))
    }

    fn insert_raw(&mut self, name: &str, column: Box<dyn Column>) {
        self.index.insert(name.to_string(), self.columns.len());
        self.names.push(name.to_string());
        self.columns.push(Arc::new(RwLock::new(column)));
    }

    fn for_each_column(&mut self, mut operation: impl FnMut(&mut dyn Column)) {
        for column in &self.columns {
            operation(column.write().unwrap().as_mut());
        }
    }

    fn check_row(&self, row: u32) -> Result<(), AttributeError> {
        if row >= self.nb_rows {
            return Err(AttributeError::IndexOutOfRange {
                row,
                nb_rows: self.nb_rows,
            });
        }
        Ok(())
    }

    fn check_permutation(
        &self,
        permutation: &[u32],
    ) -> Result<(), AttributeError> {
        if permutation.len() != self.nb_rows as usize {
            return Err(AttributeError::InvalidPermutation {
                len: permutation.len(),
                nb_rows: self.nb_rows,
            });
        }
        let mut seen = vec![false; permutation.len()];
        for &row in permutation {
            if row >= self.nb_rows || seen[row as usize] {
                return Err(AttributeError::InvalidPermutation {
                    len: permutation.len(),
                    nb_rows: self.nb_rows,
                });
            }
            seen[row as usize] = true;
        }
        Ok(())
    }

    pub(crate) fn columns_with_names(
        &self,
    ) -> impl Iterator<Item = (&str, &SharedColumn)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }
}
