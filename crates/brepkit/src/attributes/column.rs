//! Attribute columns: typed storage behind a type-erased interface.
//!
//! Storage comes in three flavors. `Constant` shares one value between all
//! rows, `Variable` is a dense vector, `Sparse` stores explicit entries
//! over a default. One concrete generic type, [`AttributeData`], covers the
//! three and is the only implementer of the erased [`Column`] trait; typed
//! access downcasts to it. Handles are reference-counted: a handle taken
//! from a manager stays valid across row edits and observes the compacted
//! data.

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use derive_where::derive_where;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::value::AttributeValue;
use crate::error::AttributeError;

/// Flags driving what bulk operations do with a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFlags {
    /// Copy the value when an element is copied from another one.
    pub assignable: bool,
    /// Recompute the value when an element is a combination of others.
    pub interpolable: bool,
    /// Keep the column when an element set is transferred to another model.
    pub transferable: bool,
}

impl Default for AttributeFlags {
    fn default() -> Self {
        Self {
            assignable: false,
            interpolable: false,
            transferable: true,
        }
    }
}

impl AttributeFlags {
    pub fn new(assignable: bool, interpolable: bool) -> Self {
        Self {
            assignable,
            interpolable,
            transferable: true,
        }
    }
}

#[derive(Clone, Debug)]
enum Storage<T: AttributeValue> {
    Constant(T),
    Variable(Vec<T>),
    Sparse(FxHashMap<u32, T>),
}

/// One typed column: storage variant, default value and flags.
#[derive(Clone, Debug)]
pub struct AttributeData<T: AttributeValue> {
    storage: Storage<T>,
    default: T,
    flags: AttributeFlags,
    nb_rows: u32,
}

impl<T: AttributeValue> AttributeData<T> {
    pub fn constant(value: T, flags: AttributeFlags, nb_rows: u32) -> Self {
        Self {
            storage: Storage::Constant(value.clone()),
            default: value,
            flags,
            nb_rows,
        }
    }

    pub fn variable(default: T, flags: AttributeFlags, nb_rows: u32) -> Self {
        Self {
            storage: Storage::Variable(vec![default.clone(); nb_rows as usize]),
            default,
            flags,
            nb_rows,
        }
    }

    pub fn sparse(default: T, flags: AttributeFlags, nb_rows: u32) -> Self {
        Self {
            storage: Storage::Sparse(FxHashMap::default()),
            default,
            flags,
            nb_rows,
        }
    }

    pub fn value(&self, row: u32) -> T {
        assert!(
            row < self.nb_rows,
            "row {row} out of range ({} rows)",
            self.nb_rows
        );
        match &self.storage {
            Storage::Constant(value) => value.clone(),
            Storage::Variable(values) => values[row as usize].clone(),
            Storage::Sparse(entries) => {
                entries.get(&row).cloned().unwrap_or_else(|| self.default.clone())
            }
        }
    }

    /// Writes are ignored by constant columns; use `set_default` there.
    pub fn set_value(&mut self, row: u32, value: T) {
        assert!(
            row < self.nb_rows,
            "row {row} out of range ({} rows)",
            self.nb_rows
        );
        match &mut self.storage {
            Storage::Constant(_) => {}
            Storage::Variable(values) => values[row as usize] = value,
            Storage::Sparse(entries) => {
                entries.insert(row, value);
            }
        }
    }

    pub fn default_value(&self) -> T {
        self.default.clone()
    }

    pub fn set_default(&mut self, value: T) {
        if let Storage::Constant(shared) = &mut self.storage {
            *shared = value.clone();
        }
        self.default = value;
    }
}

/// Type-erased column interface; every operation the manager fans out.
pub trait Column: Send + Sync + std::fmt::Debug {
    fn len(&self) -> u32;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn flags(&self) -> AttributeFlags;
    fn element_type_id(&self) -> TypeId;
    fn element_type_name(&self) -> &'static str;

    fn resize(&mut self, nb_rows: u32);
    fn reserve(&mut self, capacity: u32);
    /// `new[i] = old[permutation[i]]`; the caller validated the bijection.
    fn permute(&mut self, permutation: &[u32]);
    /// Keeps rows whose flag is `false`, preserving order.
    fn delete(&mut self, to_delete: &[bool]);
    /// Copies the value of `from` into `to` (assignable semantics).
    fn assign(&mut self, from: u32, to: u32);
    fn interpolate(&mut self, target: u32, sources: &[u32], weights: &[f64]);

    fn clone_column(&self) -> Box<dyn Column>;
    /// Same element type, default and flags, every row at the default.
    fn clone_structure(&self, nb_rows: u32) -> Box<dyn Column>;
    fn copy_values_from(
        &mut self,
        other: &dyn Column,
        nb_rows: u32,
    ) -> Result<(), AttributeError>;
    /// Writes `other[in]` into `self[out]` for every `(in, out)` pair.
    fn import_values_from(
        &mut self,
        other: &dyn Column,
        mapping: &[(u32, u32)],
    ) -> Result<(), AttributeError>;

    fn is_genericable(&self) -> bool;
    /// Floats per row of the generic projection (0 if not genericable).
    fn item_count(&self) -> usize;
    fn float_value(&self, row: u32, item: usize) -> f64;

    fn default_json(&self) -> serde_json::Value;
    fn rows_json(&self) -> serde_json::Value;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: AttributeValue> Column for AttributeData<T> {
    fn len(&self) -> u32 {
        self.nb_rows
    }

    fn flags(&self) -> AttributeFlags {
        self.flags
    }

    fn element_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn element_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn resize(&mut self, nb_rows: u32) {
        match &mut self.storage {
            Storage::Constant(_) => {}
            Storage::Variable(values) => {
                values.resize(nb_rows as usize, self.default.clone());
            }
            Storage::Sparse(entries) => {
                entries.retain(|&row, _| row < nb_rows);
            }
        }
        self.nb_rows = nb_rows;
    }

    fn reserve(&mut self, capacity: u32) {
        if let Storage::Variable(values) = &mut self.storage {
            values.reserve(capacity.saturating_sub(self.nb_rows) as usize);
        }
    }

    fn permute(&mut self, permutation: &[u32]) {
        match &mut self.storage {
            Storage::Constant(_) => {}
            Storage::Variable(values) => {
                let old = std::mem::take(values);
                *values = permutation
                    .iter()
                    .map(|&row| old[row as usize].clone())
                    .collect();
            }
            Storage::Sparse(entries) => {
                let mut inverse = vec![0u32; permutation.len()];
                for (new_row, &old_row) in permutation.iter().enumerate() {
                    inverse[old_row as usize] = new_row as u32;
                }
                let old = std::mem::take(entries);
                *entries = old
                    .into_iter()
                    .map(|(row, value)| (inverse[row as usize], value))
                    .collect();
            }
        }
    }

    fn delete(&mut self, to_delete: &[bool]) {
        let mut old_to_new = vec![crate::NO_ID; to_delete.len()];
        let mut kept = 0u32;
        for (row, &deleted) in to_delete.iter().enumerate() {
            if !deleted {
                old_to_new[row] = kept;
                kept += 1;
            }
        }
        match &mut self.storage {
            Storage::Constant(_) => {}
            Storage::Variable(values) => {
                let mut row = 0;
                values.retain(|_| {
                    let keep = !to_delete[row];
                    row += 1;
                    keep
                });
            }
            Storage::Sparse(entries) => {
                let old = std::mem::take(entries);
                *entries = old
                    .into_iter()
                    .filter_map(|(row, value)| {
                        let new_row = old_to_new[row as usize];
                        (new_row != crate::NO_ID).then_some((new_row, value))
                    })
                    .collect();
            }
        }
        self.nb_rows = kept;
    }

    fn assign(&mut self, from: u32, to: u32) {
        let value = self.value(from);
        self.set_value(to, value);
    }

    fn interpolate(&mut self, target: u32, sources: &[u32], weights: &[f64]) {
        let values: Vec<T> =
            sources.iter().map(|&row| self.value(row)).collect();
        let result = T::interpolate(&values, weights, &self.default);
        self.set_value(target, result);
    }

    fn clone_column(&self) -> Box<dyn Column> {
        Box::new(self.clone())
    }

    fn clone_structure(&self, nb_rows: u32) -> Box<dyn Column> {
        let mut clone = self.clone();
        match &mut clone.storage {
            Storage::Constant(_) => {}
            Storage::Variable(values) => {
                *values = vec![self.default.clone(); nb_rows as usize];
            }
            Storage::Sparse(entries) => entries.clear(),
        }
        clone.nb_rows = nb_rows;
        Box::new(clone)
    }

    fn copy_values_from(
        &mut self,
        other: &dyn Column,
        nb_rows: u32,
    ) -> Result<(), AttributeError> {
        let other = downcast::<T>(other)?;
        for row in 0..nb_rows.min(other.nb_rows) {
            self.set_value(row, other.value(row));
        }
        Ok(())
    }

    fn import_values_from(
        &mut self,
        other: &dyn Column,
        mapping: &[(u32, u32)],
    ) -> Result<(), AttributeError> {
        let other = downcast::<T>(other)?;
        for &(source, target) in mapping {
            if target >= self.nb_rows {
                return Err(AttributeError::MappingOutOfRange {
                    row: target,
                    size: self.nb_rows,
                });
            }
            self.set_value(target, other.value(source));
        }
        Ok(())
    }

    fn is_genericable(&self) -> bool {
        T::generic_item_count() > 0
    }

    fn item_count(&self) -> usize {
        T::generic_item_count()
    }

    fn float_value(&self, row: u32, item: usize) -> f64 {
        self.value(row).generic_item(item)
    }

    fn default_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.default).unwrap_or(serde_json::Value::Null)
    }

    fn rows_json(&self) -> serde_json::Value {
        let values: Vec<T> = (0..self.nb_rows).map(|row| self.value(row)).collect();
        serde_json::to_value(values).unwrap_or(serde_json::Value::Null)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn downcast<T: AttributeValue>(
    column: &dyn Column,
) -> Result<&AttributeData<T>, AttributeError> {
    column
        .as_any()
        .downcast_ref::<AttributeData<T>>()
        .ok_or_else(|| AttributeError::TypeMismatch {
            name: String::new(),
            existing: column.element_type_name(),
            requested: std::any::type_name::<T>(),
        })
}

pub(crate) type SharedColumn = Arc<RwLock<Box<dyn Column>>>;

/// Typed handle on a column owned by a manager.
///
/// The handle stays valid across manager edits: rows read through it track
/// the renumbering induced by deletions and permutations.
#[derive_where(Clone, Debug)]
pub struct Attribute<T: AttributeValue> {
    column: SharedColumn,
    _marker: PhantomData<fn() -> T>,
}

impl<T: AttributeValue> Attribute<T> {
    pub(crate) fn new(column: SharedColumn) -> Self {
        Self {
            column,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> u32 {
        self.column.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flags(&self) -> AttributeFlags {
        self.column.read().unwrap().flags()
    }

    /// Panics when `row` is out of range; see [`Attribute::try_value`].
    pub fn value(&self, row: u32) -> T {
        self.with_data(|data| data.value(row))
    }

    pub fn try_value(&self, row: u32) -> Result<T, AttributeError> {
        let guard = self.column.read().unwrap();
        let data = guard
            .as_any()
            .downcast_ref::<AttributeData<T>>()
            .expect("attribute handle type");
        if row >= data.nb_rows {
            return Err(AttributeError::IndexOutOfRange {
                row,
                nb_rows: data.nb_rows,
            });
        }
        Ok(data.value(row))
    }

    pub fn set_value(&self, row: u32, value: T) -> Result<(), AttributeError> {
        let mut guard = self.column.write().unwrap();
        let nb_rows = guard.len();
        if row >= nb_rows {
            return Err(AttributeError::IndexOutOfRange { row, nb_rows });
        }
        guard
            .as_any_mut()
            .downcast_mut::<AttributeData<T>>()
            .expect("attribute handle type")
            .set_value(row, value);
        Ok(())
    }

    pub fn default_value(&self) -> T {
        self.with_data(AttributeData::default_value)
    }

    pub fn set_default(&self, value: T) {
        self.column
            .write()
            .unwrap()
            .as_any_mut()
            .downcast_mut::<AttributeData<T>>()
            .expect("attribute handle type")
            .set_default(value);
    }

    fn with_data<R>(&self, reader: impl FnOnce(&AttributeData<T>) -> R) -> R {
        let guard = self.column.read().unwrap();
        reader(
            guard
                .as_any()
                .downcast_ref::<AttributeData<T>>()
                .expect("attribute handle type"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable() -> AttributeData<u32> {
        let mut data =
            AttributeData::variable(9, AttributeFlags::default(), 5);
        for row in 0..5 {
            data.set_value(row, row * 10);
        }
        data
    }

    #[test]
    fn constant_ignores_writes() {
        let mut data =
            AttributeData::constant(3.5f64, AttributeFlags::default(), 4);
        data.set_value(2, 7.0);
        assert_eq!(data.value(2), 3.5);
        data.set_default(1.0);
        assert_eq!(data.value(2), 1.0);
    }

    #[test]
    fn sparse_falls_back_to_default() {
        let mut data =
            AttributeData::sparse(-1i32, AttributeFlags::default(), 10);
        data.set_value(7, 42);
        assert_eq!(data.value(7), 42);
        assert_eq!(data.value(3), -1);
    }

    #[test]
    fn variable_resize_fills_default() {
        let mut data = variable();
        data.resize(8);
        assert_eq!(data.value(4), 40);
        assert_eq!(data.value(7), 9);
        data.resize(2);
        assert_eq!(Column::len(&data), 2);
    }

    #[test]
    fn delete_compacts_in_order() {
        let mut data = variable();
        Column::delete(&mut data, &[true, false, false, true, false]);
        assert_eq!(Column::len(&data), 3);
        assert_eq!(data.value(0), 10);
        assert_eq!(data.value(1), 20);
        assert_eq!(data.value(2), 40);
    }

    #[test]
    fn sparse_delete_remaps_keys() {
        let mut data =
            AttributeData::sparse(0u32, AttributeFlags::default(), 5);
        data.set_value(1, 11);
        data.set_value(4, 44);
        Column::delete(&mut data, &[true, false, true, false, false]);
        assert_eq!(Column::len(&data), 3);
        assert_eq!(data.value(0), 11);
        assert_eq!(data.value(2), 44);
    }

    #[test]
    fn permutation_roundtrip_is_identity() {
        let mut data = variable();
        let sigma = [4u32, 2, 0, 1, 3];
        let mut inverse = [0u32; 5];
        for (new_row, &old_row) in sigma.iter().enumerate() {
            inverse[old_row as usize] = new_row as u32;
        }
        Column::permute(&mut data, &sigma);
        assert_eq!(data.value(0), 40);
        assert_eq!(data.value(1), 20);
        Column::permute(&mut data, &inverse);
        for row in 0..5 {
            assert_eq!(data.value(row), row * 10);
        }
    }

    #[test]
    fn interpolation_goes_through_the_flags_agnostic_path() {
        let mut data =
            AttributeData::variable(0.0f64, AttributeFlags::new(false, true), 4);
        data.set_value(0, 2.0);
        data.set_value(1, 6.0);
        Column::interpolate(&mut data, 3, &[0, 1], &[0.5, 0.5]);
        assert_eq!(data.value(3), 4.0);
    }

    #[test]
    fn import_checks_bounds() {
        let mut target =
            AttributeData::variable(0u32, AttributeFlags::default(), 3);
        let source = variable();
        let error = Column::import_values_from(
            &mut target,
            &source,
            &[(0, 0), (4, 7)],
        )
        .unwrap_err();
        assert!(matches!(error, AttributeError::MappingOutOfRange { .. }));
        Column::import_values_from(&mut target, &source, &[(4, 0), (2, 2)])
            .unwrap();
        assert_eq!(target.value(0), 40);
        assert_eq!(target.value(2), 20);
    }

    #[test]
    fn generic_projection() {
        let data = variable();
        assert!(Column::is_genericable(&data));
        assert_eq!(Column::item_count(&data), 1);
        assert_eq!(Column::float_value(&data, 3, 0), 30.0);
        let text = AttributeData::variable(
            String::new(),
            AttributeFlags::default(),
            2,
        );
        assert!(!Column::is_genericable(&text));
        assert_eq!(Column::item_count(&text), 0);
    }
}
