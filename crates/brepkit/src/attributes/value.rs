//! Element types storable in attribute columns.
//!
//! The trait's provided methods encode the two generic behaviors of the
//! attribute system: linear interpolation (used when a new element is built
//! as a combination of existing ones) and the generic float projection
//! (used by exporters and inspection tools that only understand floats).
//! Types that are neither arithmetic nor float-projectable keep the
//! defaults: interpolation falls back to the column default and the
//! projection reports zero items.

use serde::{Serialize, de::DeserializeOwned};

use crate::geometry::{Point, Vector};

pub trait AttributeValue:
    Clone
    + PartialEq
    + std::fmt::Debug
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
    + 'static
{
    /// Linear combination of `values` by `weights`.
    ///
    /// Whatever the weights, if every source value is bit-equal to the
    /// first one, that value is returned verbatim; exact labels survive a
    /// no-op interpolation this way. Non-arithmetic types return the
    /// column default otherwise.
    fn interpolate(values: &[Self], weights: &[f64], default: &Self) -> Self {
        let _ = weights;
        if let Some(first) = values.first()
            && values.iter().all(|value| value == first)
        {
            return first.clone();
        }
        default.clone()
    }

    /// Number of floats a value projects to; 0 means not genericable.
    fn generic_item_count() -> usize {
        0
    }

    /// The `item`-th float of the projection.
    fn generic_item(&self, _item: usize) -> f64 {
        0.0
    }
}

/// Scalars that project to a float and combine linearly.
pub trait GenericNumber:
    Copy
    + PartialEq
    + std::fmt::Debug
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
    + 'static
{
    fn to_generic(self) -> f64;
    fn from_generic(value: f64) -> Self;
}

macro_rules! generic_number {
    ($($t:ty),* $(,)?) => { $(
        impl GenericNumber for $t {
            fn to_generic(self) -> f64 {
                self as f64
            }
            fn from_generic(value: f64) -> Self {
                value as $t
            }
        }

        impl AttributeValue for $t {
            fn interpolate(
                values: &[Self],
                weights: &[f64],
                default: &Self,
            ) -> Self {
                let Some(&first) = values.first() else {
                    return *default;
                };
                if values.iter().all(|value| *value == first) {
                    return first;
                }
                let mut sum = 0.0;
                for (value, weight) in values.iter().zip(weights) {
                    sum += value.to_generic() * weight;
                }
                Self::from_generic(sum)
            }

            fn generic_item_count() -> usize {
                1
            }

            fn generic_item(&self, _item: usize) -> f64 {
                self.to_generic()
            }
        }
    )* };
}

generic_number!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

// Not arithmetic, but still worth a float projection.
impl AttributeValue for bool {
    fn generic_item_count() -> usize {
        1
    }

    fn generic_item(&self, _item: usize) -> f64 {
        f64::from(*self)
    }
}

impl AttributeValue for String {}

impl<T: GenericNumber, const N: usize> AttributeValue for [T; N]
where
    [T; N]: Serialize + DeserializeOwned,
{
    fn interpolate(values: &[Self], weights: &[f64], default: &Self) -> Self {
        let Some(first) = values.first() else {
            return *default;
        };
        if values.iter().all(|value| value == first) {
            return *first;
        }
        let mut sums = [0.0f64; N];
        for (value, weight) in values.iter().zip(weights) {
            for (sum, item) in sums.iter_mut().zip(value) {
                *sum += item.to_generic() * weight;
            }
        }
        std::array::from_fn(|i| T::from_generic(sums[i]))
    }

    fn generic_item_count() -> usize {
        N
    }

    fn generic_item(&self, item: usize) -> f64 {
        self[item].to_generic()
    }
}

impl<const D: usize> AttributeValue for Point<D> {
    fn interpolate(values: &[Self], weights: &[f64], default: &Self) -> Self {
        let Some(first) = values.first() else {
            return *default;
        };
        if values.iter().all(|value| value == first) {
            return *first;
        }
        let mut sum = Vector::<D>::zeros();
        for (value, weight) in values.iter().zip(weights) {
            sum += value.coords * *weight;
        }
        Self::from(sum)
    }

    fn generic_item_count() -> usize {
        D
    }

    fn generic_item(&self, item: usize) -> f64 {
        self[item]
    }
}

impl<const D: usize> AttributeValue for Vector<D> {
    fn interpolate(values: &[Self], weights: &[f64], default: &Self) -> Self {
        let Some(first) = values.first() else {
            return *default;
        };
        if values.iter().all(|value| value == first) {
            return *first;
        }
        let mut sum = Self::zeros();
        for (value, weight) in values.iter().zip(weights) {
            sum += value * *weight;
        }
        sum
    }

    fn generic_item_count() -> usize {
        D
    }

    fn generic_item(&self, item: usize) -> f64 {
        self[item]
    }
}
