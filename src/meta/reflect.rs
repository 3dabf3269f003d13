//! `Reflect` impls for built-in value and container types.

use std::any::Any;
use std::collections::BTreeSet;

use super::{Reflect, TypeRef};
use crate::Result;
use crate::meta::AnyValue;
use crate::model::Iri;

macro_rules! reflect_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_ref() -> TypeRef {
                    TypeRef::scalar::<$ty>()
                }
            }
        )+
    };
}

reflect_scalar!(
    bool, char, String, Iri,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
);

impl<T: Reflect> Reflect for Option<T> {
    fn type_ref() -> TypeRef {
        TypeRef::optional::<T>()
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_ref() -> TypeRef {
        TypeRef::sequence::<T>()
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    fn type_ref() -> TypeRef {
        TypeRef::set::<T>()
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_ref() -> TypeRef {
        TypeRef::array::<T, N>()
    }
}

/// Boxes are transparent: they adopt and expose the inner value.
impl<T: Reflect> Reflect for Box<T> {
    fn type_ref() -> TypeRef {
        TypeRef::boxed::<T>()
    }

    fn adopt(value: AnyValue) -> Result<Self> {
        T::adopt(value).map(Box::new)
    }

    fn intrinsic(&self) -> &dyn Any {
        (**self).intrinsic()
    }
}

#[cfg(feature = "chrono")]
mod temporal {
    use std::any::Any;

    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

    use super::{Reflect, TypeRef};

    impl Reflect for NaiveDate {
        fn type_ref() -> TypeRef {
            TypeRef::scalar::<NaiveDate>()
        }
    }

    impl Reflect for NaiveDateTime {
        fn type_ref() -> TypeRef {
            TypeRef::scalar_with::<NaiveDateTime>(naive_date_time_lexical)
        }
    }

    impl Reflect for DateTime<Utc> {
        fn type_ref() -> TypeRef {
            TypeRef::scalar_with::<DateTime<Utc>>(date_time_lexical)
        }
    }

    fn naive_date_time_lexical(value: &dyn Any) -> Option<String> {
        value
            .downcast_ref::<NaiveDateTime>()
            .map(|v| v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    }

    fn date_time_lexical(value: &dyn Any) -> Option<String> {
        value
            .downcast_ref::<DateTime<Utc>>()
            .map(|v| v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}
