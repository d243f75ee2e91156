//! `Wire` implementations for the built-in kind set.

use core::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use num_complex::Complex;

use crate::error::Error;
use crate::shape::{Kind, Shape};
use crate::value::{
    MapBuild, MapView, PtrBuild, Reflected, SeqBuild, SeqView, Value, ValueMut, Wire,
};

macro_rules! scalar_wire {
    ($t:ty, $name:literal, $kind:ident, $variant:ident, |$v:ident| $read:expr) => {
        impl Wire for $t {
            const SHAPE: &'static Shape = &const {
                Shape {
                    type_identifier: $name,
                    type_id: TypeId::of::<$t>,
                    kind: Kind::$kind,
                    serializer: None,
                }
            };

            fn mirror(&self) -> Value<'_> {
                let $v = self;
                Value::$variant($read)
            }

            fn mirror_mut(&mut self) -> ValueMut<'_> {
                ValueMut::$variant(self)
            }
        }
    };
    ($t:ty, $name:literal, $kind:ident, $variant:ident) => {
        scalar_wire!($t, $name, $kind, $variant, |v| *v);
    };
}

scalar_wire!(bool, "bool", Bool, Bool);
scalar_wire!(i8, "i8", I8, I8);
scalar_wire!(i16, "i16", I16, I16);
scalar_wire!(i32, "i32", I32, I32);
scalar_wire!(i64, "i64", I64, I64);
scalar_wire!(u8, "u8", U8, U8);
scalar_wire!(u16, "u16", U16, U16);
scalar_wire!(u32, "u32", U32, U32);
scalar_wire!(u64, "u64", U64, U64);
scalar_wire!(f32, "f32", F32, F32);
scalar_wire!(f64, "f64", F64, F64);
scalar_wire!(isize, "isize", Int, Int, |v| *v as i64);
scalar_wire!(usize, "usize", Uint, Uint, |v| *v as u64);
scalar_wire!(Complex<f32>, "Complex<f32>", Complex64, Complex64);
scalar_wire!(Complex<f64>, "Complex<f64>", Complex128, Complex128);

impl Wire for String {
    const SHAPE: &'static Shape = &const {
        Shape {
            type_identifier: "String",
            type_id: TypeId::of::<String>,
            kind: Kind::Str,
            serializer: None,
        }
    };

    fn mirror(&self) -> Value<'_> {
        Value::Str(self)
    }

    fn mirror_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Str(self)
    }
}

impl<T: Wire + Default> Wire for Vec<T> {
    const SHAPE: &'static Shape = &const {
        Shape {
            type_identifier: "Vec",
            type_id: TypeId::of::<Self>,
            kind: Kind::Seq(T::SHAPE),
            serializer: None,
        }
    };

    fn mirror(&self) -> Value<'_> {
        Value::Seq(self)
    }

    fn mirror_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Seq(self)
    }
}

impl<T: Wire + Default> SeqView for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn at(&self, index: usize) -> &dyn Reflected {
        &self[index]
    }
}

impl<T: Wire + Default> SeqBuild for Vec<T> {
    fn fill_default(&mut self, len: usize) -> Result<(), Error> {
        self.clear();
        self.resize_with(len, T::default);
        Ok(())
    }

    fn at_mut(&mut self, index: usize) -> &mut dyn Reflected {
        &mut self[index]
    }
}

impl<T: Wire, const N: usize> Wire for [T; N] {
    const SHAPE: &'static Shape = &const {
        Shape {
            type_identifier: "array",
            type_id: TypeId::of::<Self>,
            kind: Kind::Array(N, T::SHAPE),
            serializer: None,
        }
    };

    fn mirror(&self) -> Value<'_> {
        Value::Seq(self)
    }

    fn mirror_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Seq(self)
    }
}

impl<T: Wire, const N: usize> SeqView for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn at(&self, index: usize) -> &dyn Reflected {
        &self[index]
    }
}

impl<T: Wire, const N: usize> SeqBuild for [T; N] {
    fn fill_default(&mut self, len: usize) -> Result<(), Error> {
        // Elements already exist; decode overwrites each one in place.
        if len != N {
            return Err(Error::LengthMismatch {
                expected: N,
                found: len,
            });
        }
        Ok(())
    }

    fn at_mut(&mut self, index: usize) -> &mut dyn Reflected {
        &mut self[index]
    }
}

macro_rules! map_wire {
    ($map:ident, $name:literal, $($kbound:tt)+) => {
        impl<K, V> Wire for $map<K, V>
        where
            K: Wire + Default + $($kbound)+,
            V: Wire + Default,
        {
            const SHAPE: &'static Shape = &const {
                Shape {
                    type_identifier: $name,
                    type_id: TypeId::of::<Self>,
                    kind: Kind::Map(K::SHAPE, V::SHAPE),
                    serializer: None,
                }
            };

            fn mirror(&self) -> Value<'_> {
                Value::Map(self)
            }

            fn mirror_mut(&mut self) -> ValueMut<'_> {
                ValueMut::Map(self)
            }
        }

        impl<K, V> MapView for $map<K, V>
        where
            K: Wire + Default + $($kbound)+,
            V: Wire + Default,
        {
            fn len(&self) -> usize {
                $map::len(self)
            }

            fn visit(
                &self,
                visit: &mut dyn FnMut(&dyn Reflected, &dyn Reflected) -> Result<(), Error>,
            ) -> Result<(), Error> {
                for (key, value) in self.iter() {
                    visit(key, value)?;
                }
                Ok(())
            }
        }

        impl<K, V> MapBuild for $map<K, V>
        where
            K: Wire + Default + $($kbound)+,
            V: Wire + Default,
        {
            fn clear(&mut self) {
                $map::clear(self);
            }

            fn insert_with(
                &mut self,
                fill: &mut dyn FnMut(&mut dyn Reflected, &mut dyn Reflected) -> Result<(), Error>,
            ) -> Result<(), Error> {
                let mut key = K::default();
                let mut value = V::default();
                fill(&mut key, &mut value)?;
                self.insert(key, value);
                Ok(())
            }
        }
    };
}

map_wire!(HashMap, "HashMap", Eq + Hash);
map_wire!(BTreeMap, "BTreeMap", Ord);

impl<T: Wire + Default> Wire for Option<T> {
    const SHAPE: &'static Shape = &const {
        Shape {
            type_identifier: "Option",
            type_id: TypeId::of::<Self>,
            kind: Kind::Ptr(T::SHAPE),
            serializer: None,
        }
    };

    fn mirror(&self) -> Value<'_> {
        Value::Ptr(self.as_ref().map(|inner| inner as &dyn Reflected))
    }

    fn mirror_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Ptr(self)
    }
}

impl<T: Wire + Default> PtrBuild for Option<T> {
    fn clear(&mut self) {
        *self = None;
    }

    fn set_default(&mut self) -> &mut dyn Reflected {
        self.insert(T::default())
    }
}
