//! Serde support: a tensor serializes as `{shape, data}` with the data in
//! logical row-major order, so views serialize their own window.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, Error, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::num::Elem;
use crate::tensor::Tensor;

const FIELDS: &[&str] = &["shape", "data"];

impl<T: Elem + Serialize> Serialize for Tensor<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Tensor", 2)?;
        state.serialize_field("shape", self.shape())?;
        state.serialize_field("data", &self.ravel())?;
        state.end()
    }
}

impl<'de, T: Elem + Deserialize<'de>> Deserialize<'de> for Tensor<T> {
    fn deserialize<D>(deserializer: D) -> Result<Tensor<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TensorVisitor<T> {
            marker: PhantomData<T>,
        }

        impl<'de, T: Elem + Deserialize<'de>> Visitor<'de> for TensorVisitor<T> {
            type Value = Tensor<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map with shape and data fields")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Tensor<T>, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut shape: Option<Vec<usize>> = None;
                let mut data: Option<Vec<T>> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "shape" => shape = Some(map.next_value()?),
                        "data" => data = Some(map.next_value()?),
                        _ => return Err(A::Error::unknown_field(&key, FIELDS)),
                    }
                }
                let shape = shape.ok_or_else(|| A::Error::missing_field("shape"))?;
                let data = data.ok_or_else(|| A::Error::missing_field("data"))?;
                Tensor::from_data(&shape, data).map_err(A::Error::custom)
            }
        }

        deserializer.deserialize_struct(
            "Tensor",
            FIELDS,
            TensorVisitor {
                marker: PhantomData,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::Tensor;

    #[test]
    fn test_json_round_trip() {
        let t = Tensor::arange(0i32, 6, 1).unwrap().reshape(&[2, 3]).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"shape":[2,3],"data":[0,1,2,3,4,5]}"#);

        let back: Tensor<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.shape(), t.shape());
        assert_eq!(back.ravel(), t.ravel());
    }

    #[test]
    fn test_scalar_round_trip() {
        let t = Tensor::from_scalar(2.5f64);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"shape":[],"data":[2.5]}"#);

        let back: Tensor<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rank(), 0);
        assert_eq!(back.item(), Some(2.5));
    }

    #[test]
    fn test_view_serializes_window() {
        let t = Tensor::arange(0i32, 5, 1).unwrap();
        let s = t.slice(1, 3).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"shape":[2],"data":[1,2]}"#);
    }

    #[test]
    fn test_invalid_shape_rejected() {
        let result: Result<Tensor<i32>, _> =
            serde_json::from_str(r#"{"shape":[3],"data":[1,2]}"#);
        assert!(result.is_err());
    }
}
