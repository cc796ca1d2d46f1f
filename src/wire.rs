//! Payload codec gateway.
//!
//! A payload type crosses the wire only if it implements [`Wire`] — that trait
//! bound is the fixed, queryable allowed-type predicate. Primitives, `String`,
//! and `char` are allowed out of the box; aggregates opt in with
//! [`impl_wire!`]. Validation is therefore eager: a disallowed type cannot be
//! declared on a channel at all, and never reaches a send.
//!
//! On the wire every message frame carries a *sequence* of values; a
//! single-value send is a sequence of one. Encoding failures surface to the
//! sender before any transport call. Decoding failures are reported and the
//! frame is dropped for that channel without disturbing dispatch.

use crate::error::WireError;
use serde::{de::DeserializeOwned, Serialize};

/// Marker and codec contract for types allowed across the wire.
///
/// The tag names the type on diagnostics; it is not transmitted.
pub trait Wire: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable name for this payload type, used in logs and errors.
    fn tag() -> &'static str;
}

/// Implement [`Wire`] for an aggregate payload type.
///
/// The type must already derive `Serialize` and `Deserialize`.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct VesselUpdate { id: u32, altitude: f64 }
///
/// hubcast::impl_wire!(VesselUpdate);
/// ```
#[macro_export]
macro_rules! impl_wire {
    ($t:ty) => {
        impl $crate::wire::Wire for $t {
            fn tag() -> &'static str {
                stringify!($t)
            }
        }
    };
}

macro_rules! impl_wire_for_primitive {
    ($t:ty, $tag:expr) => {
        impl Wire for $t {
            fn tag() -> &'static str {
                $tag
            }
        }
    };
}

impl_wire_for_primitive!(i8, "i8");
impl_wire_for_primitive!(i16, "i16");
impl_wire_for_primitive!(i32, "i32");
impl_wire_for_primitive!(i64, "i64");
impl_wire_for_primitive!(u8, "u8");
impl_wire_for_primitive!(u16, "u16");
impl_wire_for_primitive!(u32, "u32");
impl_wire_for_primitive!(u64, "u64");
impl_wire_for_primitive!(f32, "f32");
impl_wire_for_primitive!(f64, "f64");
impl_wire_for_primitive!(bool, "bool");
impl_wire_for_primitive!(char, "char");
impl_wire_for_primitive!(String, "String");

/// Encode a sequence of payload values for transit.
pub fn encode_values<T: Wire>(values: &[T]) -> Result<Vec<u8>, WireError> {
    postcard::to_allocvec(values).map_err(|e| WireError::Encode {
        tag: T::tag(),
        reason: e.to_string(),
    })
}

/// Decode a sequence of payload values from inbound bytes.
pub fn decode_values<T: Wire>(bytes: &[u8]) -> Result<Vec<T>, WireError> {
    postcard::from_bytes(bytes).map_err(|e| WireError::Decode {
        tag: T::tag(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Telemetry {
        craft: u32,
        altitude: f64,
        label: String,
    }

    impl_wire!(Telemetry);

    #[test]
    fn roundtrip_primitive() {
        let bytes = encode_values(&[42i32]).unwrap();
        let values: Vec<i32> = decode_values(&bytes).unwrap();
        assert_eq!(values, vec![42]);
    }

    #[test]
    fn roundtrip_batch() {
        let bytes = encode_values(&["a".to_string(), "b".to_string()]).unwrap();
        let values: Vec<String> = decode_values(&bytes).unwrap();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn roundtrip_aggregate() {
        let original = Telemetry {
            craft: 9,
            altitude: 71_234.5,
            label: "apoapsis".into(),
        };
        let bytes = encode_values(std::slice::from_ref(&original)).unwrap();
        let values: Vec<Telemetry> = decode_values(&bytes).unwrap();
        assert_eq!(values, vec![original]);
        assert_eq!(Telemetry::tag(), "Telemetry");
    }

    #[test]
    fn decode_failure_is_reported() {
        // A truncated varint sequence cannot decode as Vec<String>.
        let err = decode_values::<String>(&[0xff]).unwrap_err();
        match err {
            WireError::Decode { tag, .. } => assert_eq!(tag, "String"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
