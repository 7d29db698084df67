use std::fmt;

use serde::{
    de::{self, Deserializer, SeqAccess, Visitor},
    Deserialize, Serialize, Serializer,
};

use crate::{base32, EncodedUlid, Ulid, ULID_BINARY_LEN, ULID_LEN};

// Human readable formats get the 26-character text, binary formats the 16 raw bytes.
impl Serialize for Ulid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            let mut buffer = [0; ULID_LEN];
            serializer.serialize_str(base32::encode(self.to_u128(), &mut buffer))
        } else {
            serializer.serialize_bytes(&self.to_bytes())
        }
    }
}

impl Serialize for EncodedUlid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

struct UlidVisitor;

impl<'de> Visitor<'de> for UlidVisitor {
    type Value = Ulid;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a valid ULID string or 16 bytes")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value.parse().map_err(de::Error::custom)
    }

    fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
        Ulid::try_from(value).map_err(|_| de::Error::invalid_length(value.len(), &self))
    }

    // Some binary formats hand out byte strings as sequences.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = [0; ULID_BINARY_LEN];

        for (index, byte) in bytes.iter_mut().enumerate() {
            *byte = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(index, &self))?;
        }

        if seq.next_element::<u8>()?.is_some() {
            return Err(de::Error::invalid_length(ULID_BINARY_LEN + 1, &self));
        }

        Ok(Ulid::from_bytes(bytes))
    }
}

impl<'de> Deserialize<'de> for Ulid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(UlidVisitor)
        } else {
            deserializer.deserialize_bytes(UlidVisitor)
        }
    }
}

impl<'de> Deserialize<'de> for EncodedUlid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EncodedVisitor;

        impl<'de> Visitor<'de> for EncodedVisitor {
            type Value = EncodedUlid;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a valid ULID string")
            }
            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(EncodedVisitor)
    }
}
