//! Helpers for the MongoDB models.

use std::marker::PhantomData;

use anyhow::Context as _;
use bson::Document;
use mongodb::error::{CommandError, Error, ErrorKind};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::de::Visitor;
use serde::{Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};

/// Declares a type as being stored in a MongoDB collection.
pub trait ModelCollection: Sized + Send + Sync {
    /// The name of the MongoDB collection.
    const COLLECTION_NAME: &str;

    fn collection(db: &Database) -> Collection<Self> {
        db.collection(Self::COLLECTION_NAME)
    }

    /// Indices to create on startup via [`update_indices`].
    fn indices() -> Vec<IndexModel> {
        Vec::new()
    }
}

/// Creates the indices for model `M`.
///
/// Indices whose key spec changed are dropped and recreated, so every index
/// needs a name.
pub async fn update_indices<M: ModelCollection>(db: &Database) -> anyhow::Result<()> {
    let collection = db.collection::<Document>(M::COLLECTION_NAME);
    for index in M::indices() {
        match collection.create_index(index.clone()).await {
            Ok(_) => {},
            Err(err) if is_key_spec_conflict(&err) => {
                let Some(IndexOptions {
                    name: Some(name), ..
                }) = index.options.as_ref()
                else {
                    return Err(err).context("index needs a name to be recreated");
                };

                let name = name.clone();

                collection.drop_index(name.as_str()).await?;
                collection.create_index(index).await?;
                log::info!("Recreated index {}/{name}.", M::COLLECTION_NAME);
            },
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("cannot create index on {}", M::COLLECTION_NAME));
            },
        }
    }

    Ok(())
}

// code 86 is `IndexKeySpecsConflict`
fn is_key_spec_conflict(err: &Error) -> bool {
    matches!(*err.kind, ErrorKind::Command(CommandError { code: 86, .. }))
}

/// Discord snowflakes that are stored as [`i64`] in the database.
pub trait Snowflake: Copy {
    fn to_i64(self) -> i64;
    fn from_u64(value: u64) -> Option<Self>;
}

macro_rules! impl_snowflake {
    ($($ty:ty),*) => {$(
        impl Snowflake for $ty {
            fn to_i64(self) -> i64 {
                self.get().cast_signed()
            }

            fn from_u64(value: u64) -> Option<Self> {
                (value != 0).then(|| Self::new(value))
            }
        }
    )*};
}

impl_snowflake!(ChannelId, GuildId, MessageId, RoleId, UserId);

/// Stores Discord ids as [`i64`] so they can be indexed and compared.
///
/// Also accepts stringified ids when reading.
pub enum IdI64 {}

impl<T: Snowflake> SerializeAs<T> for IdI64 {
    fn serialize_as<S: Serializer>(source: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(source.to_i64())
    }
}

impl<'de, T: Snowflake> DeserializeAs<'de, T> for IdI64 {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
        deserializer.deserialize_any(IdVisitor(PhantomData))
    }
}

struct IdVisitor<T>(PhantomData<T>);

impl<T: Snowflake> Visitor<'_> for IdVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("an integer or string snowflake")
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<T, E> {
        self.visit_u64(v.cast_unsigned())
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<T, E> {
        T::from_u64(v).ok_or_else(|| E::custom("discord id cannot be zero"))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<T, E> {
        let v: u64 = v.parse().map_err(E::custom)?;
        self.visit_u64(v)
    }
}

/// Unix timestamps in seconds, written as [`i64`].
///
/// Older records store fractional seconds as doubles, which are truncated
/// when read.
pub enum UnixSecs {}

impl SerializeAs<i64> for UnixSecs {
    fn serialize_as<S: Serializer>(source: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*source)
    }
}

impl<'de> DeserializeAs<'de, i64> for UnixSecs {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(UnixSecsVisitor)
    }
}

struct UnixSecsVisitor;

impl Visitor<'_> for UnixSecsVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a unix timestamp")
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(E::custom)
    }

    #[expect(clippy::cast_possible_truncation)]
    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<i64, E> {
        if v.is_finite() {
            Ok(v.trunc() as i64)
        } else {
            Err(E::custom("timestamp must be finite"))
        }
    }
}

/// Converts an id into the [`bson::Bson`] value used in queries.
pub fn id_bson<T: Snowflake>(id: T) -> bson::Bson {
    bson::Bson::Int64(id.to_i64())
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_with::serde_as;
    use serenity::model::id::UserId;

    use super::{IdI64, UnixSecs};

    #[serde_as]
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Record {
        #[serde_as(as = "IdI64")]
        user: UserId,
    }

    #[test]
    fn id_as_int() {
        let record = Record {
            user: UserId::new(u64::MAX - 5),
        };

        let doc = bson::serialize_to_document(&record).expect("must serialize");
        assert_eq!(doc.get_i64("user").expect("must be i64"), -6);

        let back: Record = bson::deserialize_from_document(doc).expect("must deserialize");
        assert_eq!(back, record);
    }

    #[test]
    fn id_from_string() {
        let doc = bson::doc! { "user": "314349398811475968" };
        let record: Record = bson::deserialize_from_document(doc).expect("must deserialize");
        assert_eq!(record.user, UserId::new(314_349_398_811_475_968));
    }

    #[test]
    fn id_zero_rejected() {
        let doc = bson::doc! { "user": 0_i64 };
        assert!(bson::deserialize_from_document::<Record>(doc).is_err());
    }

    #[serde_as]
    #[derive(Debug, Deserialize)]
    struct Stamped {
        #[serde_as(as = "UnixSecs")]
        timestamp: i64,
    }

    #[test]
    fn timestamp_from_int_or_double() {
        let doc = bson::doc! { "timestamp": 1_559_570_531_i64 };
        let stamped: Stamped = bson::deserialize_from_document(doc).expect("must deserialize");
        assert_eq!(stamped.timestamp, 1_559_570_531);

        let doc = bson::doc! { "timestamp": 1_559_570_531.75_f64 };
        let stamped: Stamped = bson::deserialize_from_document(doc).expect("must deserialize");
        assert_eq!(stamped.timestamp, 1_559_570_531);

        let doc = bson::doc! { "timestamp": 42_i32 };
        let stamped: Stamped = bson::deserialize_from_document(doc).expect("must deserialize");
        assert_eq!(stamped.timestamp, 42);
    }
}
