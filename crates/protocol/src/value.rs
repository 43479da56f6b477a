//! Store-value codec with lossless big-integer round-trips.
//!
//! String-valued backing stores cannot hold arbitrary-precision integers
//! natively. Values wrap them in a tagged structure
//! (`{"type":"bigint","value":"<decimal digits>"}`) so a persisted amount
//! decodes back to the exact same integer. Every other JSON-representable
//! value passes through unchanged.

use std::str::FromStr;

pub use num_bigint::BigInt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const BIGINT_TAG: &str = "bigint";

/// Arbitrary-precision integer with a tagged store encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigIntValue(pub BigInt);

impl BigIntValue {
	/// Parses a decimal string into an exact integer value.
	pub fn from_decimal(digits: &str) -> Option<Self> {
		BigInt::from_str(digits).ok().map(Self)
	}

	/// Returns the decimal string form.
	pub fn to_decimal(&self) -> String {
		self.0.to_str_radix(10)
	}
}

impl std::fmt::Display for BigIntValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.to_decimal())
	}
}

impl From<BigInt> for BigIntValue {
	fn from(value: BigInt) -> Self {
		Self(value)
	}
}

impl From<u64> for BigIntValue {
	fn from(value: u64) -> Self {
		Self(BigInt::from(value))
	}
}

impl From<u128> for BigIntValue {
	fn from(value: u128) -> Self {
		Self(BigInt::from(value))
	}
}

impl From<i64> for BigIntValue {
	fn from(value: i64) -> Self {
		Self(BigInt::from(value))
	}
}

#[derive(Serialize, Deserialize)]
struct TaggedBigInt {
	r#type: String,
	value: String,
}

impl Serialize for BigIntValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		TaggedBigInt {
			r#type: BIGINT_TAG.to_string(),
			value: self.to_decimal(),
		}
		.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for BigIntValue {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let tagged = TaggedBigInt::deserialize(deserializer)?;
		if tagged.r#type != BIGINT_TAG {
			return Err(serde::de::Error::custom(format!("expected tag '{BIGINT_TAG}', got '{}'", tagged.r#type)));
		}
		BigInt::from_str(&tagged.value)
			.map(Self)
			.map_err(|_| serde::de::Error::custom("malformed bigint digits"))
	}
}

/// Serializes a store value to its persisted string form.
pub fn to_store_string<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
	serde_json::to_string(value)
}

/// Decodes a persisted string, yielding `None` on any corruption.
///
/// A corrupted persisted value must never crash startup; callers fall
/// back to their default instead.
pub fn from_store_string<T: DeserializeOwned>(raw: &str) -> Option<T> {
	serde_json::from_str(raw).ok()
}
