use once_cell::sync::Lazy;
use serde::de::{Error as DeError, Unexpected};
use std::{
    fmt::{Debug, Display},
    hash::Hash,
    marker::PhantomData,
    num::NonZeroU64,
    str::FromStr,
};
use thiserror::Error;

use self::marker::Marker;

pub mod marker;

/// Typed identifier of any ShabdSetu entity. The marker only exists
/// at compile time so a blog id can never be passed as a user id.
///
/// Ids are stored as Postgres `BIGINT`, so valid values range from
/// 1 to [`Id::MAX`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Id<T: Marker> {
    value: NonZeroU64,
    phantom: PhantomData<T>,
}

impl<T: Marker> Id<T> {
    #[allow(clippy::cast_sign_loss)]
    pub const MAX: u64 = i64::MAX as u64;

    /// # Panics
    ///
    /// It will panic if the value is 0 or greater than [`Id::MAX`].
    #[must_use]
    #[track_caller]
    pub const fn new(n: u64) -> Self {
        if let Some(id) = Self::new_checked(n) {
            id
        } else {
            panic!("value is zero or greater than i64::MAX")
        }
    }

    #[must_use]
    const fn from_nonzero(n: NonZeroU64) -> Self {
        Self {
            value: n,
            phantom: PhantomData,
        }
    }

    #[must_use]
    pub const fn new_checked(n: u64) -> Option<Self> {
        if n > Self::MAX {
            return None;
        }
        if let Some(n) = NonZeroU64::new(n) {
            Some(Self::from_nonzero(n))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.value.get()
    }

    #[must_use]
    pub const fn into_nonzero(self) -> NonZeroU64 {
        self.value
    }

    #[must_use]
    pub const fn cast<M: Marker>(self) -> Id<M> {
        Id {
            value: self.value,
            phantom: PhantomData,
        }
    }
}

impl<T: Marker> Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use heck::ToSnakeCase;
        static MARKER_MODULE: Lazy<String> = Lazy::new(|| {
            format!(
                "{}::types::id::marker::",
                env!("CARGO_PKG_NAME").to_snake_case()
            )
        });

        // all built-in markers are defined in the `marker` module
        let type_name = std::any::type_name::<T>();
        let type_name = if type_name.starts_with(&*MARKER_MODULE) {
            type_name.split("::").last().unwrap_or(type_name)
        } else {
            type_name
        };
        write!(f, "Id::<{type_name}>({})", self.value.get())
    }
}

impl<T: Marker> Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.value.get(), f)
    }
}

impl<T: Marker> Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.value.get());
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid id: expected a positive 64-bit signed integer")]
pub struct ParseIdError;

impl<T: Marker> FromStr for Id<T> {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(Self::new_checked)
            .ok_or(ParseIdError)
    }
}

impl<'de, T: Marker> serde::Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor<T: Marker>(PhantomData<T>);

        impl<'de, T: Marker> serde::de::Visitor<'de> for Visitor<T> {
            type Value = Id<T>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a nonzero id as a number or a string")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                let value = u64::try_from(v)
                    .map_err(|_| DeError::invalid_value(Unexpected::Signed(v), &"nonzero i64"))?;

                self.visit_u64(value)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                Id::<T>::new_checked(v)
                    .ok_or_else(|| DeError::invalid_value(Unexpected::Unsigned(v), &"nonzero i64"))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                v.parse().map_err(|_| {
                    let unexpected = Unexpected::Str(v);
                    DeError::invalid_value(unexpected, &"nonzero i64 string")
                })
            }
        }

        deserializer.deserialize_any(Visitor(PhantomData))
    }
}

impl<T: Marker> serde::Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.value.get())
    }
}

impl<'q, T: Marker> sqlx::Encode<'q, sqlx::Postgres> for Id<T> {
    // already checked
    #[allow(clippy::cast_possible_wrap)]
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::database::HasArguments<'q>>::ArgumentBuffer,
    ) -> sqlx::encode::IsNull {
        if self.value.get() > Self::MAX {
            sqlx::encode::IsNull::Yes
        } else {
            <i64 as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&(self.value.get() as i64), buf)
        }
    }
}

impl<'r, T: Marker> sqlx::Decode<'r, sqlx::Postgres> for Id<T> {
    // already checked
    #[allow(clippy::cast_sign_loss)]
    fn decode(
        value: <sqlx::Postgres as sqlx::database::HasValueRef<'r>>::ValueRef,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        #[derive(Debug, Error)]
        #[error("all IDs must be positive")]
        struct NegativeIdError;

        #[derive(Debug, Error)]
        #[error("all IDs must not be equal to 0")]
        struct EqualToZeroError;

        let value = <i64 as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        if value.is_negative() {
            Err(Box::new(NegativeIdError))
        } else if let Some(inner) = NonZeroU64::new(value as u64) {
            Ok(Id::from_nonzero(inner))
        } else {
            Err(Box::new(EqualToZeroError))
        }
    }
}

impl<T: Marker> sqlx::Type<sqlx::Postgres> for Id<T> {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::id::marker::{AnyMarker, UserMarker};
    use serde_test::Token;
    use static_assertions::{assert_eq_size, assert_impl_all, assert_not_impl_any};

    assert_eq_size!(Id<AnyMarker>, u64);
    assert_eq_size!(Option<Id<AnyMarker>>, u64);
    assert_impl_all!(Id<AnyMarker>:
        Debug, Display, Clone, Copy, Send, Sync, Hash, FromStr,
        sqlx::Decode<'static, sqlx::Postgres>, sqlx::Encode<'static, sqlx::Postgres>,
        sqlx::Type<sqlx::Postgres>
    );
    assert_not_impl_any!(Id<UserMarker>: From<u64>);

    #[test]
    #[should_panic = "value is zero"]
    fn test_new_with_zero() {
        _ = Id::<AnyMarker>::new(0);
    }

    #[test]
    #[should_panic = "greater than i64::MAX"]
    fn test_new_above_bigint_range() {
        _ = Id::<AnyMarker>::new(u64::MAX);
    }

    #[test]
    fn test_initializers() {
        assert!(Id::<AnyMarker>::new_checked(0).is_none());
        assert_eq!(Some(1), Id::<AnyMarker>::new_checked(1).map(Id::get));
        assert_eq!(
            Some(Id::<AnyMarker>::MAX),
            Id::<AnyMarker>::new_checked(Id::<AnyMarker>::MAX).map(Id::get)
        );
        assert!(Id::<AnyMarker>::new_checked(Id::<AnyMarker>::MAX + 1).is_none());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Ok(Id::<UserMarker>::new(42)), "42".parse());
        assert_eq!(Err(ParseIdError), "0".parse::<Id<UserMarker>>());
        assert_eq!(Err(ParseIdError), "-5".parse::<Id<UserMarker>>());
        assert_eq!(Err(ParseIdError), "me".parse::<Id<UserMarker>>());
        assert_eq!(
            Ok(Id::<UserMarker>::new(9_223_372_036_854_775_807)),
            "9223372036854775807".parse()
        );
        assert_eq!(
            Err(ParseIdError),
            "9223372036854775808".parse::<Id<UserMarker>>()
        );
    }

    #[test]
    fn test_fmt_display_impl() {
        assert_eq!("1234567890", Id::<AnyMarker>::new(1234567890).to_string());
    }

    #[test]
    fn test_fmt_debug_impl() {
        assert_eq!(
            "Id::<UserMarker>(1234567890)",
            format!("{:?}", Id::<UserMarker>::new(1234567890))
        );
    }

    #[test]
    fn test_serde_impl() {
        let id = Id::<AnyMarker>::new(1234567890);
        serde_test::assert_de_tokens(&id, &[Token::U64(1234567890)]);
        serde_test::assert_de_tokens(&id, &[Token::Str("1234567890")]);
        serde_test::assert_de_tokens(&id, &[Token::I64(1234567890)]);
        serde_test::assert_ser_tokens(&id, &[Token::Str("1234567890")]);
    }

    #[test]
    fn test_serde_rejects_ids_outside_bigint_range() {
        serde_test::assert_de_tokens_error::<Id<AnyMarker>>(
            &[Token::U64(9_223_372_036_854_775_808)],
            "invalid value: integer `9223372036854775808`, expected nonzero i64",
        );
        serde_test::assert_de_tokens_error::<Id<AnyMarker>>(
            &[Token::Str("9223372036854775808")],
            "invalid value: string \"9223372036854775808\", expected nonzero i64 string",
        );
    }
}
