//! Type-checked identifiers.
//!
//! Every entity id is a [`TypeId<T>`], a phantom-typed wrapper around a [`Uuid`]
//! so that, e.g., a [`PairingId`] and a [`PlayerId`] cannot be swapped by accident
//! even though both are UUIDs under the hood.

use std::{fmt, hash::Hash, marker::PhantomData, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::domain::model::{Pairing, Player, Result as GameResult, Team, Tournament};

/// A type-checked wrapper around a [`Uuid`].
#[derive(Debug)]
pub struct TypeId<T>(Uuid, PhantomData<fn() -> T>);

/// Identifies a [`Tournament`].
pub type TournamentId = TypeId<Tournament>;
/// Identifies a [`Player`].
pub type PlayerId = TypeId<Player>;
/// Identifies a [`Team`].
pub type TeamId = TypeId<Team>;
/// Identifies a [`Pairing`].
pub type PairingId = TypeId<Pairing>;
/// Identifies a [`GameResult`] row.
pub type ResultId = TypeId<GameResult>;

impl<T> TypeId<T> {
    /// Wraps an existing [`Uuid`].
    pub fn new(id: Uuid) -> Self {
        Self(id, PhantomData)
    }

    /// Generates a fresh, random id.
    pub fn random() -> Self {
        Self::new(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl<T> Clone for TypeId<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for TypeId<T> {}

impl<T> PartialEq for TypeId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T> Eq for TypeId<T> {}

impl<T> PartialOrd for TypeId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for TypeId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for TypeId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T> fmt::Display for TypeId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T> FromStr for TypeId<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self::new)
    }
}

impl<T> From<Uuid> for TypeId<T> {
    fn from(id: Uuid) -> Self {
        Self::new(id)
    }
}

impl<T> From<TypeId<T>> for Uuid {
    fn from(id: TypeId<T>) -> Uuid {
        id.0
    }
}

impl<'de, T> Deserialize<'de> for TypeId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Uuid::deserialize(deserializer).map(Self::new)
    }
}

impl<T> Serialize for TypeId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}
