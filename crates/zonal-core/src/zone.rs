//! Zone configuration: the placement and retention policy of a keyspace region.
//!
//! Every field is independently optional. A config with every field set is
//! *complete*; anything less is *partial* and picks up the missing fields
//! from its ancestors at resolution time. `None` always means "unset";
//! `Some(vec![])` is an explicit empty list and stops inheritance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ZoneError, ZoneResult};

/// Smallest `range_max_bytes` a config may ask for.
pub const MIN_RANGE_MAX_BYTES: i64 = 64 << 10;

/// Individually inheritable fields of a [`ZoneConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneField {
    NumReplicas,
    RangeMinBytes,
    RangeMaxBytes,
    Gc,
    Constraints,
    LeasePreferences,
}

impl ZoneField {
    pub const ALL: [ZoneField; 6] = [
        ZoneField::NumReplicas,
        ZoneField::RangeMinBytes,
        ZoneField::RangeMaxBytes,
        ZoneField::Gc,
        ZoneField::Constraints,
        ZoneField::LeasePreferences,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ZoneField::NumReplicas => "num_replicas",
            ZoneField::RangeMinBytes => "range_min_bytes",
            ZoneField::RangeMaxBytes => "range_max_bytes",
            ZoneField::Gc => "gc",
            ZoneField::Constraints => "constraints",
            ZoneField::LeasePreferences => "lease_preferences",
        }
    }
}

impl fmt::Display for ZoneField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Garbage-collection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GcPolicy {
    /// Seconds overwritten values are retained before collection.
    pub ttl_seconds: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Required,
    Prohibited,
}

/// A replica placement predicate, written `+key=value`, `-key=value` or `+value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub key: Option<String>,
    pub value: String,
}

impl Constraint {
    pub fn required(key: &str, value: &str) -> Self {
        Self {
            kind: ConstraintKind::Required,
            key: Some(key.to_string()),
            value: value.to_string(),
        }
    }

    pub fn prohibited(key: &str, value: &str) -> Self {
        Self {
            kind: ConstraintKind::Prohibited,
            key: Some(key.to_string()),
            value: value.to_string(),
        }
    }

    fn same_predicate(&self, other: &Constraint) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl FromStr for Constraint {
    type Err = ZoneError;

    fn from_str(s: &str) -> ZoneResult<Self> {
        let s = s.trim();
        let (kind, rest) = if let Some(rest) = s.strip_prefix('+') {
            (ConstraintKind::Required, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (ConstraintKind::Prohibited, rest)
        } else {
            return Err(ZoneError::invalid(format!(
                "constraint \"{s}\" must begin with '+' or '-'"
            )));
        };
        let (key, value) = match rest.split_once('=') {
            Some((k, v)) => (Some(k.trim().to_string()), v.trim().to_string()),
            None => (None, rest.trim().to_string()),
        };
        if value.is_empty() || key.as_deref() == Some("") {
            return Err(ZoneError::invalid(format!(
                "constraint \"{s}\" has an empty key or value"
            )));
        }
        Ok(Self { kind, key, value })
    }
}

impl TryFrom<String> for Constraint {
    type Error = ZoneError;

    fn try_from(s: String) -> ZoneResult<Self> {
        s.parse()
    }
}

impl From<Constraint> for String {
    fn from(c: Constraint) -> String {
        c.to_string()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.kind {
            ConstraintKind::Required => '+',
            ConstraintKind::Prohibited => '-',
        };
        match &self.key {
            Some(key) => write!(f, "{sign}{key}={}", self.value),
            None => write!(f, "{sign}{}", self.value),
        }
    }
}

/// A conjunction of constraints describing where leaseholders should live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeasePreference {
    pub constraints: Vec<Constraint>,
}

/// Placement/retention policy, each field independently unset-able.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_min_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_max_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Constraint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_preferences: Option<Vec<LeasePreference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gc: Option<GcPolicy>,
}

impl ZoneConfig {
    /// An empty (fully inheriting) config.
    pub fn new() -> Self {
        Self::default()
    }

    /// The baked-in complete default used when nothing else is configured.
    pub fn default_zone() -> Self {
        Self {
            num_replicas: Some(3),
            range_min_bytes: Some(128 << 20),
            range_max_bytes: Some(512 << 20),
            constraints: Some(Vec::new()),
            lease_preferences: Some(Vec::new()),
            gc: Some(GcPolicy { ttl_seconds: 4 * 60 * 60 }),
        }
    }

    pub fn with_num_replicas(mut self, n: i32) -> Self {
        self.num_replicas = Some(n);
        self
    }

    pub fn with_range_bytes(mut self, min: i64, max: i64) -> Self {
        self.range_min_bytes = Some(min);
        self.range_max_bytes = Some(max);
        self
    }

    pub fn with_gc_ttl(mut self, ttl_seconds: i32) -> Self {
        self.gc = Some(GcPolicy { ttl_seconds });
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn with_lease_preferences(mut self, prefs: Vec<LeasePreference>) -> Self {
        self.lease_preferences = Some(prefs);
        self
    }

    pub fn is_set(&self, field: ZoneField) -> bool {
        match field {
            ZoneField::NumReplicas => self.num_replicas.is_some(),
            ZoneField::RangeMinBytes => self.range_min_bytes.is_some(),
            ZoneField::RangeMaxBytes => self.range_max_bytes.is_some(),
            ZoneField::Gc => self.gc.is_some(),
            ZoneField::Constraints => self.constraints.is_some(),
            ZoneField::LeasePreferences => self.lease_preferences.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ZoneField::ALL.iter().all(|f| !self.is_set(*f))
    }

    pub fn is_complete(&self) -> bool {
        ZoneField::ALL.iter().all(|f| self.is_set(*f))
    }

    pub fn missing_fields(&self) -> Vec<ZoneField> {
        ZoneField::ALL
            .into_iter()
            .filter(|f| !self.is_set(*f))
            .collect()
    }

    /// Copy one field from `other`, regardless of whether it is set there.
    fn copy_field(&mut self, other: &ZoneConfig, field: ZoneField) {
        match field {
            ZoneField::NumReplicas => self.num_replicas = other.num_replicas,
            ZoneField::RangeMinBytes => self.range_min_bytes = other.range_min_bytes,
            ZoneField::RangeMaxBytes => self.range_max_bytes = other.range_max_bytes,
            ZoneField::Gc => self.gc = other.gc,
            ZoneField::Constraints => self.constraints = other.constraints.clone(),
            ZoneField::LeasePreferences => {
                self.lease_preferences = other.lease_preferences.clone()
            }
        }
    }

    /// Fill every unset field from `parent`. Returns the fields that were
    /// actually supplied by `parent`.
    pub fn inherit_from(&mut self, parent: &ZoneConfig) -> Vec<ZoneField> {
        let mut taken = Vec::new();
        for field in ZoneField::ALL {
            if !self.is_set(field) && parent.is_set(field) {
                self.copy_field(parent, field);
                taken.push(field);
            }
        }
        taken
    }

    /// Overwrite every field that is set in `other`.
    pub fn overlay(&mut self, other: &ZoneConfig) {
        for field in ZoneField::ALL {
            if other.is_set(field) {
                self.copy_field(other, field);
            }
        }
    }

    /// Check the fields that are set for malformed or contradictory values.
    pub fn validate(&self) -> ZoneResult<()> {
        if let Some(n) = self.num_replicas {
            if n < 1 {
                return Err(ZoneError::invalid("at least one replica is required"));
            }
        }
        if let Some(min) = self.range_min_bytes {
            if min < 0 {
                return Err(ZoneError::invalid(format!(
                    "range_min_bytes {min} must be non-negative"
                )));
            }
        }
        if let Some(max) = self.range_max_bytes {
            if max < MIN_RANGE_MAX_BYTES {
                return Err(ZoneError::invalid(format!(
                    "range_max_bytes {max} less than minimum allowed {MIN_RANGE_MAX_BYTES}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.range_min_bytes, self.range_max_bytes) {
            if min >= max {
                return Err(ZoneError::invalid(format!(
                    "range_min_bytes {min} is greater than or equal to range_max_bytes {max}"
                )));
            }
        }
        if let Some(gc) = self.gc {
            if gc.ttl_seconds < 0 {
                return Err(ZoneError::invalid(format!(
                    "gc ttl_seconds {} must be non-negative",
                    gc.ttl_seconds
                )));
            }
        }
        if let Some(constraints) = &self.constraints {
            for (i, a) in constraints.iter().enumerate() {
                if a.value.is_empty() {
                    return Err(ZoneError::invalid("constraint value must not be empty"));
                }
                if constraints[i + 1..]
                    .iter()
                    .any(|b| b.kind != a.kind && b.same_predicate(a))
                {
                    return Err(ZoneError::invalid(format!(
                        "constraint {} is both required and prohibited",
                        Constraint {
                            kind: ConstraintKind::Required,
                            ..a.clone()
                        }
                    )));
                }
            }
        }
        if let Some(prefs) = &self.lease_preferences {
            if prefs.iter().any(|p| p.constraints.is_empty()) {
                return Err(ZoneError::invalid(
                    "every lease preference must include at least one constraint",
                ));
            }
        }
        Ok(())
    }

    /// Validate and additionally require every field to be set.
    pub fn validate_complete(&self) -> ZoneResult<()> {
        self.validate()?;
        match self.missing_fields().first() {
            Some(field) => Err(ZoneError::invalid(format!(
                "default zone config is missing field `{field}`"
            ))),
            None => Ok(()),
        }
    }

    /// Parse the raw TOML form, e.g. `num_replicas = 5` / `gc = { ttl_seconds = 42 }`.
    pub fn from_toml_str(raw: &str) -> ZoneResult<Self> {
        toml::from_str(raw).map_err(|e| ZoneError::invalid(e.message().to_string()))
    }

    pub fn to_toml_string(&self) -> ZoneResult<String> {
        toml::to_string(self).map_err(|e| ZoneError::invalid(e.to_string()))
    }
}
