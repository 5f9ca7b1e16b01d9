//! Claim sets carried inside a token.
//!
//! A claim is a `(name, value)` assertion about the token's subject. A
//! [`ClaimSet`] keeps claims in insertion order and is round-tripped through
//! a token unchanged.
//!
//! # Invariants
//! - A name appears at most once unless it is multi-valued
//!   ([`names::is_multi_valued`]); `role` and `group` may repeat.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Well-known claim names.
pub mod names {
    /// Subject identifier.
    pub const SUBJECT: &str = "sub";
    /// Display or login name.
    pub const NAME: &str = "name";
    /// Email address.
    pub const EMAIL: &str = "email";
    /// Role membership. Multi-valued.
    pub const ROLE: &str = "role";
    /// Group membership. Multi-valued.
    pub const GROUP: &str = "group";
    /// Opaque value that changes whenever the user's credentials change.
    pub const SECURITY_STAMP: &str = "security_stamp";

    /// Whether a claim name may appear more than once in a set.
    #[must_use]
    pub fn is_multi_valued(name: &str) -> bool {
        matches!(name, ROLE | GROUP)
    }
}

/// A single name/value assertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Claim {
    pub name: String,
    pub value: String,
}

impl Claim {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Error returned when a claim cannot be added to a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// The claim name is empty.
    EmptyName,
    /// A single-valued claim name is already present.
    Duplicate(String),
}

impl std::fmt::Display for ClaimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "claim name must not be empty"),
            Self::Duplicate(name) => write!(f, "duplicate single-valued claim: {name}"),
        }
    }
}

impl std::error::Error for ClaimError {}

/// Ordered collection of claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    claims: Vec<Claim>,
}

impl ClaimSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { claims: Vec::new() }
    }

    /// Build a set from `(name, value)` pairs, enforcing the uniqueness rule.
    ///
    /// # Errors
    /// Returns the first [`ClaimError`] encountered.
    pub fn from_pairs<I, N, V>(pairs: I) -> Result<Self, ClaimError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (name, value) in pairs {
            set.push(name, value)?;
        }
        Ok(set)
    }

    /// Append a claim.
    ///
    /// # Errors
    /// Returns [`ClaimError::EmptyName`] for an empty name and
    /// [`ClaimError::Duplicate`] when a single-valued name is already present.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ClaimError> {
        let claim = Claim::new(name, value);
        if claim.name.is_empty() {
            return Err(ClaimError::EmptyName);
        }
        if !names::is_multi_valued(&claim.name) && self.contains(&claim.name) {
            return Err(ClaimError::Duplicate(claim.name));
        }
        self.claims.push(claim);
        Ok(())
    }

    /// Builder-style [`push`](Self::push).
    ///
    /// # Errors
    /// Same as [`push`](Self::push).
    pub fn with(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, ClaimError> {
        self.push(name, value)?;
        Ok(self)
    }

    /// First value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|claim| claim.name == name)
            .map(|claim| claim.value.as_str())
    }

    /// Every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |claim| claim.name == name)
            .map(|claim| claim.value.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.claims.iter().any(|claim| claim.name == name)
    }

    /// The subject claim, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.get(names::SUBJECT)
    }

    /// Whether the set carries `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.get_all(names::ROLE).any(|value| value == role)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Claim> {
        self.claims.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.claims.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl<'a> IntoIterator for &'a ClaimSet {
    type Item = &'a Claim;
    type IntoIter = std::slice::Iter<'a, Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.iter()
    }
}

// Serialized as `[[name, value], ...]` so order and repeated names survive.
impl Serialize for ClaimSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.claims.len()))?;
        for claim in &self.claims {
            seq.serialize_element(&(&claim.name, &claim.value))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ClaimSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(String, String)>::deserialize(deserializer)?;
        Self::from_pairs(pairs).map_err(serde::de::Error::custom)
    }
}

/// Anything that can describe itself as a claim set.
///
/// Lets the token service issue tokens for a host's own user type without
/// depending on it.
pub trait ClaimsSource {
    /// Produce the claims to embed in a token.
    ///
    /// # Errors
    /// Returns a [`ClaimError`] if the source's data violates the claim rules.
    fn claims(&self) -> Result<ClaimSet, ClaimError>;
}

impl ClaimsSource for ClaimSet {
    fn claims(&self) -> Result<ClaimSet, ClaimError> {
        Ok(self.clone())
    }
}

/// A minimal user identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub user_name: String,
    pub email: Option<String>,
    pub security_stamp: Option<String>,
    pub roles: Vec<String>,
}

impl ClaimsSource for UserIdentity {
    fn claims(&self) -> Result<ClaimSet, ClaimError> {
        let mut set = ClaimSet::new()
            .with(names::SUBJECT, self.id.as_str())?
            .with(names::NAME, self.user_name.as_str())?;
        if let Some(email) = &self.email {
            set.push(names::EMAIL, email.as_str())?;
        }
        // Carried for a future revocation check; nothing validates it yet.
        if let Some(stamp) = &self.security_stamp {
            set.push(names::SECURITY_STAMP, stamp.as_str())?;
        }
        for role in &self.roles {
            set.push(names::ROLE, role.as_str())?;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let set = ClaimSet::from_pairs([("sub", "42"), ("name", "alice"), ("tenant", "acme")])
            .expect("valid claims");

        let names: Vec<&str> = set.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["sub", "name", "tenant"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_duplicate_single_valued_rejected() {
        let mut set = ClaimSet::new();
        set.push("sub", "1").expect("first sub");

        assert_eq!(
            set.push("sub", "2"),
            Err(ClaimError::Duplicate("sub".to_string()))
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_multi_valued_roles_allowed() {
        let set = ClaimSet::from_pairs([("role", "admin"), ("role", "editor"), ("group", "a")])
            .expect("valid claims");

        let roles: Vec<&str> = set.get_all("role").collect();
        assert_eq!(roles, ["admin", "editor"]);
        assert!(set.has_role("editor"));
        assert!(!set.has_role("viewer"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut set = ClaimSet::new();
        assert_eq!(set.push("", "x"), Err(ClaimError::EmptyName));
    }

    #[test]
    fn test_get_and_subject() {
        let set = ClaimSet::new()
            .with("sub", "user-1")
            .and_then(|s| s.with("name", "bob"))
            .expect("valid claims");

        assert_eq!(set.subject(), Some("user-1"));
        assert_eq!(set.get("name"), Some("bob"));
        assert_eq!(set.get("email"), None);
        assert!(set.contains("name"));
    }

    #[test]
    fn test_serde_shape() {
        let set = ClaimSet::from_pairs([("sub", "1"), ("role", "a"), ("role", "b")])
            .expect("valid claims");

        let json = serde_json::to_string(&set).expect("serialize");
        assert_eq!(json, r#"[["sub","1"],["role","a"],["role","b"]]"#);

        let back: ClaimSet = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, set);
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let result = serde_json::from_str::<ClaimSet>(r#"[["sub","1"],["sub","2"]]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_user_identity_claims() {
        let user = UserIdentity {
            id: "7".to_string(),
            user_name: "carol".to_string(),
            email: Some("carol@example.com".to_string()),
            security_stamp: Some("stamp-1".to_string()),
            roles: vec!["admin".to_string(), "ops".to_string()],
        };

        let set = user.claims().expect("valid claims");
        assert_eq!(set.subject(), Some("7"));
        assert_eq!(set.get(names::NAME), Some("carol"));
        assert_eq!(set.get(names::EMAIL), Some("carol@example.com"));
        assert_eq!(set.get(names::SECURITY_STAMP), Some("stamp-1"));
        assert_eq!(set.get_all(names::ROLE).collect::<Vec<_>>(), ["admin", "ops"]);
    }

    #[test]
    fn test_user_identity_without_optional_fields() {
        let user = UserIdentity {
            id: "8".to_string(),
            user_name: "dave".to_string(),
            ..UserIdentity::default()
        };

        let set = user.claims().expect("valid claims");
        assert_eq!(set.len(), 2);
        assert!(!set.contains(names::EMAIL));
    }

    #[test]
    fn test_claim_error_display() {
        assert_eq!(ClaimError::EmptyName.to_string(), "claim name must not be empty");
        assert_eq!(
            ClaimError::Duplicate("sub".to_string()).to_string(),
            "duplicate single-valued claim: sub"
        );
    }
}
