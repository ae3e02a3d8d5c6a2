//! Domain types for the ticket queue.
//!
//! Value objects (claimant identity, hold identity, expiry, ticket codes) and the
//! per-claimant workflow states exposed to the presentation layer.

use crate::error::ClaimantIdError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Identity of a claimant: the name they entered.
///
/// The name is the unique key across queue, holds and workflow state. Two people
/// who type the same name are the same claimant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClaimantId(String);

impl ClaimantId {
    /// Maximum accepted name length, in characters
    pub const MAX_LEN: usize = 64;

    /// Creates a `ClaimantId` from a raw name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimantIdError::Empty`] for blank names and
    /// [`ClaimantIdError::TooLong`] past [`Self::MAX_LEN`] characters.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ClaimantIdError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ClaimantIdError::Empty);
        }

        let len = trimmed.chars().count();
        if len > Self::MAX_LEN {
            return Err(ClaimantIdError::TooLong {
                len,
                max: Self::MAX_LEN,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The claimant's name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClaimantId {
    type Err = ClaimantIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClaimantId {
    type Error = ClaimantIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClaimantId> for String {
    fn from(id: ClaimantId) -> Self {
        id.0
    }
}

impl AsRef<str> for ClaimantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a reservation hold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HoldId(Uuid);

impl HoldId {
    /// Creates a new random `HoldId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HoldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Holds
// ============================================================================

/// Absolute instant at which a hold stops being valid.
///
/// A hold is still valid at exactly its expiry instant and expired strictly after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HoldExpiry(DateTime<Utc>);

impl HoldExpiry {
    /// Creates a new `HoldExpiry`
    #[must_use]
    pub const fn new(expiry: DateTime<Utc>) -> Self {
        Self(expiry)
    }

    /// Returns the inner `DateTime`
    #[must_use]
    pub const fn inner(&self) -> DateTime<Utc> {
        self.0
    }

    /// Checks if the hold has expired at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.0
    }

    /// Time left before expiry, zero once expired
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.0 - now).max(Duration::zero())
    }
}

impl fmt::Display for HoldExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

/// A time-bounded reservation of one ticket for one claimant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    /// Unique hold identifier
    pub id: HoldId,
    /// Claimant holding the ticket
    pub claimant: ClaimantId,
    /// When the hold was created
    pub created_at: DateTime<Utc>,
    /// When the hold stops being valid
    pub expires_at: HoldExpiry,
}

impl Hold {
    /// Creates a hold starting at `created_at` and lasting `duration`.
    ///
    /// Returns `None` when the expiry falls outside the representable time range.
    #[must_use]
    pub fn new(
        claimant: ClaimantId,
        created_at: DateTime<Utc>,
        duration: Duration,
    ) -> Option<Self> {
        let expires_at = created_at.checked_add_signed(duration)?;
        Some(Self {
            id: HoldId::new(),
            claimant,
            created_at,
            expires_at: HoldExpiry::new(expires_at),
        })
    }

    /// Whether the hold is still valid at `now`
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.expires_at.is_expired(now)
    }

    /// Whole seconds left before expiry, zero once expired
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from(self.expires_at.remaining(now).num_seconds()).unwrap_or(0)
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Code printed on a completed ticket, e.g. `#142305ANA`.
///
/// Built from the completion time (`HHMMSS`) and the first three characters of
/// the claimant's name, uppercased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketCode(String);

impl TicketCode {
    /// Issues the code for `claimant` completing at `at`
    #[must_use]
    pub fn issue(claimant: &ClaimantId, at: DateTime<Utc>) -> Self {
        let prefix: String = claimant.as_str().chars().take(3).collect();
        Self(format!("#{}{}", at.format("%H%M%S"), prefix.to_uppercase()))
    }

    /// The code as printed on the ticket
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Workflow state
// ============================================================================

/// Per-claimant workflow state (the coordinator's state machine)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimantState {
    /// Never joined, evicted, or reset
    NotQueued,
    /// In the queue, not yet holding a ticket
    Waiting,
    /// At the head of the queue, holding a ticket until the hold expires
    Reserved(HoldId),
    /// Paid in time; the ticket is theirs
    Completed(TicketCode),
    /// The hold lapsed before a successful payment
    Expired,
}

impl ClaimantState {
    /// Terminal states are absorbing until an explicit reset
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Expired)
    }

    /// Waiting or Reserved: the claimant occupies a queue slot
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Waiting | Self::Reserved(_))
    }
}

/// Snapshot of a claimant's progress, for re-rendering and polling
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimantStatus {
    /// Not in the workflow
    NotQueued,
    /// Queued behind `ahead` other claimants
    Waiting {
        /// Claimants ahead in the queue
        ahead: usize,
    },
    /// Holding a ticket
    Reserved {
        /// When the hold lapses
        expires_at: DateTime<Utc>,
        /// Whole seconds left on the hold
        remaining_seconds: u64,
    },
    /// Purchase completed
    Completed {
        /// Code printed on the ticket
        ticket: TicketCode,
    },
    /// The hold lapsed
    Expired,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 21, h, m, s).unwrap()
    }

    #[test]
    fn claimant_names_are_trimmed() {
        let id = ClaimantId::new("  Ana Maria ").unwrap();
        assert_eq!(id.as_str(), "Ana Maria");
        assert_eq!(ClaimantId::new("   "), Err(ClaimantIdError::Empty));
    }

    #[test]
    fn overly_long_names_are_rejected() {
        let name = "x".repeat(ClaimantId::MAX_LEN + 1);
        assert!(matches!(
            ClaimantId::new(name),
            Err(ClaimantIdError::TooLong { .. })
        ));
    }

    #[test]
    fn claimant_id_deserialization_validates() {
        let ok: ClaimantId = serde_json::from_str("\"Bruno\"").unwrap();
        assert_eq!(ok.as_str(), "Bruno");
        assert!(serde_json::from_str::<ClaimantId>("\"  \"").is_err());
    }

    #[test]
    fn hold_is_valid_at_its_expiry_instant() {
        let hold = Hold::new(
            ClaimantId::new("Ana").unwrap(),
            at(18, 0, 0),
            Duration::seconds(600),
        )
        .unwrap();

        assert!(hold.is_active(at(18, 10, 0)));
        assert!(!hold.is_active(at(18, 10, 1)));
        assert_eq!(hold.remaining_secs(at(18, 0, 0)), 600);
        assert_eq!(hold.remaining_secs(at(19, 0, 0)), 0);
    }

    #[test]
    fn hold_past_the_calendar_range_is_not_created() {
        let ana = ClaimantId::new("Ana").unwrap();

        assert!(Hold::new(ana.clone(), at(18, 0, 0), Duration::MAX).is_none());
        assert!(Hold::new(ana, at(18, 0, 0), Duration::seconds(10_000_000_000_000)).is_none());
    }

    #[test]
    fn ticket_code_uses_time_and_name_prefix() {
        let code = TicketCode::issue(&ClaimantId::new("ana").unwrap(), at(14, 23, 5));
        assert_eq!(code.as_str(), "#142305ANA");

        let short = TicketCode::issue(&ClaimantId::new("Jo").unwrap(), at(9, 5, 0));
        assert_eq!(short.as_str(), "#090500JO");
    }

    #[test]
    fn terminal_states() {
        assert!(ClaimantState::Expired.is_terminal());
        assert!(ClaimantState::Completed(TicketCode("#000000ABC".into())).is_terminal());
        assert!(!ClaimantState::Reserved(HoldId::new()).is_terminal());
        assert!(ClaimantState::Waiting.is_active());
    }
}
