//! Domain types for the guest lifecycle manager.
//!
//! Identifiers, the three persisted entities (`EventEdition`, `Guest`, `Preselection`),
//! the input shapes accepted by the lifecycle managers, and the pure state-transition
//! rules of a guest. Persistence and side effects live elsewhere; everything here is
//! plain data plus validation.

use crate::error::LifecycleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event edition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditionId(Uuid);

impl EditionId {
    /// Creates a new random `EditionId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EditionId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EditionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a guest
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GuestId(Uuid);

impl GuestId {
    /// Creates a new random `GuestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `GuestId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GuestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a preselection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreselectionId(Uuid);

impl PreselectionId {
    /// Creates a new random `PreselectionId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PreselectionId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PreselectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PreselectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event editions
// ============================================================================

/// A time-boxed instance of the recurring event.
///
/// At most one edition is `active` at any time. An archived edition is never active
/// and always carries `ended_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEdition {
    /// Edition identifier
    pub id: EditionId,
    /// Display name (e.g. `Março 2025`)
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// When the edition started
    pub started_at: DateTime<Utc>,
    /// When the edition was closed (set on archival)
    pub ended_at: Option<DateTime<Utc>>,
    /// Whether this is the current working edition
    pub active: bool,
    /// Whether the edition has been archived
    pub archived: bool,
}

impl EventEdition {
    /// Creates a new active, non-archived edition
    #[must_use]
    pub fn new_active(name: String, description: Option<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: EditionId::new(),
            name,
            description,
            started_at,
            ended_at: None,
            active: true,
            archived: false,
        }
    }
}

/// An edition together with the size of its guest list and preselection pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionSummary {
    /// The edition itself
    #[serde(flatten)]
    pub edition: EventEdition,
    /// Number of guests registered under the edition
    pub guest_count: u64,
    /// Number of preselections registered under the edition
    pub preselection_count: u64,
}

// ============================================================================
// Guests
// ============================================================================

/// Lifecycle status of a guest. Check-in is tracked by `checked_in_at`, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestStatus {
    /// Invitation sent, not yet confirmed
    Invited,
    /// Attendance confirmed
    Confirmed,
}

impl GuestStatus {
    /// Storage/wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invited => "invited",
            Self::Confirmed => "confirmed",
        }
    }

    /// Parses the storage representation
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "invited" => Some(Self::Invited),
            "confirmed" => Some(Self::Confirmed),
            _ => None,
        }
    }
}

/// Profile details captured when confirming attendance.
///
/// Every field is optional. In an update, `None` means "leave as is".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enrichment {
    /// Name the guest prefers to be called by
    pub preferred_name: Option<String>,
    /// Professional profile link (e.g. `LinkedIn`)
    pub profile_url: Option<String>,
    /// Company size band
    pub company_size: Option<String>,
    /// Industry
    pub industry: Option<String>,
    /// What the guest's company sells
    pub product_description: Option<String>,
    /// Revenue band
    pub revenue_band: Option<String>,
    /// Business model (B2B, B2C, ...)
    pub business_model: Option<String>,
}

impl Enrichment {
    /// Overlays the fields present in `update`, keeping the current value elsewhere
    pub fn merge(&mut self, update: Self) {
        fn overlay(current: &mut Option<String>, incoming: Option<String>) {
            if let Some(value) = incoming {
                *current = Some(value);
            }
        }

        overlay(&mut self.preferred_name, update.preferred_name);
        overlay(&mut self.profile_url, update.profile_url);
        overlay(&mut self.company_size, update.company_size);
        overlay(&mut self.industry, update.industry);
        overlay(&mut self.product_description, update.product_description);
        overlay(&mut self.revenue_band, update.revenue_band);
        overlay(&mut self.business_model, update.business_model);
    }
}

/// Input for inviting a guest. Absent fields read as blank and are caught by
/// `validate`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestProfile {
    /// Full name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Phone number, masked or not (unique once unmasked)
    pub phone: String,
    /// Company
    pub company: String,
    /// Role at the company
    pub role: String,
    /// Who referred the guest; used as the invite link attribution tag
    pub referrer: String,
}

/// Partial update applied by `enrich_on_confirm`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestUpdate {
    /// New full name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New phone
    pub phone: Option<String>,
    /// New company
    pub company: Option<String>,
    /// New role
    pub role: Option<String>,
    /// Enrichment fields to overlay
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

/// An invited participant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    /// Guest identifier
    pub id: GuestId,
    /// Edition the guest was invited to; never changes
    pub edition_id: EditionId,
    /// Full name
    pub name: String,
    /// Email address (lower-cased)
    pub email: String,
    /// Phone number, digits only
    pub phone: String,
    /// Company
    pub company: String,
    /// Role at the company
    pub role: String,
    /// Referrer tag
    pub referrer: String,
    /// Trackable invitation link
    pub invite_url: String,
    /// Lifecycle status
    pub status: GuestStatus,
    /// When the guest was invited
    pub registered_at: DateTime<Utc>,
    /// When the guest confirmed
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the guest was checked in at the venue
    pub checked_in_at: Option<DateTime<Utc>>,
    /// Staff member who performed the check-in
    pub checked_in_by: Option<String>,
    /// Details captured at confirmation
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl Guest {
    /// Builds a freshly invited guest.
    ///
    /// The profile is expected to be normalized already (see [`GuestProfile::validate`]).
    #[must_use]
    pub fn invited(
        edition_id: EditionId,
        profile: GuestProfile,
        invite_url: String,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: GuestId::new(),
            edition_id,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            company: profile.company,
            role: profile.role,
            referrer: profile.referrer,
            invite_url,
            status: GuestStatus::Invited,
            registered_at,
            confirmed_at: None,
            checked_in_at: None,
            checked_in_by: None,
            enrichment: Enrichment::default(),
        }
    }

    /// Whether the guest has confirmed attendance
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Whether the guest has been checked in
    #[must_use]
    pub const fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some()
    }

    /// Moves the guest to confirmed.
    ///
    /// Returns `true` on the invited → confirmed edge and `false` when the guest was
    /// already confirmed (nothing changes in that case).
    pub fn confirm(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_confirmed() {
            return false;
        }
        self.status = GuestStatus::Confirmed;
        self.confirmed_at = Some(at);
        true
    }

    /// Checks that a check-in is allowed from the current state
    ///
    /// # Errors
    ///
    /// - `Precondition` if the guest has not confirmed
    /// - `Conflict` if the guest is already checked in
    pub fn ensure_can_check_in(&self) -> Result<(), LifecycleError> {
        if !self.is_confirmed() {
            return Err(LifecycleError::Precondition(format!(
                "guest {} has not confirmed attendance",
                self.id
            )));
        }
        if self.is_checked_in() {
            return Err(LifecycleError::Conflict(format!(
                "guest {} is already checked in",
                self.id
            )));
        }
        Ok(())
    }

    /// Records a check-in
    ///
    /// # Errors
    ///
    /// See [`Guest::ensure_can_check_in`]
    pub fn check_in(&mut self, at: DateTime<Utc>, by: String) -> Result<(), LifecycleError> {
        self.ensure_can_check_in()?;
        self.checked_in_at = Some(at);
        self.checked_in_by = Some(by);
        Ok(())
    }

    /// Reverts a check-in back to confirmed
    ///
    /// # Errors
    ///
    /// `Precondition` if the guest is not currently checked in
    pub fn undo_check_in(&mut self) -> Result<(), LifecycleError> {
        if !self.is_checked_in() {
            return Err(LifecycleError::Precondition(format!(
                "guest {} is not checked in",
                self.id
            )));
        }
        self.checked_in_at = None;
        self.checked_in_by = None;
        Ok(())
    }

    /// Applies a partial profile update. Lifecycle fields are never touched.
    ///
    /// # Errors
    ///
    /// `Validation` if a provided identity field is blank
    pub fn apply_update(&mut self, update: GuestUpdate) -> Result<(), LifecycleError> {
        if let Some(name) = update.name {
            self.name = required("name", &name)?;
        }
        if let Some(email) = update.email {
            self.email = normalize_email(&required("email", &email)?);
        }
        if let Some(phone) = update.phone {
            self.phone = required_phone(&phone)?;
        }
        if let Some(company) = update.company {
            self.company = required("company", &company)?;
        }
        if let Some(role) = update.role {
            self.role = required("role", &role)?;
        }
        self.enrichment.merge(update.enrichment);
        Ok(())
    }

    /// Case-insensitive substring match over name, email, phone and company
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.name, &self.email, &self.phone, &self.company]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl GuestProfile {
    /// Trims every field, lower-cases the email and strips the phone mask.
    ///
    /// # Errors
    ///
    /// `Validation` naming the first blank field
    pub fn validate(self) -> Result<Self, LifecycleError> {
        Ok(Self {
            name: required("name", &self.name)?,
            email: normalize_email(&required("email", &self.email)?),
            phone: required_phone(&self.phone)?,
            company: required("company", &self.company)?,
            role: required("role", &self.role)?,
            referrer: required("referrer", &self.referrer)?,
        })
    }
}

/// How `confirm` locates a guest: by id when known, by phone otherwise
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestLookup {
    /// Look up by identifier
    Id(GuestId),
    /// Look up by phone (mask is ignored)
    Phone(String),
}

impl GuestLookup {
    /// Picks the id when present, the phone otherwise.
    ///
    /// # Errors
    ///
    /// `Validation` if neither is given
    pub fn from_parts(id: Option<GuestId>, phone: Option<String>) -> Result<Self, LifecycleError> {
        match (id, phone) {
            (Some(id), _) => Ok(Self::Id(id)),
            (None, Some(phone)) if !phone.trim().is_empty() => Ok(Self::Phone(phone)),
            _ => Err(LifecycleError::Validation(
                "guest id or phone is required".to_string(),
            )),
        }
    }
}

/// Check-in progress of the active edition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinStats {
    /// Guests invited (any status)
    pub invited: u64,
    /// Guests that confirmed
    pub confirmed: u64,
    /// Guests checked in
    pub checked_in: u64,
}

// ============================================================================
// Preselections
// ============================================================================

/// Status of a preselection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreselectionStatus {
    /// Candidate not yet invited
    Pending,
    /// Converted into a guest; immutable from here on
    Promoted,
}

impl PreselectionStatus {
    /// Storage/wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Promoted => "promoted",
        }
    }

    /// Parses the storage representation
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "promoted" => Some(Self::Promoted),
            _ => None,
        }
    }
}

/// Input for adding a candidate to the preselection pool
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreselectionProfile {
    /// Full name
    pub name: String,
    /// Phone number (unique once unmasked)
    pub phone: String,
    /// Company
    pub company: String,
    /// Role at the company
    pub role: String,
    /// Optional email
    pub email: Option<String>,
}

impl PreselectionProfile {
    /// Trims fields, strips the phone mask and drops a blank email.
    ///
    /// # Errors
    ///
    /// `Validation` naming the first blank required field
    pub fn validate(self) -> Result<Self, LifecycleError> {
        Ok(Self {
            name: required("name", &self.name)?,
            phone: required_phone(&self.phone)?,
            company: required("company", &self.company)?,
            role: required("role", &self.role)?,
            email: self
                .email
                .map(|email| normalize_email(&email))
                .filter(|email| !email.is_empty()),
        })
    }
}

/// A candidate contact not yet formally invited
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preselection {
    /// Preselection identifier
    pub id: PreselectionId,
    /// Edition the candidate belongs to
    pub edition_id: EditionId,
    /// Full name
    pub name: String,
    /// Phone number, digits only
    pub phone: String,
    /// Company
    pub company: String,
    /// Role at the company
    pub role: String,
    /// Optional email
    pub email: Option<String>,
    /// Pool status
    pub status: PreselectionStatus,
    /// When the candidate was added
    pub created_at: DateTime<Utc>,
    /// When the candidate was promoted
    pub promoted_at: Option<DateTime<Utc>>,
}

impl Preselection {
    /// Builds a pending preselection from a validated profile
    #[must_use]
    pub fn pending(edition_id: EditionId, profile: PreselectionProfile, created_at: DateTime<Utc>) -> Self {
        Self {
            id: PreselectionId::new(),
            edition_id,
            name: profile.name,
            phone: profile.phone,
            company: profile.company,
            role: profile.role,
            email: profile.email,
            status: PreselectionStatus::Pending,
            created_at,
            promoted_at: None,
        }
    }

    /// Whether the preselection has already become a guest
    #[must_use]
    pub fn is_promoted(&self) -> bool {
        self.status == PreselectionStatus::Promoted
    }

    /// Token identifying the candidate in the invite link: email when known, phone otherwise
    #[must_use]
    pub fn invite_token(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.phone)
    }

    /// Guest profile carried over on promotion.
    ///
    /// A candidate without email gets a placeholder derived from the phone so the
    /// unique email constraint still holds.
    #[must_use]
    pub fn to_guest_profile(&self, referrer: String) -> GuestProfile {
        GuestProfile {
            name: self.name.clone(),
            email: self
                .email
                .clone()
                .unwrap_or_else(|| format!("{}@preselection.invalid", self.phone)),
            phone: self.phone.clone(),
            company: self.company.clone(),
            role: self.role.clone(),
            referrer,
        }
    }
}

// ============================================================================
// Field helpers
// ============================================================================

/// Trims `value`, failing with a validation error naming `field` when blank
///
/// # Errors
///
/// `Validation` if the trimmed value is empty
pub fn required(field: &str, value: &str) -> Result<String, LifecycleError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn required_phone(value: &str) -> Result<String, LifecycleError> {
    let digits = crate::phone::remove_phone_mask(value);
    if digits.is_empty() {
        return Err(LifecycleError::Validation("phone is required".to_string()));
    }
    Ok(digits)
}

fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
