//! Profiles used across test suites.

use guestlist_core::types::{GuestProfile, PreselectionProfile};

/// Ana from company X, referred by Bruno
#[must_use]
pub fn ana() -> GuestProfile {
    GuestProfile {
        name: "Ana".to_string(),
        email: "ana@x.com".to_string(),
        phone: "11999990000".to_string(),
        company: "X".to_string(),
        role: "Eng".to_string(),
        referrer: "Bruno".to_string(),
    }
}

/// A distinct guest profile per `n` (unique name, email and phone)
#[must_use]
pub fn guest_profile(n: u32) -> GuestProfile {
    GuestProfile {
        name: format!("Guest {n:03}"),
        email: format!("guest{n}@example.com"),
        phone: format!("1198{n:07}"),
        company: "Acme".to_string(),
        role: "Founder".to_string(),
        referrer: "Bruno".to_string(),
    }
}

/// Carla, a candidate without email
#[must_use]
pub fn carla() -> PreselectionProfile {
    PreselectionProfile {
        name: "Carla".to_string(),
        phone: "(11) 98888-7777".to_string(),
        company: "Z".to_string(),
        role: "CTO".to_string(),
        email: None,
    }
}

/// A distinct preselection profile per `n`
#[must_use]
pub fn preselection_profile(n: u32) -> PreselectionProfile {
    PreselectionProfile {
        name: format!("Candidate {n:03}"),
        phone: format!("1197{n:07}"),
        company: "Initech".to_string(),
        role: "CEO".to_string(),
        email: Some(format!("candidate{n}@example.com")),
    }
}
