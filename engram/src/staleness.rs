//! Staleness and revalidation reporting for the `check` surface.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use engram_core::errors::EngramResult;
use engram_core::memory::ConfidenceTier;
use engram_decay::DecayEngine;

use crate::engine::Engram;

/// One object in need of attention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleObject {
    pub id: String,
    pub content: String,
    pub tier: ConfidenceTier,
    /// Days since the last verification, if any ever happened.
    pub days_since_verified: Option<i64>,
    /// Current decayed strength.
    pub strength: f64,
    /// Decayed below the archival threshold.
    pub archivable: bool,
}

/// The full staleness report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StalenessReport {
    /// Active objects never verified or verified outside the window.
    pub needs_verification: Vec<StaleObject>,
    /// Active objects whose decayed strength marks them archivable.
    pub archivable: Vec<StaleObject>,
}

/// Scan active objects for staleness: verification overdue or strength
/// decayed to the floor region.
pub fn staleness_report(engine: &Engram) -> EngramResult<StalenessReport> {
    let decay = DecayEngine::default();
    let now = Utc::now();
    let window_days = engram_core::constants::VERIFICATION_WINDOW_DAYS;

    let mut report = StalenessReport::default();
    for object in engine.store().list_active()? {
        let days_since_verified = object.last_verified_at.map(|t| (now - t).num_days());
        let strength = decay.decayed_strength(&object, now).value();
        let archivable = decay.is_archivable(&object, now);

        let stale = StaleObject {
            id: object.id.clone(),
            content: object.content.clone(),
            tier: object.confidence_tier_at(now),
            days_since_verified,
            strength,
            archivable,
        };

        let verification_overdue = match days_since_verified {
            Some(days) => days > window_days,
            None => true,
        };
        if archivable {
            report.archivable.push(stale);
        } else if verification_overdue {
            report.needs_verification.push(stale);
        }
    }

    Ok(report)
}
