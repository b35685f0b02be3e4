//! Aid contributions - secondary checks that boost another player's attempt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::check::DegreeOfSuccess;
use crate::ids::{CheckId, PlayerId};

/// Proficiency rank of the aiding actor's skill. Higher ranks grant a
/// larger bonus on a critically successful aid check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProficiencyRank {
    Untrained,
    Trained,
    Expert,
    Master,
    Legendary,
}

impl ProficiencyRank {
    pub fn name(&self) -> &'static str {
        match self {
            ProficiencyRank::Untrained => "untrained",
            ProficiencyRank::Trained => "trained",
            ProficiencyRank::Expert => "expert",
            ProficiencyRank::Master => "master",
            ProficiencyRank::Legendary => "legendary",
        }
    }
}

/// One player's pending aid toward another player's check.
///
/// At most one contribution per (check, contributor) pair is held at a
/// time; a newer aid attempt by the same contributor replaces the old one.
/// The bonus is fixed at creation from the aid check's outcome and the
/// contributor's proficiency rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AidContribution {
    contributor: PlayerId,
    contributor_name: String,
    check_id: CheckId,
    skill: String,
    rank: ProficiencyRank,
    outcome: DegreeOfSuccess,
    bonus: i32,
    created_at: DateTime<Utc>,
}

impl AidContribution {
    pub fn new(
        contributor: PlayerId,
        contributor_name: impl Into<String>,
        check_id: CheckId,
        skill: impl Into<String>,
        rank: ProficiencyRank,
        outcome: DegreeOfSuccess,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            contributor,
            contributor_name: contributor_name.into(),
            check_id,
            skill: skill.into(),
            rank,
            outcome,
            bonus: Self::bonus_for(outcome, rank),
            created_at,
        }
    }

    /// Circumstance bonus granted by an aid outcome at a given rank:
    /// +2 on a critical success (+3 master, +4 legendary), +1 on a
    /// success, nothing on a failure, -1 on a critical failure.
    pub fn bonus_for(outcome: DegreeOfSuccess, rank: ProficiencyRank) -> i32 {
        match outcome {
            DegreeOfSuccess::CriticalSuccess => match rank {
                ProficiencyRank::Master => 3,
                ProficiencyRank::Legendary => 4,
                _ => 2,
            },
            DegreeOfSuccess::Success => 1,
            DegreeOfSuccess::Failure => 0,
            DegreeOfSuccess::CriticalFailure => -1,
        }
    }

    // === Accessors ===

    pub fn contributor(&self) -> PlayerId {
        self.contributor
    }

    pub fn contributor_name(&self) -> &str {
        &self.contributor_name
    }

    pub fn check_id(&self) -> &CheckId {
        &self.check_id
    }

    pub fn skill(&self) -> &str {
        &self.skill
    }

    pub fn rank(&self) -> ProficiencyRank {
        self.rank
    }

    pub fn outcome(&self) -> DegreeOfSuccess {
        self.outcome
    }

    pub fn bonus(&self) -> i32 {
        self.bonus
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Human-readable label, used both as a roll modifier label and as a
    /// manual effect line when the aid lands after the target has rolled.
    pub fn label(&self) -> String {
        format!(
            "Aid from {} ({}): {:+}",
            self.contributor_name, self.skill, self.bonus
        )
    }
}
