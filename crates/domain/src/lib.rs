pub mod aid;
pub mod catalog;
pub mod check;
pub mod error;
pub mod events;
pub mod ids;
pub mod kingdom;
pub mod phase;
pub mod resources;

pub use aid::{AidContribution, ProficiencyRank};
pub use catalog::{CheckDefinition, CheckOutcomes, OutcomeSpec, Requirement};
pub use check::{
    CheckInstance, CheckKind, CheckMetadata, ComplexAction, DegreeOfSuccess, InstanceStatus,
    NumericModifier, ResolutionData, RollBreakdown, SelectionKind, SelectionValue,
};
pub use error::DomainError;
pub use events::KingdomEvent;

// Re-export ID types
pub use ids::{ArmyId, CheckId, CheckInstanceId, KingdomId, PlayerId, SettlementId};

pub use kingdom::{ActionLogEntry, KingdomState, PhaseAdvance, Settlement};
pub use phase::{Phase, PhaseState, PhaseStep, StepTemplate};
pub use resources::{Resource, ResourceLedger, ResourceShortfall, FAME_MAX};
