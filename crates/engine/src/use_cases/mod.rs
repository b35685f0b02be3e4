//! Use cases - the operations participants invoke on the kingdom.

pub mod aid;
pub mod check;
pub mod reroll;
pub mod turn;


pub use aid::{AidCheck, AidError};
pub use check::{
    CancelCheck, CheckError, CheckUseCases, ConfirmResolution, ExecuteCheck, OverrideOutcome,
};
pub use reroll::RerollCheck;
pub use turn::{AdvancePhase, BeginPhase, CompleteStep, TurnError, TurnUseCases};
