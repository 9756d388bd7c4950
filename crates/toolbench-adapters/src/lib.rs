//! Provider adapters
//!
//! [`ProviderProfile`] carries what every backend variant shares (name,
//! credential, models, pricing). [`SimulatedProvider`] drives scripted
//! sessions against a scenario's real tool service, for offline runs and
//! tests.

pub mod profile;
pub mod simulator;

pub use profile::{BackendKind, Credential, ProviderProfile};
pub use simulator::{
    ModelScript, SimulatedProvider, SimulatedSession, SimulationMode, ToolInvocation, TrialPlan,
    Turn, TurnOutcome,
};
