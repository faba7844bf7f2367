//! Prelude module - common imports for takeoff users
//!
//! ```rust
//! use takeoff::prelude::*;
//! ```

pub use crate::{
    builtin_groups,
    // Budget types
    Budget,
    BudgetItem,
    // Main types
    CalculatedItem,
    CalculationGroup,
    // Import types
    CandidateStatus,
    // Error types
    Error,
    Formula,
    FormulaOutcome,
    GroupCollection,
    // Extension traits
    GroupResolveExt,
    ImportCandidate,
    ImportError,
    ImportSelection,
    InputState,
    // Resolution types
    Resolution,
    ResolutionStrategy,
    ResolveOptions,
    Result,
    Unresolved,
    Variable,
};
