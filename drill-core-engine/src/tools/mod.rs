//! Player-facing drilling tools and their coordination.
//!
//! The `ToolManager` resource maintains exclusive tool selection:
//! - Only one tool can be equipped at a time
//! - Tools are equipped via keyboard shortcuts or a restored scene snapshot
//! - The equipped tool id travels through the persistence store
//!
//! ### Drill Site Flow
//!
//! ```text
//! Keyboard Input
//!   └─> BeginBoreEvent
//!       └─> DrillSite::begin_bore()        (rejected while boring / exhausted)
//!           └─> settle timer elapses
//!               ├─> layer detection over the bore's depth window
//!               ├─> sample reconstruction at the ring slot
//!               └─> DepthRecord appended, site back to idle
//! ```
//!
//! Recalling a site destroys it together with every sample it still owns;
//! the command is rejected while a bore is in flight.

/// Drill-site state machine and the bore execution pipeline.
pub mod drill_site;

/// Visual spawning for finished core samples.
pub mod sample_display;

/// Equipped-tool tracking shared by the shell and the persistence store.
pub mod tool_manager;
