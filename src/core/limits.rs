/*!
 * Scheduler Limits and Constants
 *
 * Environment variable names and fallback values shared by the config layer,
 * the tracer and the demo binary.
 */

// =============================================================================
// CAPACITY
// =============================================================================

/// Worker budget used when hardware parallelism cannot be queried
pub const FALLBACK_CAPACITY: usize = 1;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Worker budget override
pub const ENV_CAPACITY: &str = "SIM_SCHEDULER_CAPACITY";

/// JSON log output toggle
pub const ENV_TRACE_JSON: &str = "SIM_TRACE_JSON";

/// Number of trials the demo binary registers
pub const ENV_DEMO_TRIALS: &str = "SIM_DEMO_TRIALS";

/// Steps each demo trial runs before finishing
pub const ENV_DEMO_STEPS: &str = "SIM_DEMO_STEPS";

// =============================================================================
// DEMO DEFAULTS
// =============================================================================

/// Default demo trial count
pub const DEFAULT_DEMO_TRIALS: usize = 8;

/// Default demo trial length
pub const DEFAULT_DEMO_STEPS: u64 = 200;
