/// Height above a query position from which the sky probe is cast (metres)
pub const SKY_PROBE_RISE: f32 = 10.0;

/// Maximum distance of the sky probe when locating the surface (metres)
pub const SKY_PROBE_RANGE: f32 = 15.0;

/// Height above a query position from which the local footprint probe is cast (metres)
pub const LOCAL_PROBE_RISE: f32 = 1.0;

/// Maximum distance of the local footprint probe (metres)
pub const LOCAL_PROBE_RANGE: f32 = 5.0;

/// Sky and local probes disagreeing by more than this prefer the local probe (metres)
pub const SURFACE_AGREEMENT_TOLERANCE: f32 = 0.5;

/// Direction components below this magnitude are treated as parallel to a slab
pub const RAY_EPSILON: f32 = 1e-6;

/// Name fragments marking volumes that belong to drilling apparatus, not strata
pub const APPARATUS_NAME_TAGS: &[&str] = &["drill", "tower", "rig"];

/// Display name used for segments cut from unidentified ground
pub const DEFAULT_SURFACE_NAME: &str = "unclassified";
