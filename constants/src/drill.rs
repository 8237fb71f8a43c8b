/// Maximum number of bores one drill site can run before it is exhausted
pub const MAX_BORES: u32 = 5;

/// Depth advanced by each successive bore (metres)
pub const DEPTH_PER_BORE: f32 = 2.0;

/// Settle phase between accepting a bore command and cutting the core (seconds)
pub const BORE_SETTLE_SECONDS: f32 = 2.0;

/// Radius of the drilling cylinder (metres)
pub const DRILL_RADIUS: f32 = 0.1;

/// Radius of the sample ring laid out around a drill site (metres)
pub const SAMPLE_RING_RADIUS: f32 = 2.5;

/// Height above local ground at which finished samples hover (metres)
pub const SAMPLE_ELEVATION: f32 = 3.0;

/// Minimum clearance between adjacent ring slots (metres)
pub const SAMPLE_SPACING: f32 = 0.8;

/// Maximum distance from which a player can command a placed site (metres)
pub const INTERACTION_RANGE: f32 = 3.0;

/// Segments thinner than this are dropped during sample reconstruction (metres)
pub const MIN_SEGMENT_THICKNESS: f32 = 0.01;

/// Display radius for rendered core-sample cylinders (metres)
pub const SAMPLE_DISPLAY_RADIUS: f32 = 0.3;

/// Vertical scale applied to rendered core-sample cylinders
pub const SAMPLE_DISPLAY_HEIGHT_SCALE: f32 = 0.5;
