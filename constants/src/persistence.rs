/// Polls of missing collaborators before a scene restore gives up
pub const RESTORE_MAX_ATTEMPTS: u32 = 20;

/// Interval between restore polls while collaborators are absent (seconds)
pub const RESTORE_POLL_SECONDS: f32 = 0.2;

/// Maximum samples the player inventory will hold
pub const MAX_INVENTORY_SAMPLES: usize = 20;

/// On-disk location of the cross-session save file
pub const SAVE_FILE_PATH: &str = "drill_save.json";
