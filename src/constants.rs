pub mod reset {

    /// Random bytes per reset token (rendered as twice as many hex chars).
    pub const TOKEN_BYTES: usize = 15;

    pub const DEFAULT_TTL_MINUTES: i64 = 10;

    pub const MAX_TTL_MINUTES: i64 = 24 * 60;

    pub const DEFAULT_MAX_REQUESTS: u32 = 3;

    pub const DEFAULT_WINDOW_SECONDS: u64 = 15 * 60;
}

pub mod limits {

    pub const MAX_RECIPE_NAME_LEN: usize = 45;

    pub const MAX_COMMENT_LEN: usize = 10_000;

    pub const MIN_PASSWORD_LEN: usize = 4;
}

pub mod session {

    pub const USER_KEY: &str = "user";
}
