/// Number of recently loaded symbols remembered by the service
pub const SYMBOL_HISTORY_SIZE: usize = 5;

/// Default row count for stored bar reads
pub const DEFAULT_STORED_BARS_LIMIT: usize = 30;

/// Upper bound for stored bar reads
pub const MAX_STORED_BARS_LIMIT: usize = 1000;
