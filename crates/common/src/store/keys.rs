// search view
pub const SEARCH_TYPE: &str = "searchType";
pub const SEARCH_MODE: &str = "searchMode";
pub const SEARCH_TERM: &str = "searchTerm";
pub const FILE_PATH: &str = "filePath";
pub const SCAN_LEVEL: &str = "scanLevel";
pub const SEARCH_FOUND: &str = "searchFound";

// scan monitor
pub const CURRENT_RUN_ID: &str = "currentRunId";
pub const SCAN_STATUS: &str = "scanStatus";
pub const SCAN_STATUS_MESSAGE: &str = "scanStatusMessage";
pub const SCAN_RESULTS: &str = "scanResults";

// session markers
pub const IS_LOGGED_IN: &str = "isLoggedIn";
pub const SESSION_ID: &str = "sessionId";
pub const CURRENT_VIEW: &str = "currentView";
pub const USERNAME: &str = "username";

/// Everything a search (and the scan it started) leaves behind
pub const SEARCH_KEYS: [&str; 9] = [
    SEARCH_TYPE,
    SEARCH_TERM,
    FILE_PATH,
    SCAN_LEVEL,
    CURRENT_RUN_ID,
    SCAN_STATUS,
    SCAN_STATUS_MESSAGE,
    SCAN_RESULTS,
    SEARCH_FOUND,
];

pub const SESSION_KEYS: [&str; 4] = [IS_LOGGED_IN, SESSION_ID, CURRENT_VIEW, USERNAME];
