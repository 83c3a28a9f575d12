/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_LITELLM_PROXY_URL: &str = "http://localhost:4000";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 600; // 10 minutes for large model requests
pub const GIT_COMMAND_TIMEOUT_SECS: u64 = 120;

// Turn Loop
// Upper bound on model round-trips per session; a misbehaving model must not
// keep the loop alive forever.
pub const DEFAULT_MAX_TURNS: usize = 24;

// Default Model Configuration
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: usize = 4096;
pub const DEFAULT_TOP_P: f32 = 1.0;

// Git defaults
pub const DEFAULT_REMOTE: &str = "origin";
pub const FALLBACK_SIGNATURE_NAME: &str = "Tiller Agent";
pub const FALLBACK_SIGNATURE_EMAIL: &str = "tiller@agent.local";

/// Base system prompt for every turn. `{system_time}` is substituted at
/// prompt-build time; stage and repository context are appended after it.
pub const BASE_SYSTEM_PROMPT: &str = "\
You are Tiller, an agent that manages Git repositories on the user's behalf. \
You work through the provided tools: clone repositories, inspect and edit \
files, check status, commit, and push. Prefer small, verifiable steps and \
report clearly what you did. When no further tool use is needed, answer in \
plain text without calling tools.
Current time: {system_time}";
