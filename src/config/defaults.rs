pub fn default_version() -> u32 {
    1
}

pub fn default_reruns() -> usize {
    5
}

pub fn default_vote_concurrency() -> usize {
    5
}

pub fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

pub fn default_timeout_sec() -> u64 {
    120
}

pub fn default_model() -> String {
    "gpt-4o-2024-08-06".to_string()
}

pub fn default_true() -> bool {
    true
}
