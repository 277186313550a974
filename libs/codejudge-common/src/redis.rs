/// Redis key semantics for the progress ledger
/// Keeps every reader and writer on the same deterministic key layout

pub const PROFILE_PREFIX: &str = "codejudge:profile";
pub const SOLVED_PREFIX: &str = "codejudge:solved";
pub const TOPICS_PREFIX: &str = "codejudge:topics";

/// Profile hash (counters, dates, display name) for a user
pub fn profile_key(uid: &str) -> String {
    format!("{}:{}", PROFILE_PREFIX, uid)
}

/// Set of solved problem ids for a user
pub fn solved_key(uid: &str) -> String {
    format!("{}:{}", SOLVED_PREFIX, uid)
}

/// Hash of topic -> number of solved problems for a user
pub fn topics_key(uid: &str) -> String {
    format!("{}:{}", TOPICS_PREFIX, uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_key_format() {
        assert_eq!(profile_key("u1"), "codejudge:profile:u1");
    }

    #[test]
    fn test_solved_key_deterministic() {
        let key1 = solved_key("abc");
        let key2 = solved_key("abc");
        assert_eq!(key1, key2);
        assert!(key1.starts_with("codejudge:solved:"));
        assert_ne!(solved_key("abc"), profile_key("abc"));
    }

    #[test]
    fn test_topics_key_distinct_per_record() {
        assert_eq!(topics_key("u1"), "codejudge:topics:u1");
        assert_ne!(topics_key("u1"), profile_key("u1"));
        assert_ne!(topics_key("u1"), solved_key("u1"));
    }
}
