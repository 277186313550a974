/// Progress Ledger - Per-User Solved / Attempt Tracking
///
/// **Core Responsibility:**
/// Record the two events an evaluation produces: "a Submit happened"
/// and "this problem is now solved", and derive profile statistics.
///
/// **Critical Properties:**
/// - `mark_solved` is idempotent: it reports `true` only the first time
///   a problem is solved by a user
/// - Knows nothing about the judge service or test cases
///
/// **Backends:**
/// - `MemoryProgressStore`: per-process, lost on restart
/// - `RedisProgressStore`: persistent, counters kept server-side so
///   concurrent writers from several processes never overwrite each other
use crate::catalog::ProblemCatalog;
use crate::redis::{profile_key, solved_key, topics_key};
use crate::session::User;
use crate::types::{Difficulty, Problem};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt profile field {field}: {value:?}")]
    Corrupt { field: String, value: String },
}

pub type ProgressResult<T> = Result<T, ProgressError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub solved_problems: BTreeSet<String>,
    pub topics_solved: BTreeMap<String, u32>,
    pub total_submissions: u32,
    pub accepted_submissions: u32,
    pub current_streak: u32,
    pub max_streak: u32,
    pub join_date: NaiveDate,
    pub last_active: NaiveDate,
    pub last_solved: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DifficultyProgress {
    pub difficulty: Difficulty,
    pub solved: usize,
    pub total: usize,
}

impl UserProfile {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            display_name: None,
            solved_problems: BTreeSet::new(),
            topics_solved: BTreeMap::new(),
            total_submissions: 0,
            accepted_submissions: 0,
            current_streak: 0,
            max_streak: 0,
            join_date: today,
            last_active: today,
            last_solved: None,
        }
    }

    /// Percentage of Submit runs that passed every test case
    pub fn accuracy(&self) -> f64 {
        if self.total_submissions == 0 {
            return 0.0;
        }
        self.accepted_submissions as f64 / self.total_submissions as f64 * 100.0
    }

    pub fn solved_count(&self) -> usize {
        self.solved_problems.len()
    }

    pub fn record_attempt(&mut self, accepted: bool, now: DateTime<Utc>) {
        self.total_submissions += 1;
        if accepted {
            self.accepted_submissions += 1;
        }
        self.last_active = now.date_naive();
    }

    /// Returns `true` when the problem was not solved before
    pub fn mark_solved(&mut self, problem: &Problem, now: DateTime<Utc>) -> bool {
        if !self.solved_problems.insert(problem.id.clone()) {
            return false;
        }

        for topic in &problem.categories {
            *self.topics_solved.entry(topic.clone()).or_insert(0) += 1;
        }

        let today = now.date_naive();
        self.current_streak = match self.last_solved {
            Some(day) if day == today => self.current_streak.max(1),
            Some(day) if day.succ_opt() == Some(today) => self.current_streak + 1,
            _ => 1,
        };
        self.max_streak = self.max_streak.max(self.current_streak);
        self.last_solved = Some(today);
        self.last_active = today;
        true
    }

    pub fn difficulty_breakdown(&self, catalog: &ProblemCatalog) -> Vec<DifficultyProgress> {
        [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
            .into_iter()
            .map(|difficulty| DifficultyProgress {
                difficulty,
                solved: catalog
                    .problems()
                    .iter()
                    .filter(|p| p.difficulty == difficulty && self.solved_problems.contains(&p.id))
                    .count(),
                total: catalog.count_by_difficulty(difficulty),
            })
            .collect()
    }
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn profile(&self, user: &User) -> ProgressResult<UserProfile>;

    async fn record_attempt(
        &self,
        user: &User,
        accepted: bool,
        now: DateTime<Utc>,
    ) -> ProgressResult<UserProfile>;

    async fn mark_solved(
        &self,
        user: &User,
        problem: &Problem,
        now: DateTime<Utc>,
    ) -> ProgressResult<bool>;

    async fn set_display_name(&self, user: &User, name: &str) -> ProgressResult<UserProfile>;
}

#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn profile(&self, user: &User) -> ProgressResult<UserProfile> {
        let mut profiles = self.profiles.lock().await;
        Ok(profiles
            .entry(user.uid.clone())
            .or_insert_with(|| UserProfile::new(Utc::now().date_naive()))
            .clone())
    }

    async fn record_attempt(
        &self,
        user: &User,
        accepted: bool,
        now: DateTime<Utc>,
    ) -> ProgressResult<UserProfile> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .entry(user.uid.clone())
            .or_insert_with(|| UserProfile::new(now.date_naive()));
        profile.record_attempt(accepted, now);
        debug!(uid = %user.uid, accepted, total = profile.total_submissions, "Attempt recorded");
        Ok(profile.clone())
    }

    async fn mark_solved(
        &self,
        user: &User,
        problem: &Problem,
        now: DateTime<Utc>,
    ) -> ProgressResult<bool> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .entry(user.uid.clone())
            .or_insert_with(|| UserProfile::new(now.date_naive()));
        let first = profile.mark_solved(problem, now);
        if first {
            info!(uid = %user.uid, problem_id = %problem.id, "Problem solved");
        }
        Ok(first)
    }

    async fn set_display_name(&self, user: &User, name: &str) -> ProgressResult<UserProfile> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .entry(user.uid.clone())
            .or_insert_with(|| UserProfile::new(Utc::now().date_naive()));
        profile.display_name = Some(name.to_string());
        Ok(profile.clone())
    }
}

/// Date fields in the Redis profile hash
const DATE_FORMAT: &str = "%Y-%m-%d";

/// First-solve check, topic counts and streak in one atomic step.
///
/// KEYS: solved set, profile hash, topics hash.
/// ARGV: problem id, today, yesterday, then the problem's topics.
const MARK_SOLVED_SCRIPT: &str = r#"
if redis.call('SADD', KEYS[1], ARGV[1]) == 0 then
    return 0
end
for i = 4, #ARGV do
    redis.call('HINCRBY', KEYS[3], ARGV[i], 1)
end
local last = redis.call('HGET', KEYS[2], 'last_solved')
local streak = tonumber(redis.call('HGET', KEYS[2], 'current_streak') or '0')
if last == ARGV[2] then
    streak = math.max(streak, 1)
elseif last == ARGV[3] then
    streak = streak + 1
else
    streak = 1
end
local best = tonumber(redis.call('HGET', KEYS[2], 'max_streak') or '0')
if streak > best then
    best = streak
end
redis.call('HSETNX', KEYS[2], 'join_date', ARGV[2])
redis.call('HSET', KEYS[2], 'current_streak', streak, 'max_streak', best,
    'last_solved', ARGV[2], 'last_active', ARGV[2])
return 1
"#;

/// Redis-backed ledger
///
/// Keys per user:
/// - `codejudge:profile:{uid}` hash of counters, dates and the display name
/// - `codejudge:solved:{uid}` set of solved problem ids
/// - `codejudge:topics:{uid}` hash of topic -> solved count
///
/// Every write is a single atomic unit on the server (MULTI pipeline or
/// Lua script), so concurrent submits from the same user never lose updates.
#[derive(Clone)]
pub struct RedisProgressStore {
    conn: redis::aio::ConnectionManager,
    solve_script: redis::Script,
}

impl RedisProgressStore {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self {
            conn,
            solve_script: redis::Script::new(MARK_SOLVED_SCRIPT),
        }
    }

    pub async fn connect(url: &str) -> ProgressResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }

    async fn load(&self, user: &User, today: NaiveDate) -> ProgressResult<UserProfile> {
        let mut conn = self.conn.clone();
        let (fields, solved, topics): (HashMap<String, String>, Vec<String>, HashMap<String, u32>) =
            redis::pipe()
                .atomic()
                .hgetall(profile_key(&user.uid))
                .smembers(solved_key(&user.uid))
                .hgetall(topics_key(&user.uid))
                .query_async(&mut conn)
                .await?;
        profile_from_fields(&fields, solved, topics, today)
    }
}

fn count_field(fields: &HashMap<String, String>, name: &str) -> ProgressResult<u32> {
    match fields.get(name) {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| ProgressError::Corrupt {
            field: name.to_string(),
            value: value.clone(),
        }),
    }
}

fn date_field(fields: &HashMap<String, String>, name: &str) -> ProgressResult<Option<NaiveDate>> {
    match fields.get(name) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Some)
            .map_err(|_| ProgressError::Corrupt {
                field: name.to_string(),
                value: value.clone(),
            }),
    }
}

/// Rebuild a profile from the three Redis records of a user
fn profile_from_fields(
    fields: &HashMap<String, String>,
    solved: Vec<String>,
    topics: HashMap<String, u32>,
    today: NaiveDate,
) -> ProgressResult<UserProfile> {
    let join_date = date_field(fields, "join_date")?.unwrap_or(today);
    Ok(UserProfile {
        display_name: fields.get("display_name").cloned(),
        solved_problems: solved.into_iter().collect(),
        topics_solved: topics.into_iter().collect(),
        total_submissions: count_field(fields, "total_submissions")?,
        accepted_submissions: count_field(fields, "accepted_submissions")?,
        current_streak: count_field(fields, "current_streak")?,
        max_streak: count_field(fields, "max_streak")?,
        join_date,
        last_active: date_field(fields, "last_active")?.unwrap_or(join_date),
        last_solved: date_field(fields, "last_solved")?,
    })
}

#[async_trait]
impl ProgressStore for RedisProgressStore {
    async fn profile(&self, user: &User) -> ProgressResult<UserProfile> {
        self.load(user, Utc::now().date_naive()).await
    }

    async fn record_attempt(
        &self,
        user: &User,
        accepted: bool,
        now: DateTime<Utc>,
    ) -> ProgressResult<UserProfile> {
        let mut conn = self.conn.clone();
        let key = profile_key(&user.uid);
        let today = now.date_naive().format(DATE_FORMAT).to_string();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_nx(&key, "join_date", &today)
            .ignore()
            .hincr(&key, "total_submissions", 1)
            .ignore();
        if accepted {
            pipe.hincr(&key, "accepted_submissions", 1).ignore();
        }
        pipe.hset(&key, "last_active", &today).ignore();
        let _: () = pipe.query_async(&mut conn).await?;

        debug!(uid = %user.uid, accepted, "Attempt recorded");
        self.load(user, now.date_naive()).await
    }

    async fn mark_solved(
        &self,
        user: &User,
        problem: &Problem,
        now: DateTime<Utc>,
    ) -> ProgressResult<bool> {
        let mut conn = self.conn.clone();
        let today = now.date_naive();
        let yesterday = today
            .pred_opt()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();

        let added: i64 = self
            .solve_script
            .key(solved_key(&user.uid))
            .key(profile_key(&user.uid))
            .key(topics_key(&user.uid))
            .arg(&problem.id)
            .arg(today.format(DATE_FORMAT).to_string())
            .arg(yesterday)
            .arg(&problem.categories)
            .invoke_async(&mut conn)
            .await?;

        if added == 0 {
            return Ok(false);
        }
        info!(uid = %user.uid, problem_id = %problem.id, "Problem solved");
        Ok(true)
    }

    async fn set_display_name(&self, user: &User, name: &str) -> ProgressResult<UserProfile> {
        let mut conn = self.conn.clone();
        let key = profile_key(&user.uid);
        let today = Utc::now().date_naive();

        let _: () = redis::pipe()
            .atomic()
            .hset_nx(&key, "join_date", today.format(DATE_FORMAT).to_string())
            .ignore()
            .hset(&key, "display_name", name)
            .ignore()
            .query_async(&mut conn)
            .await?;
        self.load(user, today).await
    }
}
