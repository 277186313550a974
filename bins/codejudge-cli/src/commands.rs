// CLI commands for CodeJudge
use anyhow::{bail, Context as _, Result};
use codejudge_common::catalog::ProblemCatalog;
use codejudge_common::config::AppConfig;
use codejudge_common::progress::{MemoryProgressStore, ProgressStore, RedisProgressStore, UserProfile};
use codejudge_common::session::{Session, User};
use codejudge_common::types::{Difficulty, Language, Problem, SubmissionScore, TestOutcome};
use codejudge_judge::{EvaluationService, EvaluationState, Judge0Client, Orchestrator};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs: configuration, catalog and the session gate
pub struct Context {
    pub config: AppConfig,
    pub catalog: ProblemCatalog,
    session: Session,
}

impl Context {
    pub fn load(user: Option<&str>, email: &str) -> Result<Self> {
        let config = AppConfig::from_env()?;
        let catalog = match &config.catalog_path {
            Some(path) => ProblemCatalog::load(path)?,
            None => ProblemCatalog::builtin()?,
        };
        let session = match user.map(str::trim).filter(|u| !u.is_empty()) {
            Some(uid) => Session::signed_in(User::new(uid, email)),
            None => Session::signed_out(),
        };
        Ok(Self {
            config,
            catalog,
            session,
        })
    }

    fn problem(&self, id: &str) -> Result<&Problem> {
        match self.catalog.get(id) {
            Some(problem) => Ok(problem),
            None => bail!("Problem '{}' not found (see: codejudge problems)", id),
        }
    }

    fn require_user(&self) -> Result<User> {
        self.session
            .require_user()
            .cloned()
            .context("Sign in with --user <id> or set CODEJUDGE_USER")
    }

    fn language(&self, language: Option<Language>) -> Language {
        language.unwrap_or(self.config.judge.language)
    }

    async fn progress(&self) -> Result<Arc<dyn ProgressStore>> {
        match &self.config.redis_url {
            Some(url) => {
                let store = RedisProgressStore::connect(url)
                    .await
                    .context("Failed to connect to Redis")?;
                Ok(Arc::new(store))
            }
            None => {
                println!("⚠️  REDIS_URL not set - progress will not be kept after this command");
                Ok(Arc::new(MemoryProgressStore::new()))
            }
        }
    }

    async fn service(&self, language: Language) -> Result<EvaluationService<Judge0Client>> {
        let client = Judge0Client::new(&self.config.judge)?;
        let orchestrator = Orchestrator::new(client, language, self.config.judge.poll);
        Ok(EvaluationService::new(orchestrator, self.progress().await?))
    }
}

fn read_source(file: &Path) -> Result<String> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if source.trim().is_empty() {
        bail!("{} is empty", file.display());
    }
    Ok(source)
}

/// One line per test case, with details for failures
pub fn format_outcome(number: usize, outcome: &TestOutcome) -> String {
    if outcome.pass {
        return format!("  ✓ Test {} passed", number);
    }

    let mut lines = vec![
        format!("  ✗ Test {} failed", number),
        format!("      Input:    {:?}", outcome.input),
        format!("      Expected: {:?}", outcome.expected),
        format!("      Got:      {:?}", outcome.actual),
    ];
    if let Some(error) = &outcome.error {
        lines.push(format!("      Error:    {}", error));
    }
    lines.join("\n")
}

pub fn format_score(score: &SubmissionScore) -> String {
    if score.all_passed {
        format!("✅ Accepted - {}/{} test cases passed", score.correct, score.total)
    } else {
        format!("❌ {}/{} test cases passed", score.correct, score.total)
    }
}

/// List problems, optionally filtered by text and difficulty
pub fn list_problems(ctx: &Context, search: Option<&str>, difficulty: Option<&str>) -> Result<()> {
    let difficulty = match difficulty {
        Some(d) => Some(d.parse::<Difficulty>().map_err(anyhow::Error::msg)?),
        None => None,
    };

    let problems: Vec<&Problem> = ctx
        .catalog
        .search(search.unwrap_or_default())
        .into_iter()
        .filter(|p| difficulty.map_or(true, |d| p.difficulty == d))
        .collect();

    if problems.is_empty() {
        println!("No problems match.");
        return Ok(());
    }

    println!("📋 Problems:\n");
    println!("{:<30} {:<32} {:<8} {}", "ID", "TITLE", "LEVEL", "TOPICS");
    println!("{}", "─".repeat(100));
    for problem in &problems {
        println!(
            "{:<30} {:<32} {:<8} {}",
            problem.id,
            problem.title,
            problem.difficulty.to_string(),
            problem.categories.join(", ")
        );
    }
    println!("\n✅ Total: {} problem(s)", problems.len());
    Ok(())
}

/// Print a problem with its visible examples
pub fn show_problem(ctx: &Context, id: &str) -> Result<()> {
    let problem = ctx.problem(id)?;

    println!("📝 {} [{}]", problem.title, problem.difficulty);
    println!("   Topics: {}\n", problem.categories.join(", "));
    println!("{}\n", problem.description);

    for (idx, case) in problem.test_cases.iter().enumerate() {
        println!("Example {}:", idx + 1);
        println!("  Input:\n{}", indent(&case.input));
        println!("  Output:\n{}", indent(&case.expected_output));
    }
    if !problem.hidden_test_cases.is_empty() {
        println!("\n🔒 {} hidden test case(s) on submit", problem.hidden_test_cases.len());
    }
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn list_languages(ctx: &Context) {
    println!("📋 Supported Languages:\n");
    println!("{:<12} {:<6} {:<30}", "NAME", "ID", "COMPILER");
    println!("{}", "─".repeat(50));
    for language in Language::ALL {
        let marker = if language == ctx.config.judge.language {
            " (default)"
        } else {
            ""
        };
        println!(
            "{:<12} {:<6} {}{}",
            language.to_string(),
            language.id(),
            language.display_name(),
            marker
        );
    }
}

/// Run against the visible test cases
pub async fn run_problem(
    ctx: &Context,
    id: &str,
    file: &Path,
    language: Option<Language>,
) -> Result<()> {
    let user = ctx.require_user()?;
    let problem = ctx.problem(id)?;
    let source = read_source(file)?;
    let language = ctx.language(language);

    println!(
        "🚀 Running {} against {} test case(s) in {}...",
        problem.title,
        problem.test_cases.len(),
        language.display_name()
    );

    let service = ctx.service(language).await?;
    let state = service
        .run(Some(&user), problem, &source, EvaluationState::idle())
        .await?;

    for (idx, outcome) in state.outcomes.iter().enumerate() {
        println!("{}", format_outcome(idx + 1, outcome));
    }
    let passed = state.outcomes.iter().filter(|o| o.pass).count();
    println!("\n{}/{} passed", passed, state.outcomes.len());
    Ok(())
}

/// Submit against visible and hidden test cases
pub async fn submit_problem(
    ctx: &Context,
    id: &str,
    file: &Path,
    language: Option<Language>,
) -> Result<()> {
    let user = ctx.require_user()?;
    let problem = ctx.problem(id)?;
    let source = read_source(file)?;
    let language = ctx.language(language);

    println!(
        "📤 Submitting {} in {}...",
        problem.title,
        language.display_name()
    );

    let service = ctx.service(language).await?;
    let report = service
        .submit(Some(&user), problem, &source, EvaluationState::idle())
        .await?;

    if let Some(score) = &report.state.score {
        println!("{}", format_score(score));
    }
    match &report.profile {
        Some(profile) if report.newly_solved => println!(
            "🎉 {} solved! {} problem(s) solved so far",
            problem.title,
            profile.solved_count()
        ),
        Some(_) => {}
        None => println!("⚠️  Progress could not be recorded for this submission"),
    }
    Ok(())
}

/// Single execution with custom stdin
pub async fn execute(
    ctx: &Context,
    file: &Path,
    stdin: Option<String>,
    stdin_file: Option<&Path>,
    language: Option<Language>,
) -> Result<()> {
    let user = ctx.require_user()?;
    let source = read_source(file)?;
    let stdin = match (stdin, stdin_file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => String::new(),
    };
    let language = ctx.language(language);

    println!("⚙️  Executing {} in {}...\n", file.display(), language.display_name());

    let service = ctx.service(language).await?;
    let output = service.execute(Some(&user), &source, &stdin).await?;
    println!("{}", output.display);
    Ok(())
}

fn print_profile(ctx: &Context, profile: &UserProfile) {
    println!("👤 {}", ctx.session.display_name().unwrap_or_default());
    println!(
        "   Solved:   {}/{}",
        profile.solved_count(),
        ctx.catalog.len()
    );
    println!(
        "   Accuracy: {:.1}% ({}/{} submissions accepted)",
        profile.accuracy(),
        profile.accepted_submissions,
        profile.total_submissions
    );
    println!(
        "   Streak:   {} day(s), best {}",
        profile.current_streak, profile.max_streak
    );
    println!("   Joined:   {}\n", profile.join_date);

    for entry in profile.difficulty_breakdown(&ctx.catalog) {
        println!(
            "   {:<8} {}/{}",
            entry.difficulty.to_string(),
            entry.solved,
            entry.total
        );
    }
    if !profile.topics_solved.is_empty() {
        println!("\n   Topics:");
        for (topic, count) in &profile.topics_solved {
            println!("     {:<24} {}", topic, count);
        }
    }
}

/// Show progress, optionally changing the display name first
pub async fn show_profile(ctx: &mut Context, set_name: Option<&str>) -> Result<()> {
    let user = ctx.require_user()?;
    let progress = ctx.progress().await?;

    let mut profile = progress.profile(&user).await?;
    ctx.session.restore_display_name(profile.display_name.clone());

    if let Some(name) = set_name {
        let name = ctx.session.set_display_name(name)?;
        profile = progress.set_display_name(&user, &name).await?;
        println!("✅ Display name set to '{}'\n", name);
    }

    print_profile(ctx, &profile);
    Ok(())
}
