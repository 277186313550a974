use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages accepted by the judge service
///
/// The discriminant is the judge's own language id and is sent verbatim
/// as `language_id` on every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Cpp,
    Python,
    JavaScript,
    Java,
    C,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Cpp,
        Language::Python,
        Language::JavaScript,
        Language::Java,
        Language::C,
    ];

    /// Judge language id
    pub fn id(&self) -> i32 {
        match self {
            Language::Cpp => 54,
            Language::Python => 71,
            Language::JavaScript => 63,
            Language::Java => 62,
            Language::C => 50,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Cpp => "C++ (GCC 9.2.0)",
            Language::Python => "Python 3",
            Language::JavaScript => "JavaScript (Node.js)",
            Language::Java => "Java (OpenJDK 13.0.1)",
            Language::C => "C (GCC 9.2.0)",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.id() == id)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Cpp => "cpp",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::C => "c",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpp" | "c++" => Ok(Language::Cpp),
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            other => Err(format!("unknown language: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub categories: Vec<String>,
    pub description: String,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub hidden_test_cases: Vec<TestCase>,
}

/// Public projection of a problem: hidden test cases are only counted
#[derive(Debug, Clone, Serialize)]
pub struct ProblemView {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub categories: Vec<String>,
    pub description: String,
    pub test_cases: Vec<TestCase>,
    pub hidden_test_count: usize,
}

impl From<&Problem> for ProblemView {
    fn from(problem: &Problem) -> Self {
        Self {
            id: problem.id.clone(),
            title: problem.title.clone(),
            difficulty: problem.difficulty,
            categories: problem.categories.clone(),
            description: problem.description.clone(),
            test_cases: problem.test_cases.clone(),
            hidden_test_count: problem.hidden_test_cases.len(),
        }
    }
}

/// One execution request against the judge service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub source_code: String,
    pub language: Language,
    pub stdin: String,
}

/// Opaque token identifying one submission on the judge service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionHandle(pub String);

impl SubmissionHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Judge status id meaning execution finished
pub const STATUS_FINISHED: i32 = 3;

/// Range of judge status ids that describe a finished-but-failed execution
/// (wrong answer, time limit, compilation error, runtime errors, internal error)
pub const FAILURE_STATUSES: std::ops::RangeInclusive<i32> = 4..=14;

/// Snapshot of a submission as reported by the judge service
///
/// Output fields are still transport-encoded (base64).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionResult {
    pub status_id: Option<i32>,
    pub status_description: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
}

impl SubmissionResult {
    pub fn is_finished(&self) -> bool {
        self.status_id == Some(STATUS_FINISHED)
    }

    pub fn is_failure_status(&self) -> bool {
        self.status_id
            .map(|id| FAILURE_STATUSES.contains(&id))
            .unwrap_or(false)
    }
}

/// Result of a single test case in a Run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub pass: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate of a Submit pass over visible + hidden test cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionScore {
    pub correct: usize,
    pub total: usize,
    pub all_passed: bool,
}

impl SubmissionScore {
    pub fn new(correct: usize, total: usize) -> Self {
        Self {
            correct,
            total,
            all_passed: correct == total,
        }
    }
}

/// Output of a free-form run (no expected output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
    /// What the editor shows: stdout, else stderr, else compiler output
    pub display: String,
}

impl RunOutput {
    pub fn new(stdout: String, stderr: String, compile_output: String) -> Self {
        let display = if !stdout.is_empty() {
            stdout.clone()
        } else if !stderr.is_empty() {
            format!("Error: {}", stderr)
        } else if !compile_output.is_empty() {
            format!("Compile Error: {}", compile_output)
        } else {
            "No output".to_string()
        };

        Self {
            stdout,
            stderr,
            compile_output,
            display,
        }
    }
}
