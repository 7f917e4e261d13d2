//! The `markwise init` command.

use std::path::Path;

use anyhow::Result;

/// Write `content` to `path` unless the file already exists.
fn write_starter(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("Created {}", path.display());
    Ok(())
}

pub fn execute() -> Result<()> {
    write_starter(Path::new("markwise.toml"), SAMPLE_CONFIG)?;
    write_starter(Path::new("answer-keys/example.toml"), EXAMPLE_ANSWER_KEY)?;
    write_starter(Path::new("submissions/example.toml"), EXAMPLE_SUBMISSIONS)?;

    println!("\nNext steps:");
    println!("  1. Point [scorer] base_url in markwise.toml at your scoring server");
    println!("  2. Run: markwise health");
    println!("  3. Run: markwise validate --answer-key answer-keys/example.toml --submissions submissions/example.toml");
    println!("  4. Run: markwise evaluate --answer-key answer-keys/example.toml --submissions submissions/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# markwise configuration

output_dir = "./markwise-results"

[scorer]
# "remote" talks to a scoring server, "mock" awards mock_mark to every
# answer that is not an exact match.
type = "remote"
base_url = "http://localhost:8000"
timeout_secs = 30
max_retries = 0
retry_delay_ms = 1000
"#;

const EXAMPLE_ANSWER_KEY: &str = r#"[answer_key]
id = "example"
name = "Example Science Quiz"
description = "A short quiz to get started"

[[questions]]
question = "Q1. What is the capital of France?"
answer = "Paris is the capital of France."
mark = 2

[[questions]]
question = "Q2. What does photosynthesis produce?"
answer = "Photosynthesis produces glucose and oxygen from carbon dioxide and water using light energy."
mark = 5

[[questions]]
question = "Q3. State Newton's first law of motion."
answer = "An object stays at rest or in uniform motion unless acted on by an external force."
mark = 3
"#;

const EXAMPLE_SUBMISSIONS: &str = r#"[[students]]
name = "Asha Rao"
roll = "21"
email = "asha@example.com"

[[students.answers]]
question = "Q.1"
answer = "paris is the capital of france"

[[students.answers]]
question = "Q 2)"
answer = "It makes sugar and oxygen."

[[students.answers]]
question = "q3"
answer = "Things keep doing what they are doing unless a force acts on them."

[[students]]
name = "Ben Okafor"
roll = "22"

[[students.answers]]
question = "Q1"
answer = "Lyon"

[[students.answers]]
question = "Q3"
answer = "F = ma"
"#;
