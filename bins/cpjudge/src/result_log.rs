// Human-readable session result log (Tests/result.txt)
use crate::error::SessionError;
use crate::evaluator::read_text;
use crate::fixtures::Fixture;
use cpjudge_common::layout::RECORD_SEPARATOR;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// One fixture's entry in the result log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub index: u32,
    pub input: String,
    pub expected: String,
    pub actual: String,
    /// Present only when the stderr file exists and is non-empty
    pub stderr: Option<String>,
}

impl ResultRecord {
    /// Read every file of a fixture that has been run
    pub async fn read(fixture: &Fixture) -> Result<Self, SessionError> {
        let input = read_text(&fixture.input).await?;
        let expected = read_text(&fixture.expected).await?;
        let actual = read_text(&fixture.actual).await?;
        let stderr = match tokio::fs::try_exists(&fixture.stderr).await {
            Ok(true) => Some(read_text(&fixture.stderr).await?).filter(|s| !s.is_empty()),
            Ok(false) => None,
            Err(e) => return Err(SessionError::io(&fixture.stderr, e)),
        };

        Ok(Self {
            index: fixture.index,
            input,
            expected,
            actual,
            stderr,
        })
    }

    pub fn render(&self) -> String {
        let mut record = format!(
            "Input {}: \n{}\n\nExpected Output : \n{}\n\nObtained Output : \n{}\n\n",
            self.index, self.input, self.expected, self.actual
        );
        if let Some(stderr) = &self.stderr {
            record.push_str(&format!("Standard Error : \n{}\n\n", stderr));
        }
        record.push_str(RECORD_SEPARATOR);
        record.push_str("\n\n");
        record
    }
}

/// Append text to the log, creating it if absent
pub async fn append(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await
}

/// Empty the log, creating it if absent
pub async fn truncate(path: &Path) -> std::io::Result<()> {
    tokio::fs::write(path, b"").await
}
