//! Transcript persistence.
//!
//! Completed exchanges can be appended to a markdown file. Persistence is
//! deliberately decoupled from display: a write failure is reported as a
//! status message and leaves the already-rendered response untouched, and a
//! cancelled request never reaches the file.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;

pub struct TranscriptLog {
    file_path: Option<String>,
    is_active: bool,
}

impl TranscriptLog {
    /// A transcript path provided at startup (config or `--log`) enables
    /// recording immediately.
    pub fn new(file_path: Option<String>) -> Self {
        let is_active = file_path.is_some();
        TranscriptLog {
            file_path,
            is_active,
        }
    }

    pub fn set_file(&mut self, path: String) -> Result<String, std::io::Error> {
        // Test if we can create/write to the file
        self.test_file_access(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;

        Ok(format!("Transcript enabled: {path}"))
    }

    pub fn toggle(&mut self) -> Result<String, String> {
        match &self.file_path {
            Some(path) => {
                self.is_active = !self.is_active;
                if self.is_active {
                    Ok(format!("Transcript resumed: {path}"))
                } else {
                    Ok(format!("Transcript paused (file: {path})"))
                }
            }
            None => Err("No transcript file set. Use /log <filename> first.".to_string()),
        }
    }

    /// Append one completed exchange as markdown.
    pub fn record_exchange(
        &self,
        model: &str,
        prompt: &str,
        response: &str,
    ) -> Result<(), std::io::Error> {
        if !self.is_active || self.file_path.is_none() {
            return Ok(());
        }

        let file_path = self.file_path.as_ref().unwrap();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);

        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(writer, "## {stamp} — {model}")?;
        writeln!(writer)?;
        writeln!(writer, "**You:**")?;
        writeln!(writer)?;
        for line in prompt.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        writeln!(writer, "**{model}:**")?;
        writeln!(writer)?;
        for line in response.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;

        writer.flush()?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn status_string(&self) -> String {
        match (&self.file_path, self.is_active) {
            (None, _) => "off".to_string(),
            (Some(path), true) => format!(
                "recording ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
            (Some(path), false) => format!(
                "paused ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
        }
    }

    fn test_file_access(&self, path: &str) -> Result<(), std::io::Error> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}
