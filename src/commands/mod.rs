pub mod check;
pub mod convert;
pub mod import;
pub mod repair;
pub mod status;

use anyhow::Result;
use serde::Serialize;

use crate::error::LedgerError;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn render_text(&self) -> String {
        let mut out = format!(
            "{}: {}\n",
            self.command,
            if self.ok { "ok" } else { "failed" }
        );
        for detail in &self.details {
            out.push_str(&format!("  {detail}\n"));
        }
        if !self.issues.is_empty() {
            out.push_str("issues:\n");
            for issue in &self.issues {
                out.push_str(&format!("  - {issue}\n"));
            }
        }
        out
    }
}

/// Anticipated failures become report issues; anything else is returned.
pub fn absorb(report: &mut CommandReport, err: anyhow::Error) -> Result<()> {
    match err.downcast::<LedgerError>() {
        Ok(known) => {
            tracing::warn!(command = %report.command, error = %known, "command aborted");
            report.issue(known.to_string());
            Ok(())
        }
        Err(other) => Err(other),
    }
}
