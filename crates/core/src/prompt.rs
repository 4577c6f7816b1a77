//! Prompt templates handed to the provider adapters.
//!
//! Built-in defaults can be overridden by Markdown files in a prompts
//! directory; the file stem selects the template.

use crate::subject::{Difficulty, Subject};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const TUTOR_INSTRUCTION: &str = "You are Lumina, a world-class educational tutor specializing in {subject}.
Current student level: {difficulty}.
Your goal is to explain concepts clearly, use analogies, and encourage the student.
If the student is struggling, break down the problem into smaller steps.
Format your response with clear Markdown headings and bullet points where appropriate.";

const VISUAL_AID: &str = "An educational, clear, professional diagram or conceptual illustration representing {concept}. White background, clean lines, high quality, student-friendly colors.";

const SPEECH: &str = "Explain clearly: {text}";

/// The three templates the providers fill in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub tutor_instruction: String,
    pub visual_aid: String,
    pub speech: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            tutor_instruction: TUTOR_INSTRUCTION.to_string(),
            visual_aid: VISUAL_AID.to_string(),
            speech: SPEECH.to_string(),
        }
    }
}

impl PromptSet {
    /// Loads `tutor_instruction.md`, `visual_aid.md` and `speech.md` from
    /// `dir`, keeping the built-in text for any that are missing.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut prompts = Self::default();
        if !dir.is_dir() {
            tracing::debug!(path = %dir.display(), "No prompts directory, using built-in prompts");
            return Ok(prompts);
        }

        let mut overrides = load_markdown(dir)?;
        if let Some(text) = overrides.remove("tutor_instruction") {
            prompts.tutor_instruction = text;
        }
        if let Some(text) = overrides.remove("visual_aid") {
            prompts.visual_aid = text;
        }
        if let Some(text) = overrides.remove("speech") {
            prompts.speech = text;
        }
        for unused in overrides.keys() {
            tracing::warn!(prompt = %unused, "Ignoring unknown prompt file");
        }
        Ok(prompts)
    }

    pub fn tutor_instruction(&self, subject: Subject, difficulty: Difficulty) -> String {
        self.tutor_instruction
            .replace("{subject}", subject.as_str())
            .replace("{difficulty}", difficulty.as_str())
    }

    pub fn visual_aid(&self, concept: &str) -> String {
        self.visual_aid.replace("{concept}", concept)
    }

    pub fn speech(&self, text: &str) -> String {
        self.speech.replace("{text}", text)
    }
}

fn load_markdown(dir: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt {}", path.display()))?;
            prompts.insert(key, content.trim_end().to_string());
        }
    }
    Ok(prompts)
}
