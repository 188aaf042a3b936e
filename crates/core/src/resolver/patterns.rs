// Ordered pattern table for deterministic natural-language resolution

use regex::{Regex, RegexBuilder};

/// One tagged entry of the pattern table.
///
/// Entries are evaluated in declared order and the first trigger that matches wins,
/// so an earlier entry shadows a later one whenever both could match.
#[derive(Debug, Clone)]
pub struct CommandPattern {
    pub tag: String,
    trigger: Regex,
    pub command: String,
    pub description: String,
    extractor: Option<Regex>,
}

impl CommandPattern {
    pub fn new(
        tag: impl Into<String>,
        trigger: &str,
        command: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            tag: tag.into(),
            trigger: case_insensitive(trigger)?,
            command: command.into(),
            description: description.into(),
            extractor: None,
        })
    }

    /// Attach a narrower expression whose first capture group is appended to the command
    pub fn with_extractor(mut self, extractor: &str) -> Result<Self, regex::Error> {
        self.extractor = Some(case_insensitive(extractor)?);
        Ok(self)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.trigger.is_match(text)
    }

    /// Render the command for `text`, appending the extracted parameter when there is one
    pub fn render(&self, text: &str) -> String {
        let param = self
            .extractor
            .as_ref()
            .and_then(|extractor| extractor.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|param| !param.is_empty());

        match param {
            Some(param) => format!("{} {}", self.command, param),
            None => self.command.clone(),
        }
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// The built-in table, in precedence order
pub fn default_patterns() -> Result<Vec<CommandPattern>, regex::Error> {
    Ok(vec![
        CommandPattern::new(
            "add-file",
            r"(?:add|upload|ingest).*?(?:pdf|document|file)",
            "jaegis add-file",
            "Add file to knowledge base",
        )?
        .with_extractor(r#"(?:add|upload|ingest)\s+(?:the\s+)?(?:file\s+)?["']?([^"'\s]+)["']?"#)?,
        CommandPattern::new(
            "gdrive-sync",
            r"(?:sync|synchronize).*(?:google|drive|gdrive)",
            "jaegis gdrive-sync",
            "Sync Google Drive folder",
        )?,
        CommandPattern::new(
            "search",
            r"(?:search|find|look for).*(?:document|file|info)",
            "jaegis search",
            "Search documents",
        )?
        .with_extractor(
            r#"(?:search|find|look for)\s+(?:for\s+)?(?:documents?\s+)?(?:about\s+)?["']?([^"'.]+)["']?"#,
        )?,
        CommandPattern::new(
            "list-documents",
            r"(?:list|show).*(?:document|file)",
            "jaegis list-documents",
            "List all documents",
        )?,
        CommandPattern::new(
            "chat",
            r"(?:chat|talk|ask|question)",
            "jaegis chat",
            "Start interactive chat",
        )?,
        CommandPattern::new(
            "status",
            r"(?:status|health|check)",
            "jaegis status",
            "Show system status",
        )?,
        CommandPattern::new(
            "summarize",
            r"(?:summarize|summary).*(?:document|file)",
            "jaegis summarize",
            "Generate document summary",
        )?
        .with_extractor(r#"(?:summarize|summary)\s+(?:the\s+)?(?:file\s+)?["']?([^"'\s]+)["']?"#)?,
        CommandPattern::new(
            "blueprint",
            r"(?:blueprint|outline|structure)",
            "jaegis blueprint-create",
            "Generate structured blueprint",
        )?,
        CommandPattern::new(
            "podcast",
            r"(?:podcast|audio)",
            "jaegis podcast-create",
            "Create podcast from content",
        )?,
        CommandPattern::new(
            "config",
            r"(?:config|configuration|settings)",
            "jaegis config",
            "Show configuration",
        )?,
        CommandPattern::new("logs", r"(?:logs|log)", "jaegis logs", "Show system logs")?,
        CommandPattern::new(
            "restart",
            r"(?:restart|reboot)",
            "jaegis restart",
            "Restart background service",
        )?,
        CommandPattern::new(
            "help",
            r"(?:help|commands|what can i do)",
            "help",
            "Show available commands",
        )?,
        CommandPattern::new("clear", r"(?:clear|clean)", "clear", "Clear terminal")?,
    ])
}
