// Terminal command vocabulary shared by the resolver, the completion prompt and the terminal runner

/// Built-in command that prints the help text
pub const HELP: &str = "help";

/// Built-in command that clears the dashboard terminal
pub const CLEAR: &str = "clear";

/// Description used when a command is not in the vocabulary
pub const UNKNOWN_DESCRIPTION: &str = "Execute command";

/// Shape of the trailing argument a command accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandArgument {
    /// No trailing argument
    None,
    /// A single path token
    Path,
    /// Free text; all remaining words form one argument
    Query,
}

/// Help text grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Core,
    Content,
    System,
    Help,
}

impl Section {
    fn title(&self) -> &'static str {
        match self {
            Self::Core => "Core Commands",
            Self::Content => "Content Generation",
            Self::System => "System Commands",
            Self::Help => "Help",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownCommand {
    pub name: &'static str,
    pub argument: CommandArgument,
    pub description: &'static str,
    pub section: Section,
}

impl KnownCommand {
    const fn new(
        name: &'static str,
        argument: CommandArgument,
        description: &'static str,
        section: Section,
    ) -> Self {
        Self {
            name,
            argument,
            description,
            section,
        }
    }

    /// Usage string, e.g. `jaegis add-file [path]`
    pub fn usage(&self) -> String {
        match self.argument {
            CommandArgument::None => self.name.to_string(),
            CommandArgument::Path => format!("{} [path]", self.name),
            CommandArgument::Query => format!("{} [query]", self.name),
        }
    }

    /// Subcommand token passed to the terminal program, if this is a `jaegis` command
    pub fn subcommand(&self) -> Option<&'static str> {
        self.name.strip_prefix("jaegis ")
    }

    pub fn is_builtin(&self) -> bool {
        self.subcommand().is_none()
    }
}

/// Every command the dashboard terminal understands
pub const COMMANDS: &[KnownCommand] = &[
    KnownCommand::new(
        "jaegis chat",
        CommandArgument::None,
        "Start interactive RAG chat session",
        Section::Core,
    ),
    KnownCommand::new(
        "jaegis add-file",
        CommandArgument::Path,
        "Add file to knowledge base",
        Section::Core,
    ),
    KnownCommand::new(
        "jaegis gdrive-sync",
        CommandArgument::None,
        "Sync Google Drive folder",
        Section::Core,
    ),
    KnownCommand::new(
        "jaegis list-documents",
        CommandArgument::None,
        "List all documents in knowledge base",
        Section::Core,
    ),
    KnownCommand::new(
        "jaegis search",
        CommandArgument::Query,
        "Search documents",
        Section::Core,
    ),
    KnownCommand::new(
        "jaegis blueprint-create",
        CommandArgument::None,
        "Generate structured blueprint",
        Section::Content,
    ),
    KnownCommand::new(
        "jaegis podcast-create",
        CommandArgument::None,
        "Create podcast from content",
        Section::Content,
    ),
    KnownCommand::new(
        "jaegis summarize",
        CommandArgument::Path,
        "Generate document summary",
        Section::Content,
    ),
    KnownCommand::new(
        "jaegis status",
        CommandArgument::None,
        "Show system status",
        Section::System,
    ),
    KnownCommand::new(
        "jaegis config",
        CommandArgument::None,
        "Show configuration",
        Section::System,
    ),
    KnownCommand::new(
        "jaegis logs",
        CommandArgument::None,
        "Show system logs",
        Section::System,
    ),
    KnownCommand::new(
        "jaegis restart",
        CommandArgument::None,
        "Restart background service",
        Section::System,
    ),
    KnownCommand::new(HELP, CommandArgument::None, "Show available commands", Section::Help),
    KnownCommand::new(CLEAR, CommandArgument::None, "Clear terminal", Section::Help),
];

/// Find the vocabulary entry a command string starts with.
///
/// `jaegis search AI` resolves to `jaegis search`; `jaegis searching` resolves to nothing.
pub fn lookup(command: &str) -> Option<&'static KnownCommand> {
    let command = command.trim();
    COMMANDS
        .iter()
        .filter(|known| {
            command == known.name
                || command
                    .strip_prefix(known.name)
                    .is_some_and(|rest| rest.starts_with(char::is_whitespace))
        })
        .max_by_key(|known| known.name.len())
}

/// Description of a command string, or a generic one for commands outside the vocabulary
pub fn describe(command: &str) -> &'static str {
    lookup(command)
        .map(|known| known.description)
        .unwrap_or(UNKNOWN_DESCRIPTION)
}

/// Text printed by the built-in `help` command
pub fn help_text() -> String {
    let width = COMMANDS
        .iter()
        .map(|known| known.usage().len())
        .max()
        .unwrap_or(0)
        + 4;

    let mut out = String::from("JAEGIS NexusSync Commands:\n==========================\n");
    for section in [Section::Core, Section::Content, Section::System, Section::Help] {
        out.push('\n');
        out.push_str(section.title());
        out.push_str(":\n");
        for known in COMMANDS.iter().filter(|known| known.section == section) {
            out.push_str(&format!(
                "  {:<width$}{}\n",
                known.usage(),
                known.description,
                width = width
            ));
        }
    }

    out.push_str("\nNatural Language:\n");
    out.push_str("  You can also type commands in natural language, e.g.:\n");
    out.push_str("  \"add the PDF file to my knowledge base\"\n");
    out.push_str("  \"sync my Google Drive\"\n");
    out.push_str("  \"search for documents about AI\"\n");
    out
}

/// Fixed instructions handed to the completion fallback
pub fn completion_instructions() -> String {
    let mut out = String::from(
        "You are a command converter for JAEGIS NexusSync CLI. \
         Convert natural language input into specific CLI commands.\n\nAvailable commands:\n",
    );
    for known in COMMANDS {
        out.push_str(&format!("- {}: {}\n", known.usage(), known.description));
    }
    out.push_str(
        "\nRules:\n\
         1. Only return the command, nothing else, on a single line\n\
         2. If the input doesn't match any available command, return \"help\"\n\
         3. Extract file paths or search queries when mentioned\n\
         4. Be conservative - if unsure, default to \"help\"\n\
         \nExamples:\n\
         Input: \"I want to add a PDF file\"\nOutput: jaegis add-file\n\n\
         Input: \"sync my google drive\"\nOutput: jaegis gdrive-sync\n\n\
         Input: \"search for documents about AI\"\nOutput: jaegis search AI\n\n\
         Input: \"what's the system status\"\nOutput: jaegis status\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_exact_and_with_argument() {
        assert_eq!(lookup("jaegis status").unwrap().name, "jaegis status");
        assert_eq!(lookup("jaegis search AI agents").unwrap().name, "jaegis search");
        assert_eq!(lookup("  help ").unwrap().name, "help");
    }

    #[test]
    fn test_lookup_requires_word_boundary() {
        assert!(lookup("jaegis searching").is_none());
        assert!(lookup("helpme").is_none());
        assert!(lookup("rm -rf /").is_none());
    }

    #[test]
    fn test_describe_unknown_command() {
        assert_eq!(describe("jaegis add-file notes.md"), "Add file to knowledge base");
        assert_eq!(describe("jaegis frobnicate"), UNKNOWN_DESCRIPTION);
    }

    #[test]
    fn test_subcommand() {
        let search = lookup("jaegis search").unwrap();
        assert_eq!(search.subcommand(), Some("search"));
        assert!(!search.is_builtin());
        assert!(lookup(HELP).unwrap().is_builtin());
        assert!(lookup(CLEAR).unwrap().is_builtin());
    }

    #[test]
    fn test_help_text_lists_every_command() {
        let help = help_text();
        for known in COMMANDS {
            assert!(help.contains(&known.usage()), "missing {}", known.name);
        }
        assert!(help.contains("Content Generation:"));
    }

    #[test]
    fn test_instructions_mention_default() {
        let instructions = completion_instructions();
        assert!(instructions.contains("- jaegis summarize [path]: Generate document summary"));
        assert!(instructions.contains("default to \"help\""));
    }
}
