// Built-in tools exposed to assistant clients, one per CLI subcommand

use super::registry::{ParamSpec, ParamType, RegistryError, ToolDefinition, ToolRegistry};

/// Every built-in tool, in the order `tools/list` reports them
pub fn builtin_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "jaegis_set_source",
            "Set the active source URL and process its content",
            &["set-source"],
        )
        .with_parameter(
            ParamSpec::new(
                "url",
                ParamType::String,
                "YouTube video URL or other content source URL",
            )
            .required(),
        ),
        ToolDefinition::new(
            "jaegis_podcast_generate",
            "Generate a podcast from YouTube video",
            &["podcast"],
        )
        .with_parameter(ParamSpec::new("video_url", ParamType::String, "YouTube video URL"))
        .with_parameter(
            ParamSpec::new("style", ParamType::String, "Podcast style")
                .with_default("conversational")
                .flag("--style"),
        )
        .with_parameter(
            ParamSpec::new("voice", ParamType::String, "TTS voice")
                .with_default("alloy")
                .flag("--voice"),
        ),
        ToolDefinition::new(
            "jaegis_ask",
            "Ask a question to the n8n RAG workflow",
            &["ask"],
        )
        .with_parameter(ParamSpec::new("question", ParamType::String, "Question to ask").required()),
        ToolDefinition::new(
            "jaegis_channel_add",
            "Add a YouTube channel for monitoring",
            &["channel", "add"],
        )
        .with_parameter(
            ParamSpec::new("channel_url", ParamType::String, "YouTube channel URL").required(),
        )
        .with_parameter(
            ParamSpec::new("check_interval", ParamType::Number, "Check interval in hours")
                .with_default(24)
                .flag("--check-interval"),
        ),
        ToolDefinition::new(
            "jaegis_stats",
            "Show monitoring and import statistics",
            &["stats"],
        ),
    ]
}

/// Registry holding the built-in tools, invoking `program`
pub fn builtin_registry(program: impl Into<String>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new(program);
    for tool in builtin_tools() {
        registry.register(tool)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_names_are_unique_and_ordered() {
        let registry = builtin_registry("youtube-chat").unwrap();
        let names: Vec<&str> = registry.list().iter().map(|t| t.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "jaegis_set_source",
                "jaegis_podcast_generate",
                "jaegis_ask",
                "jaegis_channel_add",
                "jaegis_stats",
            ]
        );
    }

    #[test]
    fn test_ask_invocation() {
        let registry = builtin_registry("youtube-chat").unwrap();
        let argv = registry
            .build_invocation("jaegis_ask", &json!({ "question": "What is RAG?" }))
            .unwrap();

        assert_eq!(argv, vec!["youtube-chat", "ask", "What is RAG?"]);
    }

    #[test]
    fn test_podcast_defaults() {
        let registry = builtin_registry("youtube-chat").unwrap();
        let argv = registry
            .build_invocation("jaegis_podcast_generate", &json!({}))
            .unwrap();

        assert_eq!(
            argv,
            vec!["youtube-chat", "podcast", "--style", "conversational", "--voice", "alloy"]
        );
    }

    #[test]
    fn test_channel_add_invocation() {
        let registry = builtin_registry("youtube-chat").unwrap();
        let argv = registry
            .build_invocation(
                "jaegis_channel_add",
                &json!({ "channel_url": "https://youtube.com/@rustlang", "check_interval": 6 }),
            )
            .unwrap();

        assert_eq!(
            argv,
            vec![
                "youtube-chat",
                "channel",
                "add",
                "https://youtube.com/@rustlang",
                "--check-interval",
                "6"
            ]
        );
    }

    #[test]
    fn test_stats_takes_no_arguments() {
        let registry = builtin_registry("yc").unwrap();
        let argv = registry.build_invocation("jaegis_stats", &json!({})).unwrap();
        assert_eq!(argv, vec!["yc", "stats"]);
    }
}
