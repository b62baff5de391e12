use autospec_engine::config::Config;
use autospec_engine::text::{
    excerpt, extract_code_blocks, named_files, parse_intent, sanitize_project_name,
    strip_reasoning,
};
use proptest::prelude::*;

// Project names: sanitizing is idempotent, bounded and always yields a
// folder name that starts with a letter.
proptest! {
    #[test]
    fn test_sanitized_name_is_stable(raw in "\\PC{0,60}", max_len in 8usize..=40) {
        let once = sanitize_project_name(&raw, max_len);
        let twice = sanitize_project_name(&once, max_len);

        prop_assert_eq!(&once, &twice);
        prop_assert!(once.chars().count() <= max_len);
        prop_assert!(once.chars().next().map_or(false, char::is_alphabetic));
        prop_assert!(once
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-'));
    }
}

// Reasoning spans: text without markers is untouched, and every
// well-formed span disappears however many lines it covers.
proptest! {
    #[test]
    fn test_strip_without_markers_is_noop(text in "[^<]{0,200}") {
        prop_assert_eq!(strip_reasoning(&text, "think").unwrap(), text);
    }

    #[test]
    fn test_strip_removes_spans(
        before in "[^<]{0,40}",
        hidden in prop::collection::vec("[^<]{0,30}", 1..4),
        after in "[^<]{0,40}",
    ) {
        let raw = format!("{}<think>{}</think>{}", before, hidden.join("\n"), after);
        prop_assert_eq!(strip_reasoning(&raw, "think").unwrap(), format!("{}{}", before, after));
    }
}

// Code blocks: a named fence comes back with its filename and body.
proptest! {
    #[test]
    fn test_named_block_is_recovered(
        dir in "[a-z]{1,8}",
        stem in "[a-z_]{1,12}",
        lines in prop::collection::vec("[a-zA-Z0-9 =()'+]{0,40}", 1..6),
    ) {
        let filename = format!("{}/{}.py", dir, stem);
        let body: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        let answer = format!("Here you go:\n```python filename={}\n{}```\nDone.", filename, body);

        let blocks = extract_code_blocks(&answer);
        prop_assert_eq!(blocks.len(), 1);
        prop_assert_eq!(blocks[0].language.as_deref(), Some("python"));
        prop_assert_eq!(named_files(&blocks), vec![(filename.as_str(), body.as_str())]);
    }
}

// Intent answers: explicit negatives always win over what follows.
proptest! {
    #[test]
    fn test_negative_intent(rest in "\\PC{0,40}") {
        let answer = format!("否{}", rest);
        prop_assert!(!parse_intent(&answer));
        let answer = format!("不是{}", rest);
        prop_assert!(!parse_intent(&answer));
        let answer = format!("no {}", rest);
        prop_assert!(!parse_intent(&answer));
    }

    #[test]
    fn test_positive_intent(rest in "[ ,.!][a-z ]{0,40}") {
        let answer = format!("yes{}", rest);
        prop_assert!(parse_intent(&answer));
        let answer = format!("**YES**{}", rest);
        prop_assert!(parse_intent(&answer));
        let answer = format!("是{}", rest);
        prop_assert!(parse_intent(&answer));
    }
}

proptest! {
    #[test]
    fn test_excerpt_is_prefix(text in "\\PC{0,80}", n in 0usize..100) {
        let cut = excerpt(&text, n);
        prop_assert!(text.starts_with(cut));
        prop_assert_eq!(cut.chars().count(), n.min(text.chars().count()));
    }
}

// Configuration round-trip through TOML
proptest! {
    #[test]
    fn test_config_round_trip(
        log_level in "error|warn|info|debug|trace",
        model in "[a-z0-9.]{1,12}:[0-9]{1,2}b",
        tag in "[a-z_]{1,10}",
        max_steps in 1usize..500,
        per_stage in 0usize..10,
        cache in any::<bool>(),
    ) {
        let mut config = Config::default_config();
        config.core.log_level = log_level;
        config.llm.ollama.model = model;
        config.llm.cache = cache;
        config.pipeline.reasoning_tag = tag;
        config.pipeline.max_steps = max_steps;
        config.pipeline.max_tool_calls_per_stage = per_stage;

        let toml_string = toml::to_string(&config).expect("Failed to serialize Config to string");
        let parsed: Config = toml::from_str(&toml_string).expect("Failed to deserialize TOML to Config");

        prop_assert_eq!(config.core.log_level, parsed.core.log_level);
        prop_assert_eq!(config.llm.ollama.model, parsed.llm.ollama.model);
        prop_assert_eq!(config.llm.cache, parsed.llm.cache);
        prop_assert_eq!(config.pipeline.reasoning_tag, parsed.pipeline.reasoning_tag);
        prop_assert_eq!(config.pipeline.max_steps, parsed.pipeline.max_steps);
        prop_assert_eq!(
            config.pipeline.max_tool_calls_per_stage,
            parsed.pipeline.max_tool_calls_per_stage
        );
    }
}
