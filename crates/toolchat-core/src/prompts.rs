//! Default system prompt.

use crate::tools::ToolRegistry;
use std::fmt::Write;

const PREAMBLE: &str =
    "You are a helpful assistant. You have access to the following tools to obtain real-time information:";

const INSTRUCTIONS: &str = r#"When a tool is needed to answer the user:
1. Decide which tool is needed and extract its arguments.
2. Do not answer the question directly.
3. Prefer the native tool-calling interface. If it is unavailable, reply with ONLY a JSON object of the form
   {"name": "<tool name>", "arguments": {<arguments>}}
   and no other text, explanation, prefix or suffix.
When no tool is needed, answer normally in the user's language."#;

/// Build the system prompt describing every registered tool.
pub fn default_system_prompt(registry: &ToolRegistry) -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push_str("\n\n");

    for (i, def) in registry.definitions().enumerate() {
        let args = def.argument_names();
        let args = if args.is_empty() {
            "none".to_string()
        } else {
            args.iter()
                .map(|a| format!("`{a}`"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(prompt, "{}. **{}**", i + 1, def.name);
        let _ = writeln!(prompt, "   Description: {}", def.description);
        let _ = writeln!(prompt, "   Arguments: {}", args);
    }

    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeatherConfig;
    use crate::tools::register_local_tools;

    #[test]
    fn test_prompt_lists_tools_in_order() {
        let mut registry = ToolRegistry::new();
        register_local_tools(&mut registry, &WeatherConfig::default()).unwrap();
        let prompt = default_system_prompt(&registry);

        let time = prompt.find("1. **get_current_time**").unwrap();
        let weather = prompt.find("2. **get_current_weather**").unwrap();
        assert!(time < weather);
        assert!(prompt.contains("Arguments: none"));
        assert!(prompt.contains("Arguments: `location`"));
        assert!(prompt.contains(r#"{"name": "<tool name>""#));
    }

    #[test]
    fn test_prompt_without_tools() {
        let prompt = default_system_prompt(&ToolRegistry::new());
        assert!(prompt.starts_with(PREAMBLE));
        assert!(prompt.ends_with(INSTRUCTIONS));
    }
}
