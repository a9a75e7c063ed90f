//! System prompt template
//!
//! A template may reference the tool list through any of the placeholders
//! in [`TOOLS_PLACEHOLDERS`]. A user-supplied template replaces the
//! default entirely.

/// Placeholders substituted with the tool description list
pub const TOOLS_PLACEHOLDERS: [&str; 3] = ["{{tools}}", "{tools}", "{tool_descriptions}"];

/// Default template used when no template file is configured
pub fn default_system_prompt_template() -> String {
    r#"You are an autonomous CLI agent. You may use the following tools when necessary:
{tools}

To call a tool respond with exactly:
<tool name="{tool_name}">
{JSON arguments}
</tool>

Do not include additional commentary when calling a tool.
IMPORTANT: Tools are always executed from the same fixed working directory, so cd (change directory) does not persist between tool calls. Use absolute paths where you can.
When you receive a tool result it will be wrapped in <tool_result name="..."> tags.
When you call any tool, you are given the result immediately and, if necessary, you can directly call another tool.
If the tool results were not sufficient to give a high quality answer, you may call another tool.
You are not a simple chatbot: you can keep calling tools as long as you need to achieve the objective.
When no tool is needed, respond directly to the user.
Continue the conversation after achieving the objective or when clarification or more information from the user is needed."#
        .to_string()
}

/// Render the system prompt from a template and the tool descriptions
pub fn render_system_prompt(template: &str, tool_descriptions: &str) -> String {
    let mut rendered = template.to_string();
    for placeholder in TOOLS_PLACEHOLDERS {
        rendered = rendered.replace(placeholder, tool_descriptions);
    }
    rendered.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_renders_tools() {
        let prompt = render_system_prompt(&default_system_prompt_template(), "- bc: calc");
        assert!(prompt.contains("- bc: calc"));
        assert!(prompt.contains("<tool name=\"{tool_name}\">"));
        assert!(!prompt.contains("{tools}"));
    }

    #[test]
    fn test_all_placeholders_replaced() {
        let template = "A {{tools}} B {tools} C {tool_descriptions}\n";
        assert_eq!(render_system_prompt(template, "T"), "A T B T C T");
    }
}
