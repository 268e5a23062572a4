//! Prompt templates for first-aid answers

use std::collections::HashMap;

/// Safety disclaimer every answer starts and ends with
pub const DISCLAIMER: &str = "Disclaimer: This information is for educational purposes only and is not \
a substitute for professional medical advice. Always consult a healthcare professional for \
diagnosis and treatment. In case of a medical emergency, call emergency services immediately.";

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables
    #[must_use]
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut result = self.template.clone();
        for var in &self.variables {
            if let Some(value) = values.get(var) {
                result = result.replace(&format!("{{{{{var}}}}}"), value);
            }
        }
        result
    }

    /// Render from `(name, value)` pairs
    #[must_use]
    pub fn render_pairs(&self, pairs: &[(&str, &str)]) -> String {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.render(&values)
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract `{{name}}` variable names from a template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                chars.next();
                if ch == '}' {
                    if chars.peek() == Some(&'}') {
                        chars.next();
                    }
                    break;
                }
                var_name.push(ch);
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// Prompts for the first-aid assistant
pub struct FirstAidPrompts;

impl FirstAidPrompts {
    /// System message; takes `{{disclaimer}}`
    #[must_use]
    pub fn system() -> PromptTemplate {
        PromptTemplate::new(
            r#"You are a patient-safety-aware first-aid chatbot designed to provide immediate, actionable
guidance for medical emergencies within Diabetes, Cardiac, and Renal domains.
Your responses must be clear, concise, and prioritize immediate safety actions (like calling emergency services).
Always preface your answer with the provided disclaimer.
Structure your answer clearly, identifying the most likely condition, providing first-aid steps,
mentioning key medicine(s) if applicable, and citing sources.
Keep the overall response concise, ideally under 250 words.

Here's the disclaimer you must always start with:
{{disclaimer}}

Your response should follow this structure:
---
Condition: [Inferred Condition Name]
First-Aid Steps:
1. [Step 1]
2. [Step 2]
...
Key Medicine(s): [Relevant medicines, if applicable. State dosage/administration only if explicitly in context and safe to do so for first-aid.]
Source Citations:
- [Source 1, e.g., 'Local Snippet: "Sentence text..."' or 'Web: Title (URL)']
- [Source 2, e.g., 'Local Snippet: "Sentence text..."' or 'Web: Title (URL)']
...
---"#,
        )
    }

    /// User message; takes `{{query}}` and `{{context}}`
    #[must_use]
    pub fn user() -> PromptTemplate {
        PromptTemplate::new(
            r#"User's medical situation: "{{query}}"

Relevant information to help answer the user's situation:
{{context}}"#,
        )
    }

    /// Rendered system message
    #[must_use]
    pub fn system_message() -> String {
        Self::system().render_pairs(&[("disclaimer", DISCLAIMER)])
    }

    /// Rendered user message
    #[must_use]
    pub fn user_message(query: &str, context: &str) -> String {
        Self::user().render_pairs(&[("query", query), ("context", context)])
    }

    /// Answer returned when the LLM cannot be reached
    #[must_use]
    pub fn fallback_answer() -> String {
        format!(
            "{DISCLAIMER}\n\nI apologize, but I encountered an issue connecting to the AI. \
             Please ensure your LLM API key is correct and try again later."
        )
    }
}

/// Ensure `answer` starts and ends with the disclaimer
#[must_use]
pub fn with_disclaimer(answer: &str) -> String {
    let mut full = answer.to_string();
    if !full.trim().starts_with(DISCLAIMER) {
        full = format!("{DISCLAIMER}\n\n{full}");
    }
    if !full.trim().ends_with(DISCLAIMER) {
        full.push_str("\n\n");
        full.push_str(DISCLAIMER);
    }
    full
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_variables() {
        let template = PromptTemplate::new("Hello {{name}}, you are {{age}} years old.");
        assert_eq!(template.variables(), &["name", "age"]);
    }

    #[test]
    fn test_template_render() {
        let template = PromptTemplate::new("Hello {{name}}!");
        let mut values = HashMap::new();
        values.insert("name".to_string(), "Alice".to_string());
        assert_eq!(template.render(&values), "Hello Alice!");
    }

    #[test]
    fn test_system_message_embeds_disclaimer() {
        let system = FirstAidPrompts::system_message();
        assert!(system.contains(DISCLAIMER));
        assert!(system.contains("First-Aid Steps:"));
        assert!(!system.contains("{{"));
    }

    #[test]
    fn test_user_message() {
        let user = FirstAidPrompts::user_message("chest pain", "[Local Snippet 1]\nCall 911.");
        assert!(user.starts_with("User's medical situation: \"chest pain\""));
        assert!(user.ends_with("[Local Snippet 1]\nCall 911."));
    }

    #[test]
    fn test_with_disclaimer_wraps_once() {
        let wrapped = with_disclaimer("Condition: Hypoglycaemia");
        assert!(wrapped.starts_with(DISCLAIMER));
        assert!(wrapped.ends_with(DISCLAIMER));

        // Already wrapped answers are left alone
        assert_eq!(with_disclaimer(&wrapped), wrapped);

        // A disclaimer-only answer counts as both
        assert_eq!(with_disclaimer(DISCLAIMER), DISCLAIMER);
    }
}
