//! Tool Registry
//!
//! The registry holds tools by name and exposes the name/description/
//! parameter manifest that the planner renders into its prompt. Concrete
//! tools (file/directory creation, content generation, ...) are external
//! collaborators that implement [`Tool`]; the engine only depends on this
//! contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One parameter in a tool's input schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSchema {
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// JSON-Schema-like parameter manifest for a tool.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputSchema {
    pub properties: BTreeMap<String, ParamSchema>,
    pub required: Vec<String>,
}

/// A named, parameterized, side-effecting operation callable by the
/// engine. Opaque to the scheduler beyond this contract: it may fail,
/// in which case the scheduler converts the error into an
/// `"ERROR: <message>"` result rather than aborting the run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as it appears in plan lines.
    fn name(&self) -> &str;

    /// One-line description rendered into the planner prompt.
    fn description(&self) -> &str;

    /// Parameter manifest rendered into the planner prompt.
    fn input_schema(&self) -> InputSchema;

    /// Execute the tool with resolved (placeholder-substituted) arguments.
    async fn invoke(&self, args: &BTreeMap<String, String>) -> anyhow::Result<String>;
}

/// Holds tools by name; used by both the planner (to render prompts) and
/// the scheduler (to dispatch tasks).
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any existing tool of the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in a stable (sorted) order, for prompt rendering.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes its input back"
        }

        fn input_schema(&self) -> InputSchema {
            let mut properties = BTreeMap::new();
            properties.insert(
                "text".to_string(),
                ParamSchema {
                    param_type: "string".to_string(),
                    description: Some("text to echo".to_string()),
                },
            );
            InputSchema {
                properties,
                required: vec!["text".to_string()],
            }
        }

        async fn invoke(&self, args: &BTreeMap<String, String>) -> anyhow::Result<String> {
            Ok(args.get("text").cloned().unwrap_or_default())
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        assert!(registry.contains("echo"));
        assert!(!registry.contains("missing"));
        assert_eq!(registry.names(), vec!["echo".to_string()]);
    }

    #[tokio::test]
    async fn registered_tool_invokes() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let tool = registry.get("echo").unwrap();
        let mut args = BTreeMap::new();
        args.insert("text".to_string(), "hi".to_string());

        let result = tool.invoke(&args).await.unwrap();
        assert_eq!(result, "hi");
    }
}
