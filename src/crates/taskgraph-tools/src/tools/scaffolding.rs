//! Project-scaffolding tools: create directories, generate content, write
//! files. Every tool here is confined to a configurable workspace root
//! rather than a hardcoded output folder, so the same binary can scaffold
//! into any project directory a caller points it at.

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use taskgraph_core::llm::LlmClient;
use taskgraph_core::tools::{InputSchema, ParamSchema, Tool};

/// Joins `relative` onto `root`, rejecting absolute paths and any `..`
/// component that would walk back out of `root`.
fn resolve_under_root(root: &Path, relative: &str) -> anyhow::Result<PathBuf> {
    let relative_path = Path::new(relative);
    if relative_path.is_absolute() {
        bail!("path must be relative to the workspace root, got: {relative}");
    }

    let mut stack: Vec<Component> = Vec::new();
    for component in relative_path.components() {
        match component {
            Component::Normal(_) => stack.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if stack.pop().is_none() {
                    bail!("path escapes the workspace root: {relative}");
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                bail!("path must be relative to the workspace root, got: {relative}");
            }
        }
    }

    Ok(stack
        .into_iter()
        .fold(root.to_path_buf(), |acc, c| acc.join(c.as_os_str())))
}

fn required_arg<'a>(args: &'a BTreeMap<String, String>, name: &str) -> anyhow::Result<&'a str> {
    args.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing required argument: {name}"))
}

fn param(param_type: &str, description: &str) -> ParamSchema {
    ParamSchema {
        param_type: param_type.to_string(),
        description: Some(description.to_string()),
    }
}

/// Creates a directory (and any missing parents) under the workspace root.
/// Use before `create_file` tasks that need a nested destination.
pub struct CreateDirectoryTool {
    workspace_root: PathBuf,
}

impl CreateDirectoryTool {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }
}

#[async_trait]
impl Tool for CreateDirectoryTool {
    fn name(&self) -> &str {
        "create_directory"
    }

    fn description(&self) -> &str {
        "Create a directory structure. Use this before create_file when files need to be placed in specific directories."
    }

    fn input_schema(&self) -> InputSchema {
        let mut properties = BTreeMap::new();
        properties.insert(
            "path".to_string(),
            param("string", "directory path, relative to the workspace root"),
        );
        InputSchema {
            properties,
            required: vec!["path".to_string()],
        }
    }

    async fn invoke(&self, args: &BTreeMap<String, String>) -> anyhow::Result<String> {
        let path = required_arg(args, "path")?;
        let resolved = resolve_under_root(&self.workspace_root, path)?;
        tokio::fs::create_dir_all(&resolved)
            .await
            .with_context(|| format!("failed to create directory: {path}"))?;
        Ok(format!("Created directory: {path}"))
    }
}

/// Writes `content` to a file under the workspace root, creating parent
/// directories as needed. `content` typically references a prior
/// `generate_file_content` task's output via `$N` rather than a literal.
pub struct CreateFileTool {
    workspace_root: PathBuf,
}

impl CreateFileTool {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }
}

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &str {
        "create_file"
    }

    fn description(&self) -> &str {
        "Create a file with specified content. Use $N syntax in the content argument to reference output from a generate_file_content task instead of hardcoding it."
    }

    fn input_schema(&self) -> InputSchema {
        let mut properties = BTreeMap::new();
        properties.insert(
            "path".to_string(),
            param("string", "file path, relative to the workspace root"),
        );
        properties.insert(
            "content".to_string(),
            param("string", "file content to write"),
        );
        InputSchema {
            properties,
            required: vec!["path".to_string(), "content".to_string()],
        }
    }

    async fn invoke(&self, args: &BTreeMap<String, String>) -> anyhow::Result<String> {
        let path = required_arg(args, "path")?;
        let content = required_arg(args, "content")?;
        let resolved = resolve_under_root(&self.workspace_root, path)?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create parent directory for: {path}"))?;
        }
        tokio::fs::write(&resolved, content)
            .await
            .with_context(|| format!("failed to write file: {path}"))?;
        Ok(format!("Created file: {path}"))
    }
}

/// Generates file content from a description via an LLM. Downstream
/// `create_file` tasks should reference this task's output with `$N`
/// instead of duplicating the content inline.
pub struct GenerateFileContentTool {
    llm: Arc<dyn LlmClient>,
}

impl GenerateFileContentTool {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Tool for GenerateFileContentTool {
    fn name(&self) -> &str {
        "generate_file_content"
    }

    fn description(&self) -> &str {
        "Generate file content based on a description. Use this instead of hardcoding content in create_file tasks; reference the output with $N syntax."
    }

    fn input_schema(&self) -> InputSchema {
        let mut properties = BTreeMap::new();
        properties.insert(
            "description".to_string(),
            param("string", "what the generated content should accomplish"),
        );
        properties.insert(
            "content_type".to_string(),
            param("string", "kind of content to generate, e.g. \"python\" or \"markdown\""),
        );
        properties.insert(
            "context".to_string(),
            param("string", "optional extra context, often a prior task's $N output"),
        );
        InputSchema {
            properties,
            required: vec!["description".to_string(), "content_type".to_string()],
        }
    }

    async fn invoke(&self, args: &BTreeMap<String, String>) -> anyhow::Result<String> {
        let description = required_arg(args, "description")?;
        let content_type = required_arg(args, "content_type")?;

        let mut prompt = format!("Generate {content_type} content for: {description}");
        if let Some(context) = args.get("context") {
            if !context.is_empty() {
                prompt.push_str(&format!("\nContext: {context}"));
            }
        }

        self.llm
            .invoke(&prompt)
            .await
            .map_err(|e| anyhow!("generate_file_content LLM call failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream::BoxStream;
    use taskgraph_core::error::EngineError;
    use taskgraph_core::llm::Chunk;
    use tempfile::tempdir;

    struct StubLlm {
        response: String,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(&self, _prompt: &str) -> Result<String, EngineError> {
            Ok(self.response.clone())
        }

        async fn stream(
            &self,
            _prompt: &str,
        ) -> Result<BoxStream<'static, Result<Chunk, EngineError>>, EngineError> {
            unimplemented!("not exercised by these tests")
        }
    }

    #[tokio::test]
    async fn create_directory_creates_nested_path() {
        let dir = tempdir().unwrap();
        let tool = CreateDirectoryTool::new(dir.path());

        let mut args = BTreeMap::new();
        args.insert("path".to_string(), "a/b/c".to_string());

        let result = tool.invoke(&args).await.unwrap();
        assert_eq!(result, "Created directory: a/b/c");
        assert!(dir.path().join("a/b/c").is_dir());
    }

    #[tokio::test]
    async fn create_directory_rejects_escaping_path() {
        let dir = tempdir().unwrap();
        let tool = CreateDirectoryTool::new(dir.path());

        let mut args = BTreeMap::new();
        args.insert("path".to_string(), "../escape".to_string());

        assert!(tool.invoke(&args).await.is_err());
    }

    #[tokio::test]
    async fn create_file_writes_content_and_parents() {
        let dir = tempdir().unwrap();
        let tool = CreateFileTool::new(dir.path());

        let mut args = BTreeMap::new();
        args.insert("path".to_string(), "src/main.rs".to_string());
        args.insert("content".to_string(), "fn main() {}".to_string());

        let result = tool.invoke(&args).await.unwrap();
        assert_eq!(result, "Created file: src/main.rs");

        let written = tokio::fs::read_to_string(dir.path().join("src/main.rs"))
            .await
            .unwrap();
        assert_eq!(written, "fn main() {}");
    }

    #[tokio::test]
    async fn create_file_rejects_absolute_path() {
        let dir = tempdir().unwrap();
        let tool = CreateFileTool::new(dir.path());

        let mut args = BTreeMap::new();
        args.insert("path".to_string(), "/etc/passwd".to_string());
        args.insert("content".to_string(), "oops".to_string());

        assert!(tool.invoke(&args).await.is_err());
    }

    #[tokio::test]
    async fn generate_file_content_includes_context_in_prompt() {
        let tool = GenerateFileContentTool::new(Arc::new(StubLlm {
            response: "generated body".to_string(),
        }));

        let mut args = BTreeMap::new();
        args.insert("description".to_string(), "a hello world script".to_string());
        args.insert("content_type".to_string(), "python".to_string());
        args.insert("context".to_string(), "target Python 3.11".to_string());

        let result = tool.invoke(&args).await.unwrap();
        assert_eq!(result, "generated body");
    }

    #[tokio::test]
    async fn generate_file_content_requires_description_and_type() {
        let tool = GenerateFileContentTool::new(Arc::new(StubLlm {
            response: "unused".to_string(),
        }));

        let args = BTreeMap::new();
        assert!(tool.invoke(&args).await.is_err());
    }
}
