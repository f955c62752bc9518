//! Scheduler (Task Fetching Unit)
//!
//! Consumes the planner's lazy task sequence and dispatches each task as
//! soon as its dependencies are satisfied, overlapping execution with
//! planning. Writes to the shared result map are single-writer-per-key;
//! a task that is already present in the seeded result map (a completed
//! task from a prior replan round) is skipped entirely.

use crate::config::ExecutionConfig;
use crate::error::EngineError;
use crate::message::Message;
use crate::parser::substitute_refs;
use crate::task::{Task, TaskResult};
use crate::tools::{Tool, ToolRegistry};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock, Semaphore};
use tracing::{error, warn};

/// Shared, concurrency-safe result map: atomic insert-if-absent, readers
/// tolerate absent keys.
pub type ResultMap = Arc<RwLock<BTreeMap<u32, String>>>;

pub struct Scheduler {
    registry: ToolRegistry,
    config: ExecutionConfig,
}

impl Scheduler {
    pub fn new(registry: ToolRegistry, config: ExecutionConfig) -> Self {
        Self { registry, config }
    }

    /// Drain `rx` until the planner closes it, dispatching each non-`join`
    /// task once its dependencies resolve. `initial_results` seeds the
    /// result map with prior rounds' outcomes (replan mode); tasks whose
    /// `idx` is already present there are treated as already completed
    /// and are never dispatched. Returns one `Message::Tool` per newly
    /// executed task, ordered by `idx`.
    ///
    /// Fails with `EngineError::InvalidGraph` if a task's dependency is
    /// never satisfied: a deadlock watchdog aborts a waiter once the
    /// planner has stopped producing tasks and a full `retry_after` cycle
    /// passes with no new result written anywhere.
    pub async fn run(
        &self,
        mut rx: mpsc::Receiver<Task>,
        initial_results: BTreeMap<u32, String>,
    ) -> Result<Vec<Message>, EngineError> {
        let results: ResultMap = Arc::new(RwLock::new(initial_results));
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_tasks.max(1)));
        let retry_after = Duration::from_millis(self.config.retry_after_ms);
        let timeout = Duration::from_secs(self.config.task_timeout_secs);
        let progress = Arc::new(AtomicU64::new(0));
        let planner_done = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::new();

        while let Some(task) = rx.recv().await {
            if task.is_join() {
                continue;
            }
            if results.read().await.contains_key(&task.idx) {
                continue;
            }

            let registry = self.registry.clone();
            let results = Arc::clone(&results);
            let semaphore = Arc::clone(&semaphore);
            let progress = Arc::clone(&progress);
            let planner_done = Arc::clone(&planner_done);
            let task_args = task.args.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed while the scheduler runs");

                wait_for_dependencies(&task, &results, retry_after, &progress, &planner_done)
                    .await?;

                let resolved_args = {
                    let map = results.read().await;
                    resolve_args(&task.args, &map)
                };

                let content = match registry.get(&task.tool) {
                    Some(tool) => execute_tool(tool.as_ref(), &resolved_args, timeout).await,
                    None => {
                        let result = TaskResult::error(
                            task.idx,
                            format!("tool '{}' is not registered", task.tool),
                        );
                        result.content
                    }
                };

                {
                    let mut map = results.write().await;
                    // Single-writer-per-key: never overwrite an existing entry.
                    map.entry(task.idx).or_insert_with(|| content.clone());
                }
                progress.fetch_add(1, Ordering::SeqCst);

                Ok(Message::Tool {
                    idx: task.idx,
                    tool_name: task.tool,
                    args: task_args,
                    content,
                })
            }));
        }
        planner_done.store(true, Ordering::SeqCst);

        let mut messages = Vec::with_capacity(handles.len());
        let mut graph_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(message)) => messages.push(message),
                Ok(Err(err)) => {
                    error!(error = %err, "task dependency deadlock detected");
                    graph_error.get_or_insert(err);
                }
                Err(join_err) => error!(error = %join_err, "task dispatch panicked"),
            }
        }

        if let Some(err) = graph_error {
            return Err(err);
        }

        messages.sort_by_key(|m| match m {
            Message::Tool { idx, .. } => *idx,
            _ => u32::MAX,
        });
        Ok(messages)
    }
}

async fn wait_for_dependencies(
    task: &Task,
    results: &ResultMap,
    retry_after: Duration,
    progress: &AtomicU64,
    planner_done: &AtomicBool,
) -> Result<(), EngineError> {
    loop {
        let (ready, missing) = {
            let map = results.read().await;
            let missing: Vec<u32> = task
                .dependencies
                .iter()
                .copied()
                .filter(|dep| !map.contains_key(dep))
                .collect();
            (missing.is_empty(), missing)
        };
        if ready {
            return Ok(());
        }

        let progress_before = progress.load(Ordering::SeqCst);
        tokio::time::sleep(retry_after).await;

        if planner_done.load(Ordering::SeqCst) && progress.load(Ordering::SeqCst) == progress_before {
            return Err(EngineError::InvalidGraph(format!(
                "task {} never saw dependencies {:?} produced (cycle or missing index)",
                task.idx, missing
            )));
        }
    }
}

async fn execute_tool(
    tool: &dyn Tool,
    args: &BTreeMap<String, String>,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, tool.invoke(args)).await {
        Ok(Ok(content)) => content,
        Ok(Err(err)) => {
            warn!(tool = tool.name(), error = %err, "tool invocation failed");
            format!("ERROR: {}", err)
        }
        Err(_) => {
            warn!(tool = tool.name(), ?timeout, "tool invocation timed out");
            format!("ERROR: tool '{}' timed out after {:?}", tool.name(), timeout)
        }
    }
}

fn resolve_args(
    args: &BTreeMap<String, String>,
    results: &BTreeMap<u32, String>,
) -> BTreeMap<String, String> {
    args.iter()
        .map(|(key, value)| (key.clone(), substitute_refs(value, results)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::InputSchema;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct RecordingTool {
        order: Arc<std::sync::Mutex<Vec<String>>>,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            "record"
        }
        fn description(&self) -> &str {
            "records its invocation"
        }
        fn input_schema(&self) -> InputSchema {
            InputSchema::default()
        }
        async fn invoke(&self, args: &BTreeMap<String, String>) -> anyhow::Result<String> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                anyhow::bail!("boom");
            }
            let content = args.get("content").cloned().unwrap_or_default();
            self.order.lock().unwrap().push(content.clone());
            Ok(content)
        }
    }

    fn task(idx: u32, content: &str, deps: Vec<u32>) -> Task {
        let mut args = BTreeMap::new();
        args.insert("content".to_string(), content.to_string());
        Task {
            idx,
            tool: "record".to_string(),
            args,
            dependencies: deps,
        }
    }

    async fn drive(tasks: Vec<Task>, registry: ToolRegistry, config: ExecutionConfig) -> Vec<Message> {
        let (tx, rx) = mpsc::channel(16);
        for t in tasks {
            tx.send(t).await.unwrap();
        }
        drop(tx);
        let scheduler = Scheduler::new(registry, config);
        scheduler.run(rx, BTreeMap::new()).await.unwrap()
    }

    #[tokio::test]
    async fn deep_chain_executes_in_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(RecordingTool {
            order: Arc::clone(&order),
            delay: Duration::from_millis(5),
            fail: false,
        }));

        let tasks = vec![
            task(1, "a", vec![]),
            task(2, "$1-b", vec![1]),
            task(3, "$2-c", vec![2]),
        ];
        let messages = drive(tasks, registry, ExecutionConfig::default()).await;

        let idxs: Vec<u32> = messages
            .iter()
            .map(|m| match m {
                Message::Tool { idx, .. } => *idx,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(idxs, vec![1, 2, 3]);
        assert_eq!(*order.lock().unwrap(), vec!["a", "a-b", "a-b-c"]);
    }

    #[tokio::test]
    async fn independent_tasks_overlap_and_output_is_idx_ordered() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(RecordingTool {
            order: Arc::clone(&order),
            delay: Duration::from_millis(5),
            fail: false,
        }));

        let tasks = vec![task(2, "second", vec![]), task(1, "first", vec![])];
        let messages = drive(tasks, registry, ExecutionConfig::default()).await;

        let idxs: Vec<u32> = messages
            .iter()
            .map(|m| match m {
                Message::Tool { idx, .. } => *idx,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(idxs, vec![1, 2]);
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its content arg"
        }
        fn input_schema(&self) -> InputSchema {
            InputSchema::default()
        }
        async fn invoke(&self, args: &BTreeMap<String, String>) -> anyhow::Result<String> {
            Ok(args.get("content").cloned().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn tool_failure_is_non_fatal_and_propagates_error_string() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(RecordingTool {
            order: Arc::clone(&order),
            delay: Duration::from_millis(1),
            fail: true,
        }));
        registry.register(Arc::new(EchoTool));

        let mut second = task(2, "$1", vec![1]);
        second.tool = "echo".to_string();
        let tasks = vec![task(1, "x", vec![]), second];
        let messages = drive(tasks, registry, ExecutionConfig::default()).await;

        let contents: BTreeMap<u32, String> = messages
            .into_iter()
            .map(|m| match m {
                Message::Tool { idx, content, .. } => (idx, content),
                _ => unreachable!(),
            })
            .collect();
        assert!(contents[&1].starts_with("ERROR: "));
        assert!(contents[&2].starts_with("ERROR: "));
    }

    #[tokio::test]
    async fn join_tasks_are_never_dispatched() {
        let registry = ToolRegistry::new();
        let tasks = vec![Task {
            idx: 1,
            tool: crate::task::JOIN_TOOL.to_string(),
            args: BTreeMap::new(),
            dependencies: vec![],
        }];
        let messages = drive(tasks, registry, ExecutionConfig::default()).await;
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn already_completed_tasks_are_skipped() {
        static INVOCATIONS: AtomicU32 = AtomicU32::new(0);

        struct CountingTool;
        #[async_trait]
        impl Tool for CountingTool {
            fn name(&self) -> &str {
                "record"
            }
            fn description(&self) -> &str {
                "counts invocations"
            }
            fn input_schema(&self) -> InputSchema {
                InputSchema::default()
            }
            async fn invoke(&self, _args: &BTreeMap<String, String>) -> anyhow::Result<String> {
                INVOCATIONS.fetch_add(1, Ordering::SeqCst);
                Ok("done".to_string())
            }
        }

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CountingTool));

        let (tx, rx) = mpsc::channel(4);
        tx.send(task(1, "x", vec![])).await.unwrap();
        drop(tx);

        let mut seeded = BTreeMap::new();
        seeded.insert(1, "already-done".to_string());

        let scheduler = Scheduler::new(registry, ExecutionConfig::default());
        let messages = scheduler.run(rx, seeded).await.unwrap();

        assert!(messages.is_empty());
        assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dependency_never_satisfied_fails_as_invalid_graph() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        // Task 2 depends on task 1, but task 1 is never sent: the planner
        // closes the channel having only produced task 2.
        let mut second = task(2, "$1", vec![1]);
        second.tool = "echo".to_string();
        let (tx, rx) = mpsc::channel(4);
        tx.send(second).await.unwrap();
        drop(tx);

        let mut config = ExecutionConfig::default();
        config.retry_after_ms = 5;

        let scheduler = Scheduler::new(registry, config);
        let result = scheduler.run(rx, BTreeMap::new()).await;

        assert!(matches!(result, Err(EngineError::InvalidGraph(_))));
    }
}
