//! Plan Parser
//!
//! Converts a raw text buffer (a growing prefix of the planner's streaming
//! output) into a set of fully-parseable [`Task`] records, each emitted
//! exactly once. Malformed lines are silently dropped; an unknown tool
//! name (neither registered nor the `join` sentinel) is also dropped, on
//! the assumption that the planner will self-correct on the next line.
//!
//! ```text
//! <task>      ::= <idx> "." <tool> "(" <args> ")" ["(deps:" "[" <deplist> "]" ")"]
//! <idx>       ::= positive decimal integer
//! <tool>      ::= identifier
//! <args>      ::= <kv> ("," <kv>)* | ε
//! <kv>        ::= <key> "=" <value>
//! <value>     ::= quoted string | unquoted token   (quotes are stripped)
//! <deplist>   ::= <int> ("," <int>)* | ε
//! ```

use crate::task::{Task, JOIN_TOOL};
use crate::tools::ToolRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        ^\s*
        (?P<idx>\d+)\s*\.\s*
        (?P<tool>[A-Za-z_][A-Za-z0-9_]*)
        \s*\(\s*(?P<args>.*?)\s*\)\s*
        (?:\(\s*deps:\s*\[\s*(?P<deps>.*?)\s*\]\s*\))?
        \s*$
        "#,
    )
    .expect("static line regex is valid")
});

static KV_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        (?P<key>[A-Za-z_][A-Za-z0-9_]*)
        \s*=\s*
        (?:'(?P<sq>[^']*)'|"(?P<dq>[^"]*)"|(?P<bare>[^,]+))
        "#,
    )
    .expect("static kv regex is valid")
});

static REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{?(\d+)\}?").expect("static ref regex is valid"));

/// Stateful, incremental parser. Tracks which indices have already been
/// emitted so a duplicate line reappearing in a growing buffer is ignored.
pub struct PlanParser {
    seen: BTreeSet<u32>,
}

impl PlanParser {
    pub fn new() -> Self {
        Self {
            seen: BTreeSet::new(),
        }
    }

    /// Parse every completed line currently in `buffer`, returning newly
    /// recognized tasks in order of first appearance. Lines already
    /// emitted (by `idx`) are skipped. Does not consume `buffer`; callers
    /// drive chunk accumulation and line splitting themselves (see the
    /// planner module).
    pub fn feed_lines<'a, I: Iterator<Item = &'a str>>(
        &mut self,
        lines: I,
        registry: &ToolRegistry,
    ) -> Vec<Task> {
        let mut out = Vec::new();
        for line in lines {
            if let Some(task) = self.parse_line(line, registry) {
                out.push(task);
            }
        }
        out
    }

    /// Parse a single line. Returns `None` if the line is malformed,
    /// references an unregistered non-`join` tool, or duplicates an
    /// already-emitted index.
    pub fn parse_line(&mut self, line: &str, registry: &ToolRegistry) -> Option<Task> {
        let caps = LINE_RE.captures(line)?;

        let idx: u32 = caps.name("idx")?.as_str().parse().ok()?;
        if self.seen.contains(&idx) {
            return None;
        }

        let tool = caps.name("tool")?.as_str().to_string();
        if tool != JOIN_TOOL && !registry.contains(&tool) {
            return None;
        }

        let args_str = caps.name("args").map(|m| m.as_str()).unwrap_or("");
        let args = parse_args(args_str);

        let mut dependencies: BTreeSet<u32> = BTreeSet::new();
        for value in args.values() {
            for cap in REF_RE.captures_iter(value) {
                if let Ok(n) = cap[1].parse::<u32>() {
                    dependencies.insert(n);
                }
            }
        }
        if let Some(deps_str) = caps.name("deps").map(|m| m.as_str()) {
            for part in deps_str.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                if let Ok(n) = part.parse::<u32>() {
                    dependencies.insert(n);
                }
            }
        }

        let task = Task {
            idx,
            tool,
            args,
            dependencies: dependencies.into_iter().collect(),
        };

        if task.validate_local().is_err() {
            return None;
        }

        self.seen.insert(idx);
        Some(task)
    }
}

impl Default for PlanParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_args(args_str: &str) -> BTreeMap<String, String> {
    let mut args = BTreeMap::new();
    if args_str.trim().is_empty() {
        return args;
    }
    for cap in KV_RE.captures_iter(args_str) {
        let key = cap["key"].to_string();
        let value = if let Some(m) = cap.name("sq") {
            m.as_str().to_string()
        } else if let Some(m) = cap.name("dq") {
            m.as_str().to_string()
        } else {
            cap["bare"].trim().to_string()
        };
        args.insert(key, value);
    }
    args
}

/// Substitute every `$N` / `${N}` placeholder in `value` with the string
/// form of `results[N]`. A reference whose index is absent from `results`
/// is left literal (only possible if the graph was invalid).
pub fn substitute_refs(value: &str, results: &BTreeMap<u32, String>) -> String {
    REF_RE
        .replace_all(value, |caps: &regex::Captures| {
            let idx: u32 = caps[1].parse().expect("ref regex captures only digits");
            match results.get(&idx) {
                Some(result) => result.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Split a growing buffer into (completed lines, remaining partial tail).
/// Used by the planner to feed whole lines to the parser as chunks arrive.
pub fn split_complete_lines(buffer: &str) -> (Vec<&str>, &str) {
    match buffer.rfind('\n') {
        Some(pos) => (buffer[..pos].lines().collect(), &buffer[pos + 1..]),
        None => (Vec::new(), buffer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{InputSchema, Tool};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StubTool(&'static str);

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn input_schema(&self) -> InputSchema {
            InputSchema::default()
        }
        async fn invoke(&self, _args: &BTreeMap<String, String>) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        r.register(Arc::new(StubTool("gen")));
        r.register(Arc::new(StubTool("write")));
        r
    }

    #[test]
    fn parses_simple_task_with_quoted_args() {
        let mut parser = PlanParser::new();
        let reg = registry();
        let task = parser
            .parse_line("1. gen(desc='html')", &reg)
            .expect("should parse");
        assert_eq!(task.idx, 1);
        assert_eq!(task.tool, "gen");
        assert_eq!(task.args.get("desc"), Some(&"html".to_string()));
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn parses_explicit_deps_clause() {
        let mut parser = PlanParser::new();
        let reg = registry();
        let task = parser
            .parse_line("3. write(path='a', content='x') (deps: [1, 2])", &reg)
            .expect("should parse");
        assert_eq!(task.dependencies, vec![1, 2]);
    }

    #[test]
    fn derives_deps_from_dollar_refs() {
        let mut parser = PlanParser::new();
        let reg = registry();
        let task = parser
            .parse_line("3. write(path='a', content='$1')", &reg)
            .expect("should parse");
        assert_eq!(task.dependencies, vec![1]);
    }

    #[test]
    fn merges_dollar_refs_and_explicit_deps() {
        let mut parser = PlanParser::new();
        let reg = registry();
        let task = parser
            .parse_line("3. write(path='a', content='$1') (deps: [2])", &reg)
            .expect("should parse");
        assert_eq!(task.dependencies, vec![1, 2]);
    }

    #[test]
    fn drops_duplicate_idx() {
        let mut parser = PlanParser::new();
        let reg = registry();
        assert!(parser.parse_line("1. gen(desc='x')", &reg).is_some());
        assert!(parser.parse_line("1. gen(desc='x')", &reg).is_none());
    }

    #[test]
    fn drops_unknown_tool() {
        let mut parser = PlanParser::new();
        let reg = registry();
        assert!(parser.parse_line("1. nonexistent(x='y')", &reg).is_none());
    }

    #[test]
    fn accepts_join_sentinel() {
        let mut parser = PlanParser::new();
        let reg = registry();
        let task = parser.parse_line("5. join() (deps: [1,2])", &reg).unwrap();
        assert!(task.is_join());
    }

    #[test]
    fn drops_malformed_line() {
        let mut parser = PlanParser::new();
        let reg = registry();
        assert!(parser.parse_line("2. BROKEN(", &reg).is_none());
    }

    #[test]
    fn drops_forward_reference() {
        let mut parser = PlanParser::new();
        let reg = registry();
        assert!(parser
            .parse_line("1. write(content='$2') (deps: [2])", &reg)
            .is_none());
    }

    #[test]
    fn parse_robustness_scenario() {
        let mut parser = PlanParser::new();
        let reg = registry();
        let buffer = "1. gen(desc='x')\n2. BROKEN(\n3. gen(desc='y')";
        let (lines, tail) = split_complete_lines(buffer);
        let mut tasks = parser.feed_lines(lines.into_iter(), &reg);
        if let Some(task) = parser.parse_line(tail, &reg) {
            tasks.push(task);
        }
        let idxs: Vec<u32> = tasks.iter().map(|t| t.idx).collect();
        assert_eq!(idxs, vec![1, 3]);
    }

    #[test]
    fn tolerates_whitespace_everywhere() {
        let mut parser = PlanParser::new();
        let reg = registry();
        let task = parser
            .parse_line("  1 .  gen ( desc = 'x' )  ( deps: [ ] )  ", &reg)
            .expect("should parse despite whitespace");
        assert_eq!(task.idx, 1);
    }

    #[test]
    fn substitute_refs_replaces_resolved_and_leaves_missing() {
        let mut results = BTreeMap::new();
        results.insert(1u32, "html".to_string());
        assert_eq!(substitute_refs("body=$1", &results), "body=html");
        assert_eq!(substitute_refs("body=${1}", &results), "body=html");
        assert_eq!(substitute_refs("body=$2", &results), "body=$2");
    }

    #[test]
    fn split_complete_lines_holds_trailing_partial() {
        let (lines, tail) = split_complete_lines("1. gen(x='y')\n2. gen(x=");
        assert_eq!(lines, vec!["1. gen(x='y')"]);
        assert_eq!(tail, "2. gen(x=");
    }
}
