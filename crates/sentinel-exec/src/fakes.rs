//! In-memory process runner fake (testing only)
//!
//! `FakeProcessRunner` matches each incoming [`ProcessSpec`] against scripted
//! rules in registration order and records every call, so orchestration code
//! can be exercised without spawning anything.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ExecError, Result};
use crate::runner::{ProcessOutput, ProcessRunner, ProcessSpec};

type Responder = Arc<dyn Fn(&ProcessSpec) -> Result<ProcessOutput> + Send + Sync>;

struct Rule {
    needle: String,
    responder: Responder,
    delay: Option<Duration>,
}

/// Scripted [`ProcessRunner`].
///
/// A rule matches when its needle occurs in `program + " " + args`. Calls
/// that match no rule fail with a spawn error, like a missing executable.
#[derive(Default)]
pub struct FakeProcessRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<ProcessSpec>>,
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `output` for calls whose command line contains `needle`.
    pub fn on(self, needle: &str, output: ProcessOutput) -> Self {
        self.respond_with(needle, move |_| Ok(output.clone()))
    }

    /// Same as [`Self::on`] but the reply only arrives after `delay`.
    pub fn on_delayed(mut self, needle: &str, output: ProcessOutput, delay: Duration) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            responder: Arc::new(move |_| Ok(output.clone())),
            delay: Some(delay),
        });
        self
    }

    /// Fail calls whose command line contains `needle` with a spawn error.
    pub fn fail_on(self, needle: &str) -> Self {
        self.respond_with(needle, |spec| {
            Err(ExecError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
            })
        })
    }

    /// Compute the reply from the spec, e.g. to create files a real process
    /// would have left behind.
    pub fn respond_with<F>(mut self, needle: &str, responder: F) -> Self
    where
        F: Fn(&ProcessSpec) -> Result<ProcessOutput> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            needle: needle.to_string(),
            responder: Arc::new(responder),
            delay: None,
        });
        self
    }

    /// Every spec received so far, in call order.
    pub fn calls(&self) -> Vec<ProcessSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose command line contains `needle`.
    pub fn call_count(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|spec| spec.display().contains(needle))
            .count()
    }
}

#[async_trait]
impl ProcessRunner for FakeProcessRunner {
    async fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(spec.clone());

        let line = spec.display();
        let rule = self.rules.iter().find(|rule| line.contains(&rule.needle));

        match rule {
            Some(rule) => {
                if let Some(delay) = rule.delay {
                    tokio::time::sleep(delay).await;
                }
                (rule.responder)(spec)
            }
            None => Err(ExecError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no scripted response for `{line}`"),
                ),
            }),
        }
    }
}
