// Job registry: job name -> implementation

use super::BatchedJob;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct JobRegistry {
    jobs: HashMap<String, Arc<dyn BatchedJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job under its own name (replaces an earlier registration)
    pub fn register(&mut self, job: Arc<dyn BatchedJob>) {
        self.jobs.insert(job.name().to_string(), job);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BatchedJob>> {
        self.jobs.get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
