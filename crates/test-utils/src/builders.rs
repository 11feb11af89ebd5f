#![allow(dead_code)]

use caesium_console::events::{CaesiumEvent, EventKind};
use caesium_console::model::{DagEdge, DagNode, JobDag, JobRun, Status, TaskRun};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Fixed instant used wherever a test needs "now".
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Builder for `JobRun` to simplify test setup.
pub struct RunBuilder {
    run: JobRun,
}

impl RunBuilder {
    pub fn new(run_id: &str) -> Self {
        Self {
            run: JobRun {
                id: run_id.to_string(),
                job_id: "job-1".to_string(),
                status: Status::Pending,
                error: None,
                created_at: Some(fixed_now()),
                started_at: None,
                completed_at: None,
                updated_at: None,
                tasks: Vec::new(),
            },
        }
    }

    pub fn job(mut self, job_id: &str) -> Self {
        self.run.job_id = job_id.to_string();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.run.status = status;
        self
    }

    pub fn error(mut self, error: &str) -> Self {
        self.run.error = Some(error.to_string());
        self
    }

    pub fn task(mut self, task: TaskRun) -> Self {
        self.run.tasks.push(task);
        self
    }

    /// Add a task with the given status, owned by this run.
    pub fn with_task(self, task_id: &str, status: Status) -> Self {
        let task = TaskRunBuilder::new(task_id)
            .run(&self.run.id)
            .status(status)
            .build();
        self.task(task)
    }

    pub fn build(self) -> JobRun {
        self.run
    }
}

/// Builder for `TaskRun`.
pub struct TaskRunBuilder {
    task: TaskRun,
}

impl TaskRunBuilder {
    pub fn new(task_id: &str) -> Self {
        Self {
            task: TaskRun {
                id: task_id.to_string(),
                job_run_id: "run-1".to_string(),
                task_id: task_id.to_string(),
                atom_id: format!("atom-{task_id}"),
                engine: "docker".to_string(),
                image: "alpine:3".to_string(),
                command: vec!["echo".to_string(), task_id.to_string()],
                status: Status::Pending,
                result: None,
                error: None,
                runtime_id: None,
                claimed_by: None,
                started_at: None,
                completed_at: None,
                created_at: Some(fixed_now()),
                updated_at: None,
            },
        }
    }

    pub fn run(mut self, run_id: &str) -> Self {
        self.task.job_run_id = run_id.to_string();
        self
    }

    pub fn atom(mut self, atom_id: &str) -> Self {
        self.task.atom_id = atom_id.to_string();
        self
    }

    pub fn image(mut self, image: &str) -> Self {
        self.task.image = image.to_string();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.task.status = status;
        self
    }

    pub fn error(mut self, error: &str) -> Self {
        self.task.error = Some(error.to_string());
        self
    }

    pub fn build(self) -> TaskRun {
        self.task
    }
}

/// Builder for `JobDag`.
pub struct DagBuilder {
    dag: JobDag,
}

impl DagBuilder {
    pub fn new(job_id: &str) -> Self {
        Self {
            dag: JobDag {
                job_id: job_id.to_string(),
                nodes: Vec::new(),
                edges: Vec::new(),
            },
        }
    }

    /// Add a node whose atom id is `atom-{id}`.
    pub fn node(self, id: &str) -> Self {
        let atom = format!("atom-{id}");
        self.node_with_atom(id, &atom)
    }

    pub fn node_with_atom(mut self, id: &str, atom_id: &str) -> Self {
        self.dag.nodes.push(DagNode {
            id: id.to_string(),
            atom_id: atom_id.to_string(),
            next_id: None,
            successors: Vec::new(),
        });
        self
    }

    pub fn edge(mut self, from: &str, to: &str) -> Self {
        self.dag.edges.push(DagEdge::new(from, to));
        self
    }

    /// Nodes linked one after another: `ids[0] -> ids[1] -> ...`.
    pub fn chain(mut self, ids: &[&str]) -> Self {
        for id in ids {
            self = self.node(id);
        }
        for pair in ids.windows(2) {
            self = self.edge(pair[0], pair[1]);
        }
        self
    }

    pub fn build(self) -> JobDag {
        self.dag
    }
}

/// Builder for feed events.
pub struct EventBuilder {
    event: CaesiumEvent,
}

impl EventBuilder {
    pub fn new(kind: EventKind) -> Self {
        Self {
            event: CaesiumEvent::new(kind),
        }
    }

    /// A task event for `task_id` in `run_id`, with a matching payload.
    pub fn task(kind: EventKind, run_id: &str, task_id: &str) -> Self {
        Self::new(kind)
            .run(run_id)
            .task_id(task_id)
            .payload(serde_json::json!({
                "id": task_id,
                "job_run_id": run_id,
                "task_id": task_id,
            }))
    }

    pub fn job(mut self, job_id: &str) -> Self {
        self.event.job_id = Some(job_id.to_string());
        self
    }

    pub fn run(mut self, run_id: &str) -> Self {
        self.event.run_id = Some(run_id.to_string());
        self
    }

    pub fn task_id(mut self, task_id: &str) -> Self {
        self.event.task_id = Some(task_id.to_string());
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.event.payload = Some(payload);
        self
    }

    pub fn build(self) -> CaesiumEvent {
        self.event
    }

    /// The event as one complete `text/event-stream` frame.
    pub fn frame(self) -> Vec<u8> {
        sse_frame(&self.event)
    }
}

/// Encode `event` the way the server does: an `event:` line, one `data:`
/// line of JSON and a blank line.
pub fn sse_frame(event: &CaesiumEvent) -> Vec<u8> {
    let data = serde_json::to_string(event).unwrap_or_default();
    format!("event: {}\ndata: {}\n\n", event.event_type, data).into_bytes()
}
