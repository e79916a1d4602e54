use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{Duration, sleep};
use tracing::info;

use drover_core::observability::init_tracing;
use drover_core::{
    ConfigError, DroverError, Operation, OperationError, ProcessEvent, QueueConfig, QueueOptions,
    TaskQueue, boxed,
};

/// demo 用のジョブ定義（JSON から読む）
#[derive(Debug, Deserialize)]
struct JobSpec {
    name: String,
    millis: u64,
    #[serde(default)]
    fail: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoFile {
    queue: QueueConfig,
    jobs: Vec<JobSpec>,
}

impl DemoFile {
    fn builtin() -> Self {
        let job = |name: &str, millis, fail| JobSpec {
            name: name.to_string(),
            millis,
            fail,
        };
        Self {
            queue: QueueConfig {
                concurrency: Some(2),
                timeout_ms: 1_000,
                ..QueueConfig::default()
            },
            jobs: vec![
                job("fetch-index", 200, false),
                job("render-report", 400, false),
                job("upload", 150, true),
                job("hang", 5_000, false),
                job("notify", 50, false),
            ],
        }
    }
}

struct SleepOperation {
    name: String,
    millis: u64,
    fail: bool,
}

#[async_trait]
impl Operation for SleepOperation {
    async fn run(self: Box<Self>) -> Result<(), OperationError> {
        sleep(Duration::from_millis(self.millis)).await;
        if self.fail {
            return Err(OperationError::new(format!("{} failed on purpose", self.name)));
        }
        info!(job = %self.name, "job done");
        Ok(())
    }
}

impl From<JobSpec> for SleepOperation {
    fn from(spec: JobSpec) -> Self {
        Self {
            name: spec.name,
            millis: spec.millis,
            fail: spec.fail,
        }
    }
}

fn load(path: Option<String>) -> Result<DemoFile, DroverError> {
    let Some(path) = path else {
        return Ok(DemoFile::builtin());
    };
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone().into(),
        source,
    })?;
    let demo = serde_json::from_str(&raw).map_err(ConfigError::from)?;
    Ok(demo)
}

#[tokio::main]
async fn main() -> Result<(), DroverError> {
    init_tracing("info");

    // (A) 設定を読む（引数なしなら組み込みのジョブ）
    let demo = load(std::env::args().nth(1))?;
    let options = QueueOptions::try_from(demo.queue)?;
    let queue = TaskQueue::new(options);

    // (B) 全イベントを購読して snapshot を JSON で出す
    for event in ProcessEvent::ALL {
        queue.on(event, move |snapshot| {
            match serde_json::to_string(snapshot) {
                Ok(json) => println!("{event}: {json}"),
                Err(e) => tracing::warn!(error = %e, "snapshot encode failed"),
            }
        })?;
    }

    // (C) 投入して開始
    let ids = queue.push(
        demo.jobs
            .into_iter()
            .map(|spec| boxed(SleepOperation::from(spec))),
    );
    info!(count = ids.len(), concurrency = %queue.concurrency(), "jobs queued");
    queue.start();

    // (D) 全部 settle するまで待つ（timeout で外れたものも含む）
    queue.drained().await;
    info!(counts = ?queue.counts(), "queue drained");
    Ok(())
}
