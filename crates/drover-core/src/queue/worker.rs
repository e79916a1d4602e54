use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use super::record::Settlement;
use super::task_queue::TaskQueue;
use crate::domain::ProcessId;
use crate::operation::BoxedOperation;

/// Drive one admitted process to settlement.
///
/// The operation runs in its own task so a timeout can evict the process
/// without cancelling the operation.
pub(super) fn spawn(
    handle: &Handle,
    queue: TaskQueue,
    id: ProcessId,
    operation: BoxedOperation,
    timeout: Duration,
    delay: Duration,
) {
    handle.spawn(drive(queue, id, operation, timeout, delay));
}

async fn drive(
    queue: TaskQueue,
    id: ProcessId,
    operation: BoxedOperation,
    timeout: Duration,
    delay: Duration,
) {
    let mut execution = tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        operation.run().await
    });

    // timer は開始時点で張る（delay も timeout に含まれる）
    tokio::select! {
        joined = &mut execution => {
            queue.settle(id, Settlement::from_join(joined));
        }
        _ = tokio::time::sleep(timeout) => {
            queue.settle(id, Settlement::TimedOut);

            // 実行自体はキャンセルしない。遅れて来た結果は untracked なので無視される
            let weak = queue.downgrade();
            drop(queue);
            let late = execution.await;
            if let Some(queue) = weak.upgrade() {
                queue.settle(id, Settlement::from_join(late));
            } else {
                debug!(process = %id, "queue dropped before late settlement");
            }
        }
    }
}
