//! Resident mode: one background loop per enabled operation, each firing on
//! its configured cadence. All loops share the engine and sync store behind
//! an async mutex, so no two sweeps ever overlap for the same store — the
//! engine's concurrency contract.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use gtdvault_config::{AutoConfig, GtdConfig};
use gtdvault_core::{FsVault, GtdEngine, SyncStateFile, SyncStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    CreateFromTodo,
    UpdateCheckbox,
    UpdateSchedule,
    DeleteCompleted,
    DeleteTrash,
}

impl Op {
    fn enabled(auto: &AutoConfig) -> Vec<Op> {
        let mut ops = Vec::new();
        if auto.create_from_todo {
            ops.push(Op::CreateFromTodo);
        }
        if auto.update_checkbox {
            ops.push(Op::UpdateCheckbox);
        }
        if auto.update_schedule {
            ops.push(Op::UpdateSchedule);
        }
        if auto.delete_completed {
            ops.push(Op::DeleteCompleted);
        }
        if auto.delete_trash {
            ops.push(Op::DeleteTrash);
        }
        ops
    }

    fn name(self) -> &'static str {
        match self {
            Op::CreateFromTodo => "create-from-todo",
            Op::UpdateCheckbox => "update-checkbox",
            Op::UpdateSchedule => "update-schedule",
            Op::DeleteCompleted => "delete-completed",
            Op::DeleteTrash => "delete-trash",
        }
    }

    fn interval_hours(self, auto: &AutoConfig) -> u64 {
        match self {
            Op::CreateFromTodo => auto.create_from_todo_interval_hours,
            Op::UpdateCheckbox => auto.update_checkbox_interval_hours,
            Op::UpdateSchedule => auto.update_schedule_interval_hours,
            Op::DeleteCompleted => auto.delete_completed_interval_hours,
            Op::DeleteTrash => auto.delete_trash_interval_hours,
        }
    }

    /// Whether the operation mutates the sync store, i.e. whether its tick
    /// should be followed by a state save.
    fn mutates_store(self) -> bool {
        !matches!(self, Op::UpdateSchedule)
    }

    async fn run(self, engine: &GtdEngine<FsVault>, store: &mut SyncStore) -> usize {
        match self {
            Op::CreateFromTodo => engine.create_tasks_from_todos(store).await,
            Op::UpdateCheckbox => engine.update_checkboxes_from_tasks(store).await,
            Op::UpdateSchedule => engine.update_overdue_tasks().await,
            Op::DeleteCompleted => engine.delete_completed_tasks(store).await,
            Op::DeleteTrash => engine.delete_trash_tasks(store).await,
        }
    }
}

pub(crate) async fn run(
    engine: GtdEngine<FsVault>,
    store: SyncStore,
    state_file: SyncStateFile,
    config: GtdConfig,
) -> Result<()> {
    let ops = Op::enabled(&config.auto);
    if ops.is_empty() {
        println!("no operations enabled under [auto]; nothing to watch");
        return Ok(());
    }

    let engine = Arc::new(engine);
    let state_file = Arc::new(state_file);
    let store = Arc::new(Mutex::new(store));
    let (shutdown_tx, _) = watch::channel(false);
    let mut loops = Vec::new();

    for op in ops {
        let engine = engine.clone();
        let state_file = state_file.clone();
        let store = store.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        let period = Duration::from_secs(op.interval_hours(&config.auto) * 60 * 60);

        info!(op = op.name(), hours = op.interval_hours(&config.auto), "scheduling periodic operation");
        loops.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(period) => {
                        let mut guard = store.lock().await;
                        let count = op.run(&engine, &mut guard).await;
                        if op.mutates_store() {
                            if let Err(err) = state_file.save(&guard.snapshot()).await {
                                warn!(op = op.name(), error = %err, "failed to persist sync state");
                            }
                        }
                        if count > 0 {
                            info!(op = op.name(), count, "periodic operation complete");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_ok() && *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        }));
    }

    info!("watch mode running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(true);
    for handle in loops {
        let _ = handle.await;
    }

    let guard = store.lock().await;
    state_file.save(&guard.snapshot()).await?;
    info!("sync state saved, bye");
    Ok(())
}
