use log::debug;

use crate::shell::parser::ast::Pipeline;

use super::executor::ExecError;
use super::stage::{Pipes, Stage};

// A skipped pipeline leaves `last_status` untouched.
pub fn run<F>(
    pipeline: &Pipeline,
    should_run: F,
    last_status: &mut i32,
    prefix: &str,
) -> Result<(), ExecError>
where
    F: FnOnce(i32) -> bool,
{
    if !should_run(*last_status) {
        debug!("跳过管道 (上一个状态 {}): {}", last_status, pipeline);
        return Ok(());
    }
    debug!("执行管道: {}", pipeline);

    let count = pipeline.commands.len();
    let stages: Vec<Stage> = pipeline.commands.iter().map(Stage::new).collect();
    let pipes = Pipes::new(count.saturating_sub(1)).map_err(ExecError::Pipe)?;

    let mut spawned = Vec::with_capacity(count);
    let mut fork_error = None;
    for (index, stage) in stages.iter().enumerate() {
        match stage.spawn(index, count, &pipes, prefix) {
            Ok(child) => {
                debug!("阶段 {} 已启动, pid {}", index, child.pid());
                spawned.push(child);
            }
            Err(err) => {
                fork_error = Some(err);
                break;
            }
        }
    }

    // Readers only see end-of-stream once the parent's write ends are gone.
    drop(pipes);

    let mut statuses = Vec::with_capacity(spawned.len());
    let mut wait_error = None;
    for (index, child) in spawned.into_iter().enumerate() {
        let pid = child.pid();
        match child.wait() {
            Ok(status) => {
                debug!("阶段 {} (pid {}) 退出, 状态 {}", index, pid, status);
                statuses.push(status);
            }
            Err(err) => {
                if wait_error.is_none() {
                    wait_error = Some(err);
                }
            }
        }
    }

    if let Some(err) = fork_error {
        return Err(ExecError::Fork(err));
    }
    if let Some(err) = wait_error {
        return Err(ExecError::Wait(err));
    }
    if let Some(status) = statuses.last() {
        *last_status = *status;
    }
    Ok(())
}
