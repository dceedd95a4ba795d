use std::fmt;

use log::{debug, error};

use crate::shell::parser::ast::Program;
use crate::utils::config::Config;

use super::pipeline;

#[derive(Debug)]
pub enum ExecError {
    Pipe(nix::Error),
    Fork(nix::Error),
    Wait(nix::Error),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Pipe(err) => write!(f, "pipe: {}", err.desc()),
            ExecError::Fork(err) => write!(f, "fork: {}", err.desc()),
            ExecError::Wait(err) => write!(f, "wait: {}", err.desc()),
        }
    }
}

impl std::error::Error for ExecError {}

/// Drives a [`Program`] pipeline by pipeline, honouring `&&` and `||`.
pub struct Executor {
    prefix: String,
}

impl Executor {
    pub fn new(config: &Config) -> Self {
        Self {
            prefix: config.diagnostic_prefix(),
        }
    }

    pub fn run(&self, program: &Program) -> i32 {
        let mut last_status = 0;

        for (connector, pipeline) in program.steps() {
            let should_run = |status| connector.map_or(true, |c| c.allows(status));
            if let Err(err) = pipeline::run(pipeline, should_run, &mut last_status, &self.prefix) {
                error!("执行失败: {}", err);
                eprintln!("{}: {}", self.prefix, err);
                return 1;
            }
        }

        debug!("最终状态: {}", last_status);
        last_status
    }
}
