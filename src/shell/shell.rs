use log::{debug, warn};

use crate::shell::executor::Executor;
use crate::shell::parser;
use crate::utils::config::Config;

const SYNTAX_ERROR_STATUS: i32 = 2;

pub struct Shell<'a> {
    config: &'a Config,
    executor: Executor,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            executor: Executor::new(config),
        }
    }

    pub fn run(&self, line: &str) -> i32 {
        debug!("收到命令: {:?}", line);

        let program = match parser::parse(line) {
            Ok(program) => program,
            Err(e) => {
                warn!("解析失败: {}", e);
                eprintln!("{}: syntax error: {}", self.config.diagnostic_prefix(), e);
                return SYNTAX_ERROR_STATUS;
            }
        };
        debug!(
            "解析结果: {} 个管道, {} 个连接符",
            program.pipelines.len(),
            program.connectors.len()
        );

        self.executor.run(&program)
    }
}
