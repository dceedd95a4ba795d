use crate::utils::config::Config;
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process;

pub fn init_logger(config: &Config) {
    let level = parse_level(&config.logger_level);

    // stdout belongs to the pipeline being run, so logs go to stderr
    let mut writers: Vec<Box<dyn Write + Send + Sync>> = vec![Box::new(io::stderr())];
    if let Some(dir) = config.logger_dir.as_deref().filter(|_| level != LevelFilter::Off) {
        match open_log_file(dir, &config.name) {
            Ok(file) => writers.push(Box::new(file)),
            Err(e) => eprintln!(
                "{}: 无法打开日志文件 {}: {}",
                config.name,
                dir.display(),
                e
            ),
        }
    }

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[PID:{}][{}] {} - {}",
                process::id(),
                record.level(),
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(MultiWriter { writers })))
        .filter(Some(&config.name), level)
        .filter(None, LevelFilter::Warn)
        .init();

    log::debug!("日志级别设置为: {}", level);
}

fn parse_level(level: &str) -> LevelFilter {
    match level {
        level if level.eq_ignore_ascii_case("off") => LevelFilter::Off,
        level if level.eq_ignore_ascii_case("error") => LevelFilter::Error,
        level if level.eq_ignore_ascii_case("warn") => LevelFilter::Warn,
        level if level.eq_ignore_ascii_case("info") => LevelFilter::Info,
        level if level.eq_ignore_ascii_case("debug") => LevelFilter::Debug,
        level if level.eq_ignore_ascii_case("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

// One file per day, shared by every invocation of that day.
fn open_log_file(dir: &Path, name: &str) -> io::Result<File> {
    fs::create_dir_all(dir)?;
    let date = Local::now().format("%Y-%m-%d");
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("{}_{}.log", name, date)))
}

struct MultiWriter {
    writers: Vec<Box<dyn Write + Send + Sync>>,
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for writer in &mut self.writers {
            writer.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}
