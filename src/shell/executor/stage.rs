use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::process;

use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, dup2, execvp, fork, ForkResult, Pid};

use crate::shell::parser::ast::Command;
use crate::shell::parser::is_space;

const SENTINEL: i64 = 1984;

// Retries on EINTR.
fn syscall<F, T>(mut f: F) -> nix::Result<T>
where
    F: FnMut() -> nix::Result<T>,
{
    loop {
        match f() {
            Err(Errno::EINTR) => (),
            result => return result,
        }
    }
}

/// Pipe `i` carries stage `i`'s stdout to stage `i + 1`'s stdin; dropping closes every end.
pub struct Pipes {
    pairs: Vec<(OwnedFd, OwnedFd)>,
}

impl Pipes {
    pub fn new(count: usize) -> nix::Result<Self> {
        let pairs = (0..count)
            .map(|_| unistd::pipe())
            .collect::<nix::Result<Vec<_>>>()?;
        Ok(Self { pairs })
    }

    fn reader(&self, index: usize) -> Option<RawFd> {
        self.pairs.get(index).map(|(read, _)| read.as_raw_fd())
    }

    fn writer(&self, index: usize) -> Option<RawFd> {
        self.pairs.get(index).map(|(_, write)| write.as_raw_fd())
    }

    // The child never returns to run destructors, so it closes by hand.
    fn close_all(&self) {
        for (read, write) in &self.pairs {
            let _ = unistd::close(read.as_raw_fd());
            let _ = unistd::close(write.as_raw_fd());
        }
    }
}

pub struct Stage<'a> {
    command: &'a Command,
    // None when the name or an argument holds a NUL byte and cannot be passed to exec.
    argv: Option<Vec<CString>>,
}

impl<'a> Stage<'a> {
    pub fn new(command: &'a Command) -> Self {
        let argv = std::iter::once(&command.name)
            .chain(command.args.iter())
            .map(|arg| CString::new(arg.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .ok();
        Self { command, argv }
    }

    pub fn spawn(
        &self,
        index: usize,
        count: usize,
        pipes: &Pipes,
        prefix: &str,
    ) -> nix::Result<SpawnedStage> {
        // SAFETY: the interpreter is single threaded; the child only wires
        // descriptors and then execs or exits.
        match syscall(|| unsafe { fork() })? {
            ForkResult::Parent { child } => Ok(SpawnedStage { pid: child }),
            ForkResult::Child => self.exec(index, count, pipes, prefix),
        }
    }

    fn exec(&self, index: usize, count: usize, pipes: &Pipes, prefix: &str) -> ! {
        match &self.command.input_redirect {
            Some(path) => redirect(path, OFlag::O_RDONLY, libc::STDIN_FILENO, prefix),
            None if index > 0 => connect(pipes.reader(index - 1), libc::STDIN_FILENO),
            None => {}
        }

        match &self.command.output_redirect {
            Some(path) => redirect(
                path,
                OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
                libc::STDOUT_FILENO,
                prefix,
            ),
            None if index + 1 < count => connect(pipes.writer(index), libc::STDOUT_FILENO),
            None => {}
        }

        pipes.close_all();

        // The Rust runtime ignores SIGPIPE and exec keeps ignored dispositions.
        // SAFETY: restoring the default disposition installs no handler.
        let _ = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) };

        if self.command.name.is_empty() {
            process::exit(0);
        }
        if is_sentinel(&self.command.name) {
            drain_stdin();
            process::exit(0);
        }
        if let Some(argv) = &self.argv {
            if let Some(file) = argv.first() {
                let _ = execvp(file, argv);
            }
        }

        eprintln!("{}: {}: command not found", prefix, self.command.name);
        process::exit(127);
    }
}

fn redirect(path: &str, flags: OFlag, target: RawFd, prefix: &str) {
    let fd = match syscall(|| open(path, flags, Mode::from_bits_truncate(0o666))) {
        Ok(fd) => fd,
        Err(err) => {
            eprintln!("{}: {}: {}", prefix, path, err.desc());
            process::exit(1);
        }
    };
    if fd != target {
        let _ = syscall(|| dup2(fd, target));
        let _ = unistd::close(fd);
    }
}

fn connect(pipe_end: Option<RawFd>, target: RawFd) {
    if let Some(fd) = pipe_end {
        let _ = syscall(|| dup2(fd, target));
    }
}

// Reads the leading integer of `name` the way `strtol` does.
fn is_sentinel(name: &str) -> bool {
    let trimmed = name.trim_start_matches(is_space);
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    !negative && unsigned[..end].parse::<i64>() == Ok(SENTINEL)
}

fn drain_stdin() {
    let mut buf = [0u8; 4096];
    loop {
        match unistd::read(libc::STDIN_FILENO, &mut buf) {
            Ok(0) => break,
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
}

pub struct SpawnedStage {
    pid: Pid,
}

impl SpawnedStage {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn wait(self) -> nix::Result<i32> {
        loop {
            match syscall(|| waitpid(self.pid, None))? {
                WaitStatus::Exited(_, code) => return Ok(code),
                WaitStatus::Signaled(_, signal, _) => return Ok(128 + signal as i32),
                _ => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_matches_leading_integer() {
        assert!(is_sentinel("1984"));
        assert!(is_sentinel("+1984"));
        assert!(is_sentinel("01984"));
        assert!(is_sentinel("1984abc"));
        assert!(is_sentinel(" \t1984"));
        assert!(!is_sentinel("\u{a0}1984"));
        assert!(!is_sentinel("-1984"));
        assert!(!is_sentinel("19840"));
        assert!(!is_sentinel("198"));
        assert!(!is_sentinel("cat"));
        assert!(!is_sentinel(""));
    }

    #[test]
    fn test_argv_rejects_nul_bytes() {
        let command = Command {
            name: "echo".to_string(),
            args: vec!["a\0b".to_string()],
            ..Default::default()
        };
        assert!(Stage::new(&command).argv.is_none());

        let command = Command {
            name: "echo".to_string(),
            args: vec!["hi".to_string()],
            ..Default::default()
        };
        let argv = Stage::new(&command).argv;
        assert_eq!(argv.map(|argv| argv.len()), Some(2));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_pipes_allocates_one_pair_per_boundary() {
        let pipes = Pipes::new(2).unwrap();
        assert!(pipes.reader(1).is_some());
        assert!(pipes.writer(1).is_some());
        assert!(pipes.reader(2).is_none());
        assert!(Pipes::new(0).unwrap().writer(0).is_none());
    }
}
