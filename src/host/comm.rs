use std::io::{self, Read};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::mpsc;
use std::thread;

use tracing::{info, trace};

/// Input configuration for the key-event transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommConfig {
    /// Read key events from stdin
    #[default]
    Stdin,
    /// Read key events from a named pipe
    Pipe(PathBuf),
    /// Execute a command and read key events from its stdout
    Exec(String),
    /// Execute a command and read key events from its pty
    #[cfg(feature = "pty")]
    ExecPty(String),
}

impl CommConfig {
    /// Parse command-line arguments into CommConfig
    pub fn from_args(
        pipe: Option<PathBuf>,
        exec: Option<String>,
        exec_pty: Option<String>,
    ) -> Self {
        #[cfg(feature = "pty")]
        if let Some(exec_pty_cmd) = exec_pty {
            return CommConfig::ExecPty(exec_pty_cmd);
        }
        #[cfg(not(feature = "pty"))]
        let _ = exec_pty;

        if let Some(exec_cmd) = exec {
            CommConfig::Exec(exec_cmd)
        } else if let Some(pipe) = pipe {
            CommConfig::Pipe(pipe)
        } else {
            CommConfig::Stdin
        }
    }
}

/// Connect the configured event source to the transport byte channel. The
/// reader thread is detached; it exits on EOF or read error, dropping its
/// sender so the consumer sees a disconnect.
pub fn connect_input(tx: mpsc::SyncSender<u8>, config: CommConfig) -> io::Result<()> {
    match config {
        CommConfig::Stdin => {
            info!("Reading key events from stdin");
            spawn_reader("stdin", io::stdin(), tx);
            Ok(())
        }
        CommConfig::Pipe(path) => connect_pipe(tx, path),
        CommConfig::Exec(cmd) => connect_exec(tx, cmd),
        #[cfg(feature = "pty")]
        CommConfig::ExecPty(cmd) => connect_exec_pty(tx, cmd),
    }
}

fn spawn_reader(label: &'static str, mut source: impl Read + Send + 'static, tx: mpsc::SyncSender<u8>) {
    thread::spawn(move || {
        loop {
            let mut buf = [0; 1];
            match source.read(&mut buf) {
                Ok(n) if n > 0 => {
                    if !tx.send(buf[0]).is_ok() {
                        break;
                    }
                }
                Ok(_) => break, // EOF (read 0 bytes)
                Err(_) => break,
            }
        }
        trace!("{label} read thread exited");
    });
}

fn connect_pipe(tx: mpsc::SyncSender<u8>, path: PathBuf) -> io::Result<()> {
    info!("Reading key events from {:?}", path);
    let pipe = std::fs::OpenOptions::new().read(true).open(&path)?;
    spawn_reader("pipe", pipe, tx);
    Ok(())
}

fn connect_exec(tx: mpsc::SyncSender<u8>, cmd_string: String) -> io::Result<()> {
    info!("Reading key events from shell process {:?}", cmd_string);

    if cmd_string.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Empty command string",
        ));
    }

    // Spawn command via shell
    let mut child = std::process::Command::new("/bin/sh")
        .arg("-c")
        .arg(&cmd_string)
        .stderr(Stdio::null())
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .spawn()?;

    let stdout = child.stdout.take().unwrap();
    spawn_reader("exec", stdout, tx);
    Ok(())
}

#[cfg(feature = "pty")]
fn connect_exec_pty(tx: mpsc::SyncSender<u8>, cmd_string: String) -> io::Result<()> {
    use pty_process::blocking::Command;
    use std::fs::File;
    use std::os::fd::OwnedFd;

    info!("Reading key events from shell process PTY {:?}", cmd_string);

    if cmd_string.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Empty command string",
        ));
    }

    let (pty, pts) = pty_process::blocking::open().map_err(io::Error::other)?;
    pty.resize(pty_process::Size::new(24, 80))
        .map_err(io::Error::other)?;

    let _child = Command::new("/bin/sh")
        .arg("-c")
        .arg(&cmd_string)
        .spawn(pts)
        .map_err(io::Error::other)?;

    let pty = File::from(OwnedFd::from(pty));
    spawn_reader("pty", pty, tx);
    Ok(())
}
