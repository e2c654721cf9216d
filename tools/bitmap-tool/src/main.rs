//! Host-side driver for the placement policies.
//!
//! ```text
//! bitmap-tool alloc --policy <policy> --size <bits> [--save <file>] <cnt>...
//! bitmap-tool dump --size <bits> [--hex] <file>
//! ```
//!
//! `alloc` claims each count in order and prints the offset, or `NOT_FOUND`.
//! `dump` loads a saved bitmap and prints it one word per line, or as hex.

mod disk;
mod logger;

use disk::DiskFile;
use kernel_bitmap::policy::ParsePolicyError;
use kernel_bitmap::{
    Bitmap, BitmapDump, BitmapError, BitmapPersist, NOT_FOUND, PersistError, Policy, ScanEngine,
};
use log::info;
use logger::StderrLogger;
use std::fs::{File, OpenOptions};
use std::process::ExitCode;
use std::{env, fmt, io};

const USAGE: &str = "usage:
  bitmap-tool alloc --policy <first-fit|next-fit|best-fit|buddy> --size <bits> [--save <file>] <cnt>...
  bitmap-tool dump --size <bits> [--hex] <file>";

#[derive(Debug, thiserror::Error)]
enum ToolError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Policy(#[from] ParsePolicyError),
    #[error(transparent)]
    Bitmap(#[from] BitmapError),
    #[error("{path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("writing dump: {0}")]
    Output(io::Error),
    #[error("{path}: {source}")]
    Persist {
        path: String,
        source: PersistError<io::Error>,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Alloc {
        policy: Policy,
        size: usize,
        save: Option<String>,
        counts: Vec<usize>,
    },
    Dump {
        size: usize,
        hex: bool,
        path: String,
    },
}

fn main() -> ExitCode {
    if StderrLogger::from_env().init().is_err() {
        eprintln!("logger already installed");
    }

    match parse(env::args().skip(1)).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ToolError::Usage(msg)) => {
            eprintln!("{msg}\n{USAGE}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn usage(msg: impl Into<String>) -> ToolError {
    ToolError::Usage(msg.into())
}

fn number(flag: &str, value: Option<String>) -> Result<usize, ToolError> {
    let value = value.ok_or_else(|| usage(format!("{flag} needs a value")))?;
    value
        .parse()
        .map_err(|_| usage(format!("{flag}: not a number: {value}")))
}

fn parse(mut args: impl Iterator<Item = String>) -> Result<Command, ToolError> {
    let cmd = args.next().ok_or_else(|| usage("missing command"))?;

    let mut policy = None;
    let mut size = None;
    let mut save = None;
    let mut hex = false;
    let mut rest = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--policy" => {
                let value = args.next().ok_or_else(|| usage("--policy needs a value"))?;
                policy = Some(value.parse::<Policy>()?);
            }
            "--size" => size = Some(number("--size", args.next())?),
            "--save" => save = Some(args.next().ok_or_else(|| usage("--save needs a value"))?),
            "--hex" => hex = true,
            flag if flag.starts_with("--") => return Err(usage(format!("unknown flag {flag}"))),
            _ => rest.push(arg),
        }
    }

    let size = size.ok_or_else(|| usage("--size is required"))?;
    match cmd.as_str() {
        "alloc" => {
            let counts = rest
                .into_iter()
                .map(|cnt| number("count", Some(cnt)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Command::Alloc {
                policy: policy.unwrap_or_default(),
                size,
                save,
                counts,
            })
        }
        "dump" => {
            let [path] = <[String; 1]>::try_from(rest)
                .map_err(|_| usage("dump takes exactly one file"))?;
            Ok(Command::Dump { size, hex, path })
        }
        other => Err(usage(format!("unknown command {other}"))),
    }
}

fn run(cmd: Command) -> Result<(), ToolError> {
    match cmd {
        Command::Alloc {
            policy,
            size,
            save,
            counts,
        } => {
            let bits = Bitmap::new(size)?;
            let mut engine = ScanEngine::with_policy(policy);
            info!("{policy} over {size} bits");

            for cnt in counts {
                match engine.scan_and_flip(&bits, 0, cnt, false) {
                    Some(idx) => println!("{cnt}: {idx}"),
                    None => println!("{cnt}: NOT_FOUND ({NOT_FOUND:#x})"),
                }
            }

            if let Some(path) = save {
                let file = File::create(&path).map_err(|source| ToolError::Io {
                    path: path.clone(),
                    source,
                })?;
                bits.write_to(&mut DiskFile::new(file))
                    .map_err(|source| ToolError::Persist {
                        path: path.clone(),
                        source,
                    })?;
                info!("saved {} bytes to {path}", bits.file_size());
            }
            Ok(())
        }
        Command::Dump { size, hex, path } => {
            let bits = Bitmap::new(size)?;
            let file = OpenOptions::new()
                .read(true)
                .open(&path)
                .map_err(|source| ToolError::Io {
                    path: path.clone(),
                    source,
                })?;
            bits.read_from(&mut DiskFile::new(file))
                .map_err(|source| ToolError::Persist { path, source })?;

            print_dump(&bits, hex, io::stdout().lock())
        }
    }
}

/// `fmt::Write` over an `io::Write`, keeping the I/O error that stopped it.
struct IoSink<W> {
    inner: W,
    error: Option<io::Error>,
}

impl<W: io::Write> fmt::Write for IoSink<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}

fn print_dump(bits: &Bitmap, hex: bool, out: impl io::Write) -> Result<(), ToolError> {
    let mut sink = IoSink {
        inner: out,
        error: None,
    };
    let written = if hex {
        bits.write_hex_dump(&mut sink)
    } else {
        bits.write_binary_dump(&mut sink)
    };
    if written.is_err() {
        let e = sink
            .error
            .take()
            .unwrap_or_else(|| io::Error::other("formatting failed"));
        return Err(ToolError::Output(e));
    }
    sink.inner.flush().map_err(ToolError::Output)
}
