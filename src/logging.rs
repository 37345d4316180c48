//! Log setup for the export binary.
//!
//! Lines look like `2024-05-01 08:00:00,123 - INFO - message` and go to
//! stderr and to the run log file. `RUST_LOG` overrides the `info` default.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Builder, Env, Target, WriteStyle};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const TIMESTAMP: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second],[subsecond digits:3]"
);

/// Copies every write to the log file and to stderr.
struct TeeWriter {
    file: File,
    stderr: io::Stderr,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        self.stderr.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.stderr.flush()
    }
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(TIMESTAMP).unwrap_or_default()
}

fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(buf, "{} - {} - {}", timestamp(), record.level(), record.args())
    });
    builder
}

/// Installs the global logger, appending to `log_path`.
///
/// When the file cannot be opened the logger writes to stderr only and the
/// open error is returned alongside. Installing twice is a no-op.
pub fn init(log_path: &Path) -> Option<io::Error> {
    let mut builder = builder();
    let open_error = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(file) => {
            builder
                .target(Target::Pipe(Box::new(TeeWriter {
                    file,
                    stderr: io::stderr(),
                })))
                .write_style(WriteStyle::Never);
            None
        }
        Err(err) => {
            builder.target(Target::Stderr);
            Some(err)
        }
    };
    let _ = builder.try_init();
    open_error
}
