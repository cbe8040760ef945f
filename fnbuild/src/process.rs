use std::{ffi::OsStr, fmt, io, num::NonZeroI32, process};

use log::debug;

pub struct Command(process::Command);

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Command {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self(process::Command::new(program))
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.0.arg(arg);
        self
    }

    pub fn args<'a, I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = &'a OsStr>,
    {
        self.0.args(args);
        self
    }

    pub fn get_program(&self) -> &OsStr {
        self.0.get_program()
    }

    #[cfg(test)]
    pub fn get_args(&self) -> process::CommandArgs<'_> {
        self.0.get_args()
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error {
            command: format!("{:?}", self.0),
            program: self.get_program().to_string_lossy().into_owned(),
            kind,
        }
    }

    /// Runs the command with inherited stdio and requires it to exit successfully.
    pub fn status(mut self) -> Result<()> {
        debug!("running `{command:?}`...", command = &self.0);

        let status = self.0.status().map_err(|error| self.error(error.into()))?;
        if status.success() {
            Ok(())
        } else {
            Err(self.error(ErrorKind::NonZeroExitStatus(
                status.code().and_then(NonZeroI32::new),
            )))
        }
    }

    /// Runs the command while capturing its output and requires it to exit successfully.
    pub fn output(mut self) -> Result<process::Output> {
        debug!("capturing `{command:?}`...", command = &self.0);

        let output = self.0.output().map_err(|error| self.error(error.into()))?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(self.error(ErrorKind::NonZeroExitStatus(
                output.status.code().and_then(NonZeroI32::new),
            )))
        }
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Io(io::ErrorKind),
    NonZeroExitStatus(Option<NonZeroI32>),
}

impl From<io::Error> for ErrorKind {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            kind => ErrorKind::Io(kind),
        }
    }
}

#[derive(Debug)]
pub struct Error {
    command: String,
    program: String,
    pub kind: ErrorKind,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Error {
            command, program, ..
        } = self;
        write!(f, "failed to run `{command}`: ")?;
        match self.kind {
            ErrorKind::NotFound => {
                write!(f, "the `{program}` command is required but not available on your system, please install it")
            }
            ErrorKind::PermissionDenied => {
                write!(f, "the `{program}` command is available but does not have the right permissions, please make sure the binary is executable")
            }
            ErrorKind::Io(kind) => write!(f, "{kind}"),
            ErrorKind::NonZeroExitStatus(code) => {
                if let Some(code) = code {
                    write!(f, "exited with non-zero exit code `{code}`")
                } else {
                    write!(f, "did not run successfully")
                }
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Creates a new [`Command`] and supplies the provided arguments, if any, while calling
/// [`std::convert::AsRef::as_ref`] on each.
macro_rules! command {
    ($program:expr $(,)?) => {
        $crate::process::Command::new($program)
    };
    ($program:expr, $($arg:expr),+ $(,)?) => {
        $crate::process::args!($crate::process::Command::new($program), $($arg,)*)
    };
}

/// Calls [`Command::args`] on the provided [`Command`] while calling [`std::convert::AsRef::as_ref`]
/// on each argument.
macro_rules! args {
    ($command:expr, $($arg:expr),+ $(,)?) => {
        $command.args([
            $(::std::convert::AsRef::<::std::ffi::OsStr>::as_ref(&$arg),)*
        ])
    }
}

pub(crate) use args;
pub(crate) use command;
