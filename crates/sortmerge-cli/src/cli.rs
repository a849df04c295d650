use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use sortmerge_types::{SortOrder, ValueKind};

#[derive(Parser, Debug)]
#[command(
    name = "sortmerge",
    about = "Merge pre-sorted text files into a single sorted file",
    override_usage = "sortmerge [OPTIONS] <OUTPUT> <INPUT>...",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Compare lines as integers (excludes -s)
    #[arg(short = 'i', long)]
    pub integer: bool,

    /// Compare lines as strings (excludes -i)
    #[arg(short = 's', long)]
    pub string: bool,

    /// Merge in ascending order (default, excludes -d)
    #[arg(short = 'a', long)]
    pub ascending: bool,

    /// Merge in descending order (excludes -a)
    #[arg(short = 'd', long)]
    pub descending: bool,

    /// Log merge progress to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// TOML file with defaults for any of the above
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file followed by the input files
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

/// Invalid combinations of otherwise well-formed arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("none of the required parameters are specified: -i or -s")]
    MissingKind,

    #[error("it is possible to use only one parameter: -i or -s")]
    ConflictingKinds,

    #[error("it is possible to use only one parameter: -a or -d")]
    ConflictingOrders,

    #[error("no output or input file names")]
    MissingFiles,
}

impl Cli {
    /// The value kind requested on the command line, if any.
    pub fn kind(&self) -> Result<Option<ValueKind>, UsageError> {
        match (self.integer, self.string) {
            (true, true) => Err(UsageError::ConflictingKinds),
            (true, false) => Ok(Some(ValueKind::Integer)),
            (false, true) => Ok(Some(ValueKind::String)),
            (false, false) if self.config.is_none() => Err(UsageError::MissingKind),
            (false, false) => Ok(None),
        }
    }

    /// The sort order requested on the command line, if any.
    pub fn order(&self) -> Result<Option<SortOrder>, UsageError> {
        match (self.ascending, self.descending) {
            (true, true) => Err(UsageError::ConflictingOrders),
            (true, false) => Ok(Some(SortOrder::Ascending)),
            (false, true) => Ok(Some(SortOrder::Descending)),
            (false, false) => Ok(None),
        }
    }

    /// Split positional files into output and inputs.
    ///
    /// With `--config` the positionals may be omitted entirely.
    pub fn files(&self) -> Result<(Option<PathBuf>, Vec<PathBuf>), UsageError> {
        match self.files.split_first() {
            None if self.config.is_some() => Ok((None, Vec::new())),
            Some((output, inputs)) if !inputs.is_empty() => {
                Ok((Some(output.clone()), inputs.to_vec()))
            }
            _ => Err(UsageError::MissingFiles),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn parse_integer_ascending() {
        let cli = parse(&["sortmerge", "-i", "out.txt", "a.txt", "b.txt"]);
        assert_eq!(cli.kind(), Ok(Some(ValueKind::Integer)));
        assert_eq!(cli.order(), Ok(None));
        let (output, inputs) = cli.files().unwrap();
        assert_eq!(output, Some(PathBuf::from("out.txt")));
        assert_eq!(inputs, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    }

    #[test]
    fn parse_string_descending_long() {
        let cli = parse(&["sortmerge", "--string", "--descending", "out.txt", "in.txt"]);
        assert_eq!(cli.kind(), Ok(Some(ValueKind::String)));
        assert_eq!(cli.order(), Ok(Some(SortOrder::Descending)));
    }

    #[test]
    fn options_may_follow_files() {
        let cli = parse(&["sortmerge", "out.txt", "in.txt", "-s", "-d"]);
        assert!(cli.string);
        assert!(cli.descending);
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn missing_kind() {
        let cli = parse(&["sortmerge", "out.txt", "in.txt"]);
        assert_eq!(cli.kind(), Err(UsageError::MissingKind));
    }

    #[test]
    fn conflicting_kinds() {
        let cli = parse(&["sortmerge", "-i", "-s", "out.txt", "in.txt"]);
        assert_eq!(cli.kind(), Err(UsageError::ConflictingKinds));
    }

    #[test]
    fn conflicting_orders() {
        let cli = parse(&["sortmerge", "-i", "-a", "-d", "out.txt", "in.txt"]);
        assert_eq!(cli.order(), Err(UsageError::ConflictingOrders));
    }

    #[test]
    fn output_alone_is_not_enough() {
        let cli = parse(&["sortmerge", "-i", "out.txt"]);
        assert_eq!(cli.files(), Err(UsageError::MissingFiles));
    }

    #[test]
    fn config_file_makes_kind_and_files_optional() {
        let cli = parse(&["sortmerge", "--config", "merge.toml"]);
        assert_eq!(cli.kind(), Ok(None));
        assert_eq!(cli.files(), Ok((None, Vec::new())));
    }

    #[test]
    fn verbose_flag() {
        let cli = parse(&["sortmerge", "-v", "-i", "o", "i"]);
        assert!(cli.verbose);
    }

    #[test]
    fn unknown_flag_is_a_parse_error() {
        assert!(Cli::try_parse_from(["sortmerge", "-x", "o", "i"]).is_err());
    }
}
