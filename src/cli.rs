use crate::constants::{
    DEFAULT_COMPRESS_CONCURRENCY, DEFAULT_SEQUENCE_DIGITS, DEFAULT_SEQUENCE_PREFIX, DEFAULT_SEQUENCE_START,
    MAX_SEQUENCE_DIGITS,
};
use crate::export::ScriptDialect;
use crate::rules::{CaseMode, RenameRule, TextPosition};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "batch-squeeze",
    about = "Batch image compression and batch file renaming",
    long_about = "batch-squeeze takes a batch of files, compresses images or renames files under a rule, \
                  tracks every file independently and packs the results into one zip archive \
                  or a rename script.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    batch-squeeze compress ./photos -o photos.zip -q 0.7 -m 1280\n  \
    batch-squeeze rename \"./scans/*.pdf\" sequence --prefix scan_ --digits 4\n  \
    batch-squeeze rename ./photos --format sh replace --find IMG --replace photo\n  \
    batch-squeeze rename ./docs --set draft.txt=final.txt case --mode lower"
)]
pub struct Args {
    #[arg(long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Print per-item diagnostics")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress a batch of images into one zip archive",
        long_about = "Compress every image found in INPUT, a few at a time, and write the successfully \
                      compressed images to a zip archive as compressed-<name>. Non-image files are skipped."
    )]
    Compress {
        #[arg(
            help = "Input file, directory, or glob",
            long_help = "Input can be a file, a directory path, or a glob expression. \
                         Examples: './images', '*.jpg', '/path/to/images/*.{jpg,png}'"
        )]
        input: String,

        #[arg(short = 'o', long, help = "Output archive path (default: images-compressed.zip)")]
        output: Option<PathBuf>,

        #[arg(
            short = 'q',
            long,
            help = "Encoder quality in (0, 1] (default: 0.8)",
            long_help = "Encoder fidelity from just above 0 (smallest) to 1 (best). \
                         For PNG: >=0.9 uses Zopfli, >=0.7 uses high compression, lower uses standard compression."
        )]
        quality: Option<f32>,

        #[arg(
            short = 'm',
            long,
            help = "Maximum width or height in pixels (default: 1920)",
            long_help = "Images whose longest side exceeds this are resized with their aspect ratio preserved."
        )]
        max_dimension: Option<u32>,

        #[arg(
            short = 's',
            long,
            help = "Target maximum output size in MB (default: 1.0)",
            long_help = "When an output is larger, quality and then dimensions are stepped down \
                         for a bounded number of attempts."
        )]
        max_size_mb: Option<f64>,

        #[arg(
            short = 'c',
            long,
            default_value_t = DEFAULT_COMPRESS_CONCURRENCY,
            help = "Images compressed at the same time"
        )]
        concurrency: usize,

        #[arg(short = 'r', long, help = "Process subdirectories recursively")]
        recursive: bool,

        #[arg(long, help = "Re-run the whole batch once if any image failed")]
        retry_failed: bool,
    },

    #[command(
        about = "Rename a batch of files into a zip archive or a rename script",
        long_about = "Compute a new name for every file in INPUT with the chosen rule. The zip export holds \
                      the unmodified files under their new names; the script exports hold one rename command \
                      per file whose name changed."
    )]
    Rename {
        #[arg(help = "Input file, directory, or glob")]
        input: String,

        #[arg(
            short = 'o',
            long,
            help = "Output path (default: renamed_files.zip or rename_script.<ext>)"
        )]
        output: Option<PathBuf>,

        #[arg(short = 'r', long, help = "Process subdirectories recursively")]
        recursive: bool,

        #[arg(long, value_enum, default_value_t = ExportFormat::Zip, help = "Export format")]
        format: ExportFormat,

        #[arg(
            long = "set",
            value_name = "OLD=NEW",
            value_parser = parse_override,
            help = "Manually override the new name of one file",
            long_help = "Override the computed name of the file originally named OLD. \
                         Applied after the rule, may be repeated."
        )]
        overrides: Vec<(String, String)>,

        #[command(subcommand)]
        rule: RuleCommand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Zip,
    Bat,
    Sh,
}

impl ExportFormat {
    /// Script dialect, or `None` for the zip export.
    pub fn dialect(&self) -> Option<ScriptDialect> {
        match self {
            ExportFormat::Zip => None,
            ExportFormat::Bat => Some(ScriptDialect::Batch),
            ExportFormat::Sh => Some(ScriptDialect::Shell),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum RuleCommand {
    #[command(about = "Number files in order: <prefix><number><suffix><ext>")]
    Sequence {
        #[arg(long, default_value = DEFAULT_SEQUENCE_PREFIX)]
        prefix: String,

        #[arg(long, default_value_t = DEFAULT_SEQUENCE_START)]
        start: u64,

        #[arg(
            long,
            default_value_t = DEFAULT_SEQUENCE_DIGITS as u16,
            value_parser = clap::value_parser!(u16).range(..=i64::from(MAX_SEQUENCE_DIGITS)),
            help = "Zero-padded width of the number (at most 255)"
        )]
        digits: u16,

        #[arg(long, default_value = "")]
        suffix: String,
    },

    #[command(about = "Replace every occurrence of a string or pattern")]
    Replace {
        #[arg(long)]
        find: String,

        #[arg(long = "replace", default_value = "")]
        replacement: String,

        #[arg(long, help = "Treat --find as a regular expression; invalid patterns leave names unchanged")]
        regex: bool,
    },

    #[command(about = "Change the file extension")]
    Extension {
        #[arg(long = "ext", help = "New extension, with or without the leading dot")]
        new_extension: String,
    },

    #[command(about = "Add text before or after the base name")]
    Add {
        #[arg(long)]
        text: String,

        #[arg(long, value_enum, default_value_t = PositionArg::Prefix)]
        position: PositionArg,
    },

    #[command(about = "Change letter case")]
    Case {
        #[arg(long, value_enum)]
        mode: CaseArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PositionArg {
    Prefix,
    Suffix,
}

impl From<PositionArg> for TextPosition {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Prefix => TextPosition::Prefix,
            PositionArg::Suffix => TextPosition::Suffix,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaseArg {
    None,
    Lower,
    Upper,
    Title,
}

impl From<CaseArg> for CaseMode {
    fn from(arg: CaseArg) -> Self {
        match arg {
            CaseArg::None => CaseMode::None,
            CaseArg::Lower => CaseMode::Lower,
            CaseArg::Upper => CaseMode::Upper,
            CaseArg::Title => CaseMode::TitleCase,
        }
    }
}

impl From<RuleCommand> for RenameRule {
    fn from(command: RuleCommand) -> Self {
        match command {
            RuleCommand::Sequence {
                prefix,
                start,
                digits,
                suffix,
            } => RenameRule::Sequence {
                prefix,
                start,
                digits: usize::from(digits),
                suffix,
            },
            RuleCommand::Replace {
                find,
                replacement,
                regex,
            } => RenameRule::FindReplace {
                find,
                replacement,
                use_regex: regex,
            },
            RuleCommand::Extension { new_extension } => RenameRule::ChangeExtension { new_extension },
            RuleCommand::Add { text, position } => RenameRule::AddText {
                text,
                position: position.into(),
            },
            RuleCommand::Case { mode } => RenameRule::ChangeCase { mode: mode.into() },
        }
    }
}

fn parse_override(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((old, new)) if !old.is_empty() && !new.is_empty() => Ok((old.to_string(), new.to_string())),
        _ => Err(format!("expected OLD=NEW with both names non-empty, got '{}'", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("a.jpg=b.jpg"),
            Ok(("a.jpg".to_string(), "b.jpg".to_string()))
        );
        assert_eq!(
            parse_override("x=y=z"),
            Ok(("x".to_string(), "y=z".to_string()))
        );
        assert!(parse_override("a.jpg").is_err());
        assert!(parse_override("=b.jpg").is_err());
    }

    #[test]
    fn test_rename_rule_from_command() {
        let args = Args::parse_from([
            "batch-squeeze",
            "rename",
            "./in",
            "--set",
            "a=b",
            "replace",
            "--find",
            "IMG",
            "--replace",
            "photo",
        ]);

        let Commands::Rename { rule, overrides, format, .. } = args.command else {
            panic!("expected rename");
        };
        assert_eq!(format, ExportFormat::Zip);
        assert_eq!(overrides, vec![("a".to_string(), "b".to_string())]);
        assert_eq!(
            RenameRule::from(rule),
            RenameRule::FindReplace {
                find: "IMG".to_string(),
                replacement: "photo".to_string(),
                use_regex: false,
            }
        );
    }

    #[test]
    fn test_sequence_defaults() {
        let args = Args::parse_from(["batch-squeeze", "rename", "./in", "sequence"]);
        let Commands::Rename { rule, .. } = args.command else {
            panic!("expected rename");
        };
        assert_eq!(RenameRule::from(rule), RenameRule::default());
    }

    #[test]
    fn test_sequence_digits_are_bounded() {
        let args = Args::parse_from(["batch-squeeze", "rename", "./in", "sequence", "--digits", "255"]);
        let Commands::Rename { rule, .. } = args.command else {
            panic!("expected rename");
        };
        assert!(matches!(RenameRule::from(rule), RenameRule::Sequence { digits: 255, .. }));

        let result = Args::try_parse_from(["batch-squeeze", "rename", "./in", "sequence", "--digits", "70000"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_case_and_position_values() {
        let args = Args::parse_from(["batch-squeeze", "rename", "./in", "case", "--mode", "title"]);
        let Commands::Rename { rule, .. } = args.command else {
            panic!("expected rename");
        };
        assert_eq!(
            RenameRule::from(rule),
            RenameRule::ChangeCase {
                mode: CaseMode::TitleCase
            }
        );

        let args = Args::parse_from(["batch-squeeze", "rename", "./in", "add", "--text", "_v2", "--position", "suffix"]);
        let Commands::Rename { rule, .. } = args.command else {
            panic!("expected rename");
        };
        assert_eq!(
            RenameRule::from(rule),
            RenameRule::AddText {
                text: "_v2".to_string(),
                position: TextPosition::Suffix
            }
        );
    }

    #[test]
    fn test_compress_flags() {
        let args = Args::parse_from([
            "batch-squeeze",
            "--quiet",
            "compress",
            "./in",
            "-q",
            "0.5",
            "-m",
            "800",
            "-c",
            "2",
        ]);
        assert!(args.quiet);
        let Commands::Compress {
            quality,
            max_dimension,
            concurrency,
            ..
        } = args.command
        else {
            panic!("expected compress");
        };
        assert_eq!(quality, Some(0.5));
        assert_eq!(max_dimension, Some(800));
        assert_eq!(concurrency, 2);
    }
}
