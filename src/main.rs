use anyhow::{Context, Result};
use batch_squeeze::cli::{Args, Commands};
use batch_squeeze::commands::{run_compress, run_rename, CompressRequest, RenameExport, RenameRequest};
use batch_squeeze::logger;
use batch_squeeze::processing::CompressionSettings;
use clap::Parser;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);

    match args.command {
        Commands::Compress {
            input,
            output,
            quality,
            max_dimension,
            max_size_mb,
            concurrency,
            recursive,
            retry_failed,
        } => {
            let settings = CompressionSettings::new(quality, max_dimension, max_size_mb)?;
            let request = CompressRequest {
                input,
                output,
                recursive,
                settings,
                concurrency,
                retry_failed,
            };
            run_compress(&request).with_context(|| format!("Batch compression of {} failed", request.input))?;
        }
        Commands::Rename {
            input,
            output,
            recursive,
            format,
            overrides,
            rule,
        } => {
            let request = RenameRequest {
                input,
                output,
                recursive,
                rule: rule.into(),
                overrides,
                format: format.dialect().map_or(RenameExport::Zip, RenameExport::Script),
            };
            run_rename(&request).with_context(|| format!("Batch rename of {} failed", request.input))?;
        }
    }

    Ok(())
}
