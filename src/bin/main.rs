use anyhow::{bail, Context, Result};
use clap::builder::TypedValueParser;
use clap::Parser;
use dicom_anonymization::actions::Action;
use dicom_anonymization::codec::Dataset;
use dicom_anonymization::config::{ConfigBuilder, UidRoot};
use dicom_anonymization::{tags, AnonymizationError, Anonymizer, Tag};
use env_logger::Builder;
use log::{info, warn, Level, LevelFilter};
use rayon::prelude::*;
use std::fmt;
use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::{Path, PathBuf},
    str::FromStr,
};
use walkdir::WalkDir;

#[derive(Clone)]
struct TagValueParser;

impl TypedValueParser for TagValueParser {
    type Value = Tag;

    fn parse_ref(
        &self,
        _cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let s = value.to_str().ok_or_else(|| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidUtf8,
                "invalid exclude tag(s)",
            )
        })?;

        Tag::from_str(s).map_err(|_e| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidValue,
                format!("{s} is not a valid tag"),
            )
        })
    }
}

/// Anonymize DICOM files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file ('-' for stdin) or directory
    #[arg(short, long, value_name = "INPUT_PATH")]
    input: PathBuf,

    /// Output file ('-' for stdout) or directory
    #[arg(short, long, value_name = "OUTPUT_PATH")]
    output: PathBuf,

    /// UID root (default: '9999')
    #[arg(short, long)]
    uid_root: Option<String>,

    /// JSON configuration file, applied on top of the built-in profile
    #[arg(long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Secret to derive pseudonyms from, so separate runs generate the same UIDs
    #[arg(long, env = "DCMANON_SEED", hide_env_values = true)]
    seed: Option<String>,

    /// Recursively look for files in input directory
    #[arg(short, long)]
    recursive: bool,

    /// Continue when file found is not DICOM
    #[arg(short, long = "continue")]
    r#continue: bool,

    /// Show more verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Tags to exclude from anonymization, e.g. "00100020,00080050"
    #[arg(long, value_name = "TAGS", value_delimiter = ',', value_parser = TagValueParser)]
    exclude: Vec<Tag>,
}

struct DicomOutputFilePath {
    study_instance_uid: String,
    series_instance_uid: String,
    sop_instance_uid: String,
}

impl fmt::Display for DicomOutputFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}.dcm",
            self.study_instance_uid, self.series_instance_uid, self.sop_instance_uid
        )
    }
}

impl DicomOutputFilePath {
    fn to_path_buf(&self) -> PathBuf {
        format!("{}", self).into()
    }

    fn from_dataset(obj: &Dataset) -> Result<Self> {
        let uid = |tag: Tag| {
            obj.element(tag)
                .and_then(|elem| elem.to_str())
                .filter(|value| !value.is_empty())
                .with_context(|| format!("missing value for tag {tag}"))
        };

        Ok(Self {
            study_instance_uid: uid(tags::STUDY_INSTANCE_UID)?,
            series_instance_uid: uid(tags::SERIES_INSTANCE_UID)?,
            sop_instance_uid: uid(tags::SOP_INSTANCE_UID)?,
        })
    }
}

fn anonymize(anonymizer: &mut Anonymizer, input_path: &Path, output_path: &Path) -> Result<()> {
    let input_src: Box<dyn Read> = if input_path == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(
            File::open(input_path)
                .with_context(|| format!("failed to open {}", input_path.display()))?,
        )
    };

    // Anonymize the input file
    let result = anonymizer
        .anonymize(input_src)
        .with_context(|| format!("failed to anonymize {}", input_path.display()))?;

    let output_target: Box<dyn Write> = if output_path == Path::new("-") {
        Box::new(io::stdout().lock())
    } else {
        let output_file_path = if output_path.is_dir() {
            let file_path = DicomOutputFilePath::from_dataset(&result.anonymized)?;
            output_path.join(file_path.to_path_buf())
        } else {
            output_path.to_path_buf()
        };

        // Create intermediate output file directories if they don't exist yet
        if let Some(parent_dir) = output_file_path.parent() {
            fs::create_dir_all(parent_dir)?;
        }

        info!(
            "writing {} to {}",
            input_path.display(),
            output_file_path.display()
        );
        Box::new(
            File::create(&output_file_path)
                .with_context(|| format!("failed to create {}", output_file_path.display()))?,
        )
    };

    result
        .write(output_target)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let input_path = args.input;
    let output_path = args.output;
    let recurse = args.recursive;
    let continue_on_read_error = args.r#continue;

    let log_level = if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Error
    };

    let mut builder = Builder::from_default_env();
    builder
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "Error",
                Level::Warn => "Warning",
                Level::Info => "Info",
                Level::Debug => "Debug",
                Level::Trace => "Trace",
            };
            writeln!(buf, "{}: {}", level, record.args())
        })
        .filter(None, log_level);
    builder.init();

    let mut config_builder = match &args.config {
        Some(config_path) => {
            let json = fs::read_to_string(config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            ConfigBuilder::from_json(&json)
                .with_context(|| format!("invalid configuration in {}", config_path.display()))?
        }
        None => ConfigBuilder::default(),
    };

    // UID root
    if let Some(uid_root) = args.uid_root {
        match uid_root.parse::<UidRoot>() {
            Ok(uid_root) => config_builder = config_builder.uid_root(uid_root),
            Err(e) => bail!(e),
        }
    }

    if let Some(seed) = args.seed {
        config_builder = config_builder.seed(seed);
    }

    // tags to be excluded from anonymization
    for tag in args.exclude {
        config_builder = config_builder.tag_action(tag, Action::Keep);
    }

    let mut anonymizer = Anonymizer::new(config_builder.build())?;

    // Input is stdin or a file
    if input_path == Path::new("-") || input_path.is_file() {
        anonymize(&mut anonymizer, &input_path, &output_path)?;
        return Ok(());
    }

    // Input is a directory
    if input_path.is_dir() {
        if output_path == Path::new("-") || !output_path.is_dir() {
            bail!("output path should be an existing directory");
        }

        let mut walk_dir = WalkDir::new(&input_path);
        if !recurse {
            walk_dir = walk_dir.max_depth(1);
        }

        // Process files, each worker with its own anonymizer. Clones share the pseudonym key,
        // so a UID gets the same replacement in every worker.
        walk_dir
            .into_iter()
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path_buf = entry.into_path();
                if path_buf.is_file() {
                    Some(path_buf)
                } else {
                    None
                }
            })
            .par_bridge() // convert to a parallel iterator
            .try_for_each_init(
                || anonymizer.clone(),
                |anonymizer, path_buf| {
                    let result = anonymize(anonymizer, &path_buf, &output_path);
                    match result {
                        Err(e) if continue_on_read_error => {
                            if let Some(&AnonymizationError::ReadError(_)) =
                                e.downcast_ref::<AnonymizationError>()
                            {
                                warn!("{}", e);
                                return Ok(());
                            }
                            Err(e)
                        }
                        Err(e) => Err(e),
                        Ok(v) => Ok(v),
                    }
                },
            )?;

        return Ok(());
    }

    bail!("Input should either be a file, stdin ('-') or a directory");
}
