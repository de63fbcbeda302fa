mod telemetry;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use ocrportal::{
    load_config, Download, EngineKind, Job, NewFolder, OcrOptions, OutputType, Portal, PortalUser, Submission,
    Upload,
};

#[derive(Parser, Debug)]
#[command(name = "ocrportal", author, version, about, long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, env = "OCRPORTAL_CONFIG")]
    config: PathBuf,

    /// Id of the user the command runs as
    #[arg(long, env = "OCRPORTAL_USER", default_value = "local")]
    user: String,

    /// Run with staff rights (engine administration)
    #[arg(long)]
    staff: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "OCRPORTAL_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run OCR on a PDF and wait for the result
    Submit(SubmitArgs),

    /// List recent jobs, newest first
    Jobs {
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Show one job
    Show { job_id: String },

    /// Delete a job and its files (archived copies are kept)
    Delete { job_id: String },

    /// Save a result file
    #[command(subcommand)]
    Download(DownloadCommand),

    /// Inspect or change the OCR engine
    #[command(subcommand)]
    Engine(EngineCommand),

    /// Manage library folders
    #[command(subcommand)]
    Folders(FolderCommand),

    /// Create Word documents
    #[command(subcommand)]
    Word(WordCommand),
}

#[derive(Args, Debug)]
struct SubmitArgs {
    file: PathBuf,

    /// Tesseract language code, repeatable
    #[arg(short, long = "lang")]
    languages: Vec<String>,

    /// Let the engine detect the languages
    #[arg(long)]
    auto: bool,

    /// Also write the recognized text
    #[arg(long)]
    sidecar: bool,

    #[arg(long, default_value_t = 1)]
    optimize: u8,

    #[arg(long)]
    deskew: bool,

    #[arg(long)]
    rotate_pages: bool,

    #[arg(long)]
    remove_background: bool,

    #[arg(long)]
    clean_final: bool,

    #[arg(long)]
    skip_text: bool,

    #[arg(long)]
    force_ocr: bool,

    /// pdfa, pdf, pdfa-1, pdfa-2 or pdfa-3
    #[arg(long, default_value = "pdfa")]
    output_type: String,

    /// Folder receiving a copy of the result
    #[arg(long)]
    folder: Option<String>,
}

#[derive(Subcommand, Debug)]
enum DownloadCommand {
    /// Processed PDF (or sidecar) of a job
    Job {
        job_id: String,
        #[arg(long)]
        sidecar: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Processed copy of an archived document
    Archived {
        document_id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// A generated Word document
    Word {
        document_id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum EngineCommand {
    Show,
    Set { engine: String },
}

#[derive(Subcommand, Debug)]
enum FolderCommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    Rename {
        folder_id: String,
        name: String,
    },
    Move {
        folder_id: String,
        /// New parent; omit to move to the top level
        #[arg(long)]
        parent: Option<String>,
    },
    /// Documents in a folder
    Documents { folder_id: String },
    /// Upload a PDF straight into a folder
    Add {
        folder_id: String,
        file: PathBuf,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Most recently added documents across all folders
    Recent {
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum WordCommand {
    List,
    /// Build a document from a text file, one paragraph per line
    Create { title: String, body: PathBuf },
    /// OCR a PDF and turn its text into a document
    Convert { title: String, file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_json)?;

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let portal = Portal::from_config(&config)?;

    let mut user = PortalUser::new(cli.user.clone(), cli.user.clone());
    if cli.staff {
        user = user.staff();
    }

    run(&portal, &user, cli.command).await
}

async fn run(portal: &Portal, user: &PortalUser, command: Command) -> Result<()> {
    match command {
        Command::Submit(args) => {
            let submission = build_submission(args)?;
            let outcome = portal.submit_ocr(user, submission).await?;
            let mut summary = job_summary(&outcome.job);
            if let Some(document) = &outcome.archived {
                summary["archived_document_id"] = json!(document.id);
            }
            if let Some(error) = &outcome.archive_error {
                summary["archive_error"] = json!(error);
            }
            print_json(&summary)
        }
        Command::Jobs { limit } => {
            let jobs: Vec<_> = portal.jobs(user, limit)?.iter().map(job_summary).collect();
            print_json(&jobs)
        }
        Command::Show { job_id } => print_json(&job_summary(&portal.job(user, &job_id)?)),
        Command::Delete { job_id } => {
            portal.delete_job(user, &job_id)?;
            println!("Deleted job {}", job_id);
            Ok(())
        }
        Command::Download(download) => {
            let (file, output) = match download {
                DownloadCommand::Job {
                    job_id,
                    sidecar: true,
                    output,
                } => (portal.download_sidecar(user, &job_id)?, output),
                DownloadCommand::Job { job_id, output, .. } => (portal.download_processed(user, &job_id)?, output),
                DownloadCommand::Archived { document_id, output } => {
                    (portal.download_archived(user, &document_id)?, output)
                }
                DownloadCommand::Word { document_id, output } => (portal.download_word(user, &document_id)?, output),
            };
            save_download(&file, output)
        }
        Command::Engine(EngineCommand::Show) => print_json(&portal.engine_status().await?),
        Command::Engine(EngineCommand::Set { engine }) => {
            let Some(engine) = EngineKind::parse(&engine) else {
                bail!("Unknown engine '{}', expected ocrmypdf or docling", engine);
            };
            print_json(&portal.set_engine(user, engine).await?)
        }
        Command::Folders(command) => run_folders(portal, user, command),
        Command::Word(command) => run_word(portal, user, command).await,
    }
}

fn run_folders(portal: &Portal, user: &PortalUser, command: FolderCommand) -> Result<()> {
    let library = portal.library(user)?;
    match command {
        FolderCommand::List => print_json(&library.folders(&user.id)?),
        FolderCommand::Create {
            name,
            parent,
            color,
            description,
        } => {
            let mut new = NewFolder::named(name);
            if let Some(parent) = parent {
                new = new.under(parent);
            }
            new.color = color;
            new.description = description;
            print_json(&library.create_folder(&user.id, new)?)
        }
        FolderCommand::Rename { folder_id, name } => print_json(&library.rename_folder(&user.id, &folder_id, &name)?),
        FolderCommand::Move { folder_id, parent } => {
            print_json(&library.move_folder(&user.id, &folder_id, parent.as_deref())?)
        }
        FolderCommand::Documents { folder_id } => print_json(&library.documents(&user.id, &folder_id)?),
        FolderCommand::Add {
            folder_id,
            file,
            title,
            description,
        } => {
            let upload = read_upload(&file)?;
            print_json(&library.add_document(&user.id, &folder_id, &title, &description, upload)?)
        }
        FolderCommand::Recent { limit } => print_json(&library.recent_documents(&user.id, limit)?),
    }
}

async fn run_word(portal: &Portal, user: &PortalUser, command: WordCommand) -> Result<()> {
    let studio = portal.word(user)?;
    match command {
        WordCommand::List => print_json(&studio.documents(&user.id)?),
        WordCommand::Create { title, body } => {
            let body = std::fs::read_to_string(&body).with_context(|| format!("Failed to read {}", body.display()))?;
            print_json(&studio.create(&user.id, &title, &body)?)
        }
        WordCommand::Convert { title, file } => {
            let upload = read_upload(&file)?;
            print_json(&studio.convert_pdf(&user.id, &title, upload).await?)
        }
    }
}

fn build_submission(args: SubmitArgs) -> Result<Submission> {
    let Some(output_type) = OutputType::parse(&args.output_type) else {
        bail!("Unknown output type '{}'", args.output_type);
    };
    let options = OcrOptions {
        optimize: args.optimize,
        deskew: args.deskew,
        rotate_pages: args.rotate_pages,
        remove_background: args.remove_background,
        clean_final: args.clean_final,
        skip_text: args.skip_text,
        force_ocr: args.force_ocr,
        output_type,
        make_sidecar: args.sidecar,
        engine: None,
    };

    let mut submission = Submission::new(read_upload(&args.file)?)
        .languages(args.languages)
        .options(options);
    if args.auto {
        submission = submission.auto_detect();
    }
    if let Some(folder) = args.folder {
        submission = submission.destination(folder);
    }
    Ok(submission)
}

fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.pdf".to_string());
    Ok(Upload::from_filename(filename, bytes))
}

fn save_download(file: &Download, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from(&file.filename));
    std::fs::write(&path, &file.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved {} ({}, {} bytes)", path.display(), file.content_type, file.bytes.len());
    Ok(())
}

fn job_summary(job: &Job) -> serde_json::Value {
    json!({
        "id": job.id,
        "status": job.status(),
        "filename": job.source_filename(),
        "languages": job.language_labels(),
        "engine": job.engine(),
        "processed_file": job.processed_file(),
        "sidecar_file": job.sidecar_file(),
        "error": job.error_message(),
        "created_at": job.created_at,
        "updated_at": job.updated_at,
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
