//! Admin console command-line entry point.
//!
//! # Responsibility
//! - Drive the core use-cases against the configured database and blob dir.
//! - Keep output line-oriented for scripting.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use studyhub_core::db::open_db;
use studyhub_core::{
    core_version, init_logging, ping, Assignment, AssignmentService, Book, BookService,
    Collection, CollectionService, CoreConfig, DashboardService, DocumentId, DocumentStore,
    ExamEntry, ExamService, FileUpload, Note, NoteService, Notice, NoticeService, RecordEntry,
    SqliteDocumentStore, StudyRecord, UploadItem,
};

#[derive(Parser)]
#[command(name = "studyhub", version, about = "StudyHub admin console")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check core linkage
    Ping,
    /// Show collection counts and the newest uploads
    Dashboard {
        #[arg(long)]
        recent: Option<usize>,
    },
    /// Search the uploads feed by name
    Uploads {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List one collection, newest first
    List {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
    },
    #[command(subcommand)]
    Book(BookAction),
    #[command(subcommand)]
    Note(NoteAction),
    #[command(subcommand)]
    Assignment(AssignmentAction),
    #[command(subcommand)]
    Notice(NoticeAction),
    #[command(subcommand)]
    Exam(ExamAction),
    /// Permanently delete a record
    Delete {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
        id: String,
    },
}

#[derive(Subcommand)]
enum BookAction {
    /// Upload a PDF and create the book
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        semester: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum NoteAction {
    /// Upload a PDF and create the lecture note
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        semester: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        lecture_no: String,
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Args)]
struct AssignmentFields {
    #[arg(long)]
    title: String,
    #[arg(long)]
    subject: String,
    #[arg(long)]
    due_date: String,
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Subcommand)]
enum AssignmentAction {
    Add(AssignmentFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: AssignmentFields,
    },
}

#[derive(Args)]
struct NoticeFields {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    date: String,
}

#[derive(Subcommand)]
enum NoticeAction {
    Add(NoticeFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: NoticeFields,
    },
}

#[derive(Args)]
struct ExamFields {
    #[arg(long)]
    subject: String,
    #[arg(long)]
    date: String,
    #[arg(long)]
    time: String,
    #[arg(long)]
    semester: String,
    #[arg(long, default_value = "")]
    room: String,
}

#[derive(Subcommand)]
enum ExamAction {
    Add(ExamFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: ExamFields,
    },
}

impl From<AssignmentFields> for Assignment {
    fn from(value: AssignmentFields) -> Self {
        Self {
            title: value.title,
            subject: value.subject,
            due_date: value.due_date,
            description: value.description,
        }
    }
}

impl From<NoticeFields> for Notice {
    fn from(value: NoticeFields) -> Self {
        Self {
            title: value.title,
            description: value.description,
            date: value.date,
        }
    }
}

impl From<ExamFields> for ExamEntry {
    fn from(value: ExamFields) -> Self {
        Self {
            subject: value.subject,
            date: value.date,
            time: value.time,
            semester: value.semester,
            room: value.room,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Ping = cli.command {
        println!("studyhub_core ping={}", ping());
        println!("studyhub_core version={}", core_version());
        return Ok(());
    }

    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| anyhow!("log dir `{}` is not UTF-8", log_dir.display()))?;
        init_logging(config.log_level, log_dir).map_err(|err| anyhow!(err))?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
    let store = SqliteDocumentStore::try_new(&conn)?;
    run(cli.command, &config, &store)
}

fn run(command: Command, config: &CoreConfig, store: &SqliteDocumentStore<'_>) -> Result<()> {
    match command {
        Command::Ping => {}
        Command::Dashboard { recent } => {
            let snapshot = DashboardService::new(store)
                .snapshot(recent.unwrap_or(config.recent_limit))?;
            println!("books={}", snapshot.stats.books);
            println!("notes={}", snapshot.stats.notes);
            println!("assignments={}", snapshot.stats.assignments);
            println!("notices={}", snapshot.stats.notices);
            print_uploads(&snapshot.recent);
        }
        Command::Uploads { search, limit } => {
            let mut feed = DashboardService::new(store).uploads_feed()?;
            let visible = feed.set_query(search.unwrap_or_default());
            let shown = &visible[..limit.unwrap_or(visible.len()).min(visible.len())];
            print_uploads(shown);
        }
        Command::List { collection } => match collection {
            Collection::Books => print_records(&BookService::new(store))?,
            Collection::Notes => print_records(&NoteService::new(store))?,
            Collection::Assignments => print_records(&AssignmentService::new(store))?,
            Collection::Notices => print_records(&NoticeService::new(store))?,
            Collection::Exams => print_records(&ExamService::new(store))?,
        },
        Command::Book(BookAction::Add {
            title,
            semester,
            subject,
            file,
        }) => {
            let book = Book {
                title,
                semester,
                subject,
                file_url: String::new(),
            };
            let entry = BookService::new(store).publish_with_file(
                &config.blob_store(),
                book,
                &read_upload(&file)?,
            )?;
            print_saved("published", &entry);
            println!("fileUrl={}", entry.record.file_url);
        }
        Command::Note(NoteAction::Add {
            title,
            semester,
            subject,
            lecture_no,
            file,
        }) => {
            let note = Note {
                title,
                semester,
                subject,
                lecture_no,
                file_url: String::new(),
            };
            let entry = NoteService::new(store).publish_with_file(
                &config.blob_store(),
                note,
                &read_upload(&file)?,
            )?;
            print_saved("published", &entry);
            println!("fileUrl={}", entry.record.file_url);
        }
        Command::Assignment(action) => {
            let service = AssignmentService::new(store);
            let entry = match action {
                AssignmentAction::Add(fields) => service.create(&fields.into())?,
                AssignmentAction::Update { id, fields } => {
                    service.update(parse_id(&id)?, &fields.into())?
                }
            };
            print_saved("saved", &entry);
        }
        Command::Notice(action) => {
            let service = NoticeService::new(store);
            let entry = match action {
                NoticeAction::Add(fields) => service.create(&fields.into())?,
                NoticeAction::Update { id, fields } => {
                    service.update(parse_id(&id)?, &fields.into())?
                }
            };
            print_saved("saved", &entry);
        }
        Command::Exam(action) => {
            let service = ExamService::new(store);
            let entry = match action {
                ExamAction::Add(fields) => service.create(&fields.into())?,
                ExamAction::Update { id, fields } => {
                    service.update(parse_id(&id)?, &fields.into())?
                }
            };
            print_saved("saved", &entry);
        }
        Command::Delete { collection, id } => {
            let id = parse_id(&id)?;
            store.delete_document(collection, id)?;
            println!("deleted {collection}/{id}");
        }
    }

    info!("event=cli_command module=cli status=ok");
    Ok(())
}

fn parse_collection(raw: &str) -> Result<Collection, String> {
    Collection::parse(raw).ok_or_else(|| {
        let known = Collection::ALL.map(Collection::as_str).join("|");
        format!("expected one of {known}")
    })
}

fn parse_id(raw: &str) -> Result<DocumentId> {
    DocumentId::parse_str(raw.trim()).with_context(|| format!("invalid record id `{raw}`"))
}

fn read_upload(path: &Path) -> Result<FileUpload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("`{}` has no file name", path.display()))?;
    Ok(FileUpload::new(file_name, bytes))
}

fn print_uploads(items: &[UploadItem]) {
    for item in items {
        println!(
            "{}\t{}\t{}\t{}",
            item.kind.label(),
            item.created_at,
            item.id,
            item.name
        );
    }
}

fn print_records<S: DocumentStore, T: StudyRecord>(
    service: &CollectionService<S, T>,
) -> Result<()> {
    for entry in service.list()? {
        println!(
            "{}\t{}\t{}",
            entry.id,
            entry.created_at,
            entry.record.display_name()
        );
    }
    Ok(())
}

fn print_saved<T: StudyRecord>(verb: &str, entry: &RecordEntry<T>) {
    println!(
        "{verb} {}/{} name={}",
        T::COLLECTION,
        entry.id,
        entry.record.display_name()
    );
}
